//! Partial attribute updates
//!
//! Every field is optional: an absent field is left untouched under
//! [`MergePolicy::PartialMerge`](crate::MergePolicy::PartialMerge).

use crate::create::*;
use chrono::NaiveDate;
use fedreg_core::{Error, ImageOs, ProviderStatus, ProviderType, QuotaLimits, Result, ServiceName, ServiceType};
use serde::{Deserialize, Serialize};

/// Provider attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Provider name
    pub name: Option<String>,
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: Option<ProviderType>,
    /// Provider status
    pub status: Option<ProviderStatus>,
    /// Public or private provider
    pub is_public: Option<bool>,
    /// Maintainers e-mails
    pub support_emails: Option<Vec<String>>,
}

/// Project attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Project name in the provider
    pub name: Option<String>,
    /// Project unique ID in the provider
    pub uuid: Option<String>,
}

/// Identity provider attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProviderUpdate {
    /// Brief description
    pub description: Option<String>,
    /// URL of the identity provider
    pub endpoint: Option<String>,
    /// Token claim carrying the user group name
    pub group_claim: Option<String>,
}

/// User group attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserGroupUpdate {
    /// Brief description
    pub description: Option<String>,
    /// User group name in the identity provider
    pub name: Option<String>,
}

/// SLA attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Unique ID of the document with the SLA details
    pub doc_uuid: Option<String>,
    /// Validity start date
    pub start_date: Option<NaiveDate>,
    /// Validity end date
    pub end_date: Option<NaiveDate>,
}

/// Region attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Region name in the provider
    pub name: Option<String>,
    /// CPU overbooking factor
    pub overbooking_cpu: Option<f64>,
    /// RAM overbooking factor
    pub overbooking_ram: Option<f64>,
    /// Inbound bandwidth (Gbps)
    pub bandwidth_in: Option<f64>,
    /// Outbound bandwidth (Gbps)
    pub bandwidth_out: Option<f64>,
}

/// Location attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Site name
    pub site: Option<String>,
    /// Country name
    pub country: Option<String>,
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
}

/// Service attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceUpdate {
    /// Brief description
    pub description: Option<String>,
    /// URL of the service
    pub endpoint: Option<String>,
    /// Service implementation (must keep the service type)
    pub name: Option<ServiceName>,
}

/// Quota attribute update
///
/// Limit fields are flat; a field that does not belong to the quota type is
/// rejected by [`QuotaUpdate::check_type`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Limitation applied to each user
    pub per_user: Option<bool>,
    /// Values describe current usage instead of limits
    pub usage: Option<bool>,
    /// Block storage: max usable GiB
    pub gigabytes: Option<i64>,
    /// Block storage: max GiB per volume
    pub per_volume_gigabytes: Option<i64>,
    /// Block storage: max number of volumes
    pub volumes: Option<i64>,
    /// Compute: max usable cores
    pub cores: Option<i64>,
    /// Compute: max VM instances
    pub instances: Option<i64>,
    /// Compute: max usable RAM (MiB)
    pub ram: Option<i64>,
    /// Network: max floating IPs
    pub public_ips: Option<i64>,
    /// Network: max networks
    pub networks: Option<i64>,
    /// Network: max ports
    pub ports: Option<i64>,
    /// Network: max security groups
    pub security_groups: Option<i64>,
    /// Network: max security group rules
    pub security_group_rules: Option<i64>,
    /// Object store: max bytes
    pub bytes: Option<i64>,
    /// Object store: max containers
    pub containers: Option<i64>,
    /// Object store: max objects
    pub objects: Option<i64>,
}

impl QuotaUpdate {
    /// Reject limit fields foreign to `quota_type`
    pub fn check_type(&self, quota_type: ServiceType) -> Result<()> {
        let fields: [(&str, Option<i64>, ServiceType); 14] = [
            ("gigabytes", self.gigabytes, ServiceType::BlockStorage),
            ("per_volume_gigabytes", self.per_volume_gigabytes, ServiceType::BlockStorage),
            ("volumes", self.volumes, ServiceType::BlockStorage),
            ("cores", self.cores, ServiceType::Compute),
            ("instances", self.instances, ServiceType::Compute),
            ("ram", self.ram, ServiceType::Compute),
            ("public_ips", self.public_ips, ServiceType::Network),
            ("networks", self.networks, ServiceType::Network),
            ("ports", self.ports, ServiceType::Network),
            ("security_groups", self.security_groups, ServiceType::Network),
            ("security_group_rules", self.security_group_rules, ServiceType::Network),
            ("bytes", self.bytes, ServiceType::ObjectStore),
            ("containers", self.containers, ServiceType::ObjectStore),
            ("objects", self.objects, ServiceType::ObjectStore),
        ];
        match fields
            .iter()
            .find(|(_, value, owner)| value.is_some() && *owner != quota_type)
        {
            Some((name, _, _)) => Err(Error::validation(format!(
                "Field '{name}' is not valid for a {quota_type} quota"
            ))),
            None => Ok(()),
        }
    }
}

/// Flavor attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlavorUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Flavor name in the provider
    pub name: Option<String>,
    /// Flavor unique ID in the provider
    pub uuid: Option<String>,
    /// Reserved disk size (GiB)
    pub disk: Option<u64>,
    /// Public or private flavor
    pub is_public: Option<bool>,
    /// Reserved RAM (MiB)
    pub ram: Option<u64>,
    /// Number of virtual CPUs
    pub vcpus: Option<u64>,
    /// Swap size (GiB)
    pub swap: Option<u64>,
    /// Ephemeral disk size (GiB)
    pub ephemeral: Option<u64>,
    /// MPI enabled
    pub infiniband: Option<bool>,
    /// Number of GPUs
    pub gpus: Option<u64>,
    /// GPU model
    pub gpu_model: Option<String>,
    /// GPU vendor
    pub gpu_vendor: Option<String>,
    /// Local storage
    pub local_storage: Option<String>,
}

/// Image attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Image name in the provider
    pub name: Option<String>,
    /// Image unique ID in the provider
    pub uuid: Option<String>,
    /// OS type
    pub os_type: Option<ImageOs>,
    /// OS distribution
    pub os_distro: Option<String>,
    /// Distribution version
    pub os_version: Option<String>,
    /// OS architecture
    pub architecture: Option<String>,
    /// Kernel version
    pub kernel_id: Option<String>,
    /// CUDA support
    pub cuda_support: Option<bool>,
    /// GPU drivers installed
    pub gpu_driver: Option<bool>,
    /// Public or private image
    pub is_public: Option<bool>,
    /// Tags
    pub tags: Option<Vec<String>>,
}

/// Network attribute update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkUpdate {
    /// Brief description
    pub description: Option<String>,
    /// Network name in the provider
    pub name: Option<String>,
    /// Network unique ID in the provider
    pub uuid: Option<String>,
    /// Shared or private network
    pub is_shared: Option<bool>,
    /// Access to external networks
    pub is_router_external: Option<bool>,
    /// Default network
    pub is_default: Option<bool>,
    /// Maximum transmission unit (B)
    pub mtu: Option<u32>,
    /// Proxy address
    pub proxy_host: Option<String>,
    /// Proxy username
    pub proxy_user: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
}

impl From<&ProviderCreate> for ProviderUpdate {
    fn from(c: &ProviderCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            provider_type: Some(c.provider_type),
            status: Some(c.status),
            is_public: Some(c.is_public),
            support_emails: Some(c.support_emails.clone()),
        }
    }
}

impl From<&ProjectCreate> for ProjectUpdate {
    fn from(c: &ProjectCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            uuid: Some(c.uuid.clone()),
        }
    }
}

impl From<&IdentityProviderCreate> for IdentityProviderUpdate {
    fn from(c: &IdentityProviderCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            endpoint: Some(c.endpoint.clone()),
            group_claim: Some(c.group_claim.clone()),
        }
    }
}

impl From<&UserGroupCreate> for UserGroupUpdate {
    fn from(c: &UserGroupCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
        }
    }
}

impl From<&SlaCreate> for SlaUpdate {
    fn from(c: &SlaCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            doc_uuid: Some(c.doc_uuid.clone()),
            start_date: Some(c.start_date),
            end_date: Some(c.end_date),
        }
    }
}

impl From<&RegionCreate> for RegionUpdate {
    fn from(c: &RegionCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            overbooking_cpu: Some(c.overbooking_cpu),
            overbooking_ram: Some(c.overbooking_ram),
            bandwidth_in: Some(c.bandwidth_in),
            bandwidth_out: Some(c.bandwidth_out),
        }
    }
}

impl From<&LocationCreate> for LocationUpdate {
    fn from(c: &LocationCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            site: Some(c.site.clone()),
            country: Some(c.country.clone()),
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl From<&ServiceCreate> for ServiceUpdate {
    fn from(c: &ServiceCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            endpoint: Some(c.endpoint.clone()),
            name: Some(c.name),
        }
    }
}

impl From<&QuotaCreateExtended> for QuotaUpdate {
    fn from(c: &QuotaCreateExtended) -> Self {
        let mut update = Self {
            description: Some(c.description.clone()),
            per_user: Some(c.per_user),
            usage: Some(c.usage),
            ..Self::default()
        };
        match &c.limits {
            QuotaLimits::BlockStorage {
                gigabytes,
                per_volume_gigabytes,
                volumes,
            } => {
                update.gigabytes = *gigabytes;
                update.per_volume_gigabytes = *per_volume_gigabytes;
                update.volumes = *volumes;
            }
            QuotaLimits::Compute {
                cores,
                instances,
                ram,
            } => {
                update.cores = *cores;
                update.instances = *instances;
                update.ram = *ram;
            }
            QuotaLimits::Network {
                public_ips,
                networks,
                ports,
                security_groups,
                security_group_rules,
            } => {
                update.public_ips = *public_ips;
                update.networks = *networks;
                update.ports = *ports;
                update.security_groups = *security_groups;
                update.security_group_rules = *security_group_rules;
            }
            QuotaLimits::ObjectStore {
                bytes,
                containers,
                objects,
            } => {
                update.bytes = Some(*bytes);
                update.containers = Some(*containers);
                update.objects = Some(*objects);
            }
        }
        update
    }
}

impl From<&FlavorCreate> for FlavorUpdate {
    fn from(c: &FlavorCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            uuid: Some(c.uuid.clone()),
            disk: Some(c.disk),
            is_public: Some(c.is_public),
            ram: Some(c.ram),
            vcpus: Some(c.vcpus),
            swap: Some(c.swap),
            ephemeral: Some(c.ephemeral),
            infiniband: Some(c.infiniband),
            gpus: Some(c.gpus),
            gpu_model: c.gpu_model.clone(),
            gpu_vendor: c.gpu_vendor.clone(),
            local_storage: c.local_storage.clone(),
        }
    }
}

impl From<&ImageCreate> for ImageUpdate {
    fn from(c: &ImageCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            uuid: Some(c.uuid.clone()),
            os_type: c.os_type,
            os_distro: c.os_distro.clone(),
            os_version: c.os_version.clone(),
            architecture: c.architecture.clone(),
            kernel_id: c.kernel_id.clone(),
            cuda_support: Some(c.cuda_support),
            gpu_driver: Some(c.gpu_driver),
            is_public: Some(c.is_public),
            tags: Some(c.tags.clone()),
        }
    }
}

impl From<&NetworkCreate> for NetworkUpdate {
    fn from(c: &NetworkCreate) -> Self {
        Self {
            description: Some(c.description.clone()),
            name: Some(c.name.clone()),
            uuid: Some(c.uuid.clone()),
            is_shared: Some(c.is_shared),
            is_router_external: Some(c.is_router_external),
            is_default: Some(c.is_default),
            mtu: c.mtu,
            proxy_host: c.proxy_host.clone(),
            proxy_user: c.proxy_user.clone(),
            tags: Some(c.tags.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_type_rejects_foreign_fields() {
        let update: QuotaUpdate = serde_json::from_value(json!({"cores": 4})).unwrap();
        assert!(update.check_type(ServiceType::Compute).is_ok());

        let err = update.check_type(ServiceType::BlockStorage).unwrap_err();
        assert!(err.to_string().contains("cores"));
    }

    #[test]
    fn test_quota_update_from_create() {
        let quota: QuotaCreateExtended = serde_json::from_value(json!({
            "type": "block-storage",
            "project": "p1",
            "gigabytes": 100,
        }))
        .unwrap();
        let update = QuotaUpdate::from(&quota);
        assert_eq!(update.gigabytes, Some(100));
        assert_eq!(update.volumes, None);
        assert_eq!(update.per_user, Some(false));
        assert!(update.check_type(ServiceType::BlockStorage).is_ok());
    }
}
