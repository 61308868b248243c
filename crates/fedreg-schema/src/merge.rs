//! Attribute merge of an update into a stored node

use crate::update::*;
use fedreg_core::prelude::*;
use serde::{Deserialize, Serialize};

/// How absent fields of an update are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Absent fields are ignored and child collections are left alone
    PartialMerge,
    /// Absent fields take their default value and child collections are
    /// reconciled against the input
    FullReplace,
}

/// Merge an update into a node, reporting whether anything changed
pub trait Merge<U> {
    /// Apply `update` under `policy`. Returns `true` if the node changed.
    fn merge(&mut self, update: &U, policy: MergePolicy) -> bool;
}

/// Assign a field that has a default (or none, for required fields which are
/// never reset).
fn assign<T: PartialEq + Clone>(
    slot: &mut T,
    value: Option<&T>,
    default: Option<T>,
    policy: MergePolicy,
) -> bool {
    let next = match (value, policy) {
        (Some(v), _) => v.clone(),
        (None, MergePolicy::FullReplace) => match default {
            Some(d) => d,
            None => return false,
        },
        (None, MergePolicy::PartialMerge) => return false,
    };
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

/// Assign an optional field; `FullReplace` clears it when absent
fn assign_opt<T: PartialEq + Clone>(
    slot: &mut Option<T>,
    value: Option<&T>,
    policy: MergePolicy,
) -> bool {
    let next = match (value, policy) {
        (Some(v), _) => Some(v.clone()),
        (None, MergePolicy::FullReplace) => None,
        (None, MergePolicy::PartialMerge) => return false,
    };
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

fn description(slot: &mut String, value: Option<&String>, policy: MergePolicy) -> bool {
    assign(slot, value, Some(String::new()), policy)
}

impl Merge<ProviderUpdate> for Provider {
    fn merge(&mut self, u: &ProviderUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.provider_type, u.provider_type.as_ref(), None, policy);
        changed |= assign(
            &mut self.status,
            u.status.as_ref(),
            Some(ProviderStatus::default()),
            policy,
        );
        changed |= assign(&mut self.is_public, u.is_public.as_ref(), Some(false), policy);
        changed |= assign(
            &mut self.support_emails,
            u.support_emails.as_ref(),
            Some(Vec::new()),
            policy,
        );
        changed
    }
}

impl Merge<ProjectUpdate> for Project {
    fn merge(&mut self, u: &ProjectUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.uuid, u.uuid.as_ref(), None, policy);
        changed
    }
}

impl Merge<IdentityProviderUpdate> for IdentityProvider {
    fn merge(&mut self, u: &IdentityProviderUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.endpoint, u.endpoint.as_ref(), None, policy);
        changed |= assign(&mut self.group_claim, u.group_claim.as_ref(), None, policy);
        changed
    }
}

impl Merge<UserGroupUpdate> for UserGroup {
    fn merge(&mut self, u: &UserGroupUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed
    }
}

impl Merge<SlaUpdate> for Sla {
    fn merge(&mut self, u: &SlaUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.doc_uuid, u.doc_uuid.as_ref(), None, policy);
        changed |= assign(&mut self.start_date, u.start_date.as_ref(), None, policy);
        changed |= assign(&mut self.end_date, u.end_date.as_ref(), None, policy);
        changed
    }
}

impl Merge<RegionUpdate> for Region {
    fn merge(&mut self, u: &RegionUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.overbooking_cpu, u.overbooking_cpu.as_ref(), Some(1.0), policy);
        changed |= assign(&mut self.overbooking_ram, u.overbooking_ram.as_ref(), Some(1.0), policy);
        changed |= assign(&mut self.bandwidth_in, u.bandwidth_in.as_ref(), Some(10.0), policy);
        changed |= assign(&mut self.bandwidth_out, u.bandwidth_out.as_ref(), Some(10.0), policy);
        changed
    }
}

impl Merge<LocationUpdate> for Location {
    fn merge(&mut self, u: &LocationUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.site, u.site.as_ref(), None, policy);
        changed |= assign(&mut self.country, u.country.as_ref(), None, policy);
        changed |= assign_opt(&mut self.latitude, u.latitude.as_ref(), policy);
        changed |= assign_opt(&mut self.longitude, u.longitude.as_ref(), policy);
        changed
    }
}

impl Merge<ServiceUpdate> for Service {
    fn merge(&mut self, u: &ServiceUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.endpoint, u.endpoint.as_ref(), None, policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed
    }
}

impl Merge<QuotaUpdate> for Quota {
    fn merge(&mut self, u: &QuotaUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.per_user, u.per_user.as_ref(), Some(false), policy);
        changed |= assign(&mut self.usage, u.usage.as_ref(), Some(false), policy);
        match &mut self.limits {
            QuotaLimits::BlockStorage {
                gigabytes,
                per_volume_gigabytes,
                volumes,
            } => {
                changed |= assign_opt(gigabytes, u.gigabytes.as_ref(), policy);
                changed |= assign_opt(per_volume_gigabytes, u.per_volume_gigabytes.as_ref(), policy);
                changed |= assign_opt(volumes, u.volumes.as_ref(), policy);
            }
            QuotaLimits::Compute {
                cores,
                instances,
                ram,
            } => {
                changed |= assign_opt(cores, u.cores.as_ref(), policy);
                changed |= assign_opt(instances, u.instances.as_ref(), policy);
                changed |= assign_opt(ram, u.ram.as_ref(), policy);
            }
            QuotaLimits::Network {
                public_ips,
                networks,
                ports,
                security_groups,
                security_group_rules,
            } => {
                changed |= assign_opt(public_ips, u.public_ips.as_ref(), policy);
                changed |= assign_opt(networks, u.networks.as_ref(), policy);
                changed |= assign_opt(ports, u.ports.as_ref(), policy);
                changed |= assign_opt(security_groups, u.security_groups.as_ref(), policy);
                changed |= assign_opt(
                    security_group_rules,
                    u.security_group_rules.as_ref(),
                    policy,
                );
            }
            QuotaLimits::ObjectStore {
                bytes,
                containers,
                objects,
            } => {
                changed |= assign(bytes, u.bytes.as_ref(), Some(-1), policy);
                changed |= assign(containers, u.containers.as_ref(), Some(1000), policy);
                changed |= assign(objects, u.objects.as_ref(), Some(-1), policy);
            }
        }
        changed
    }
}

impl Merge<FlavorUpdate> for Flavor {
    fn merge(&mut self, u: &FlavorUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.uuid, u.uuid.as_ref(), None, policy);
        changed |= assign(&mut self.disk, u.disk.as_ref(), Some(0), policy);
        changed |= assign(&mut self.is_public, u.is_public.as_ref(), Some(true), policy);
        changed |= assign(&mut self.ram, u.ram.as_ref(), Some(0), policy);
        changed |= assign(&mut self.vcpus, u.vcpus.as_ref(), Some(0), policy);
        changed |= assign(&mut self.swap, u.swap.as_ref(), Some(0), policy);
        changed |= assign(&mut self.ephemeral, u.ephemeral.as_ref(), Some(0), policy);
        changed |= assign(&mut self.infiniband, u.infiniband.as_ref(), Some(false), policy);
        changed |= assign(&mut self.gpus, u.gpus.as_ref(), Some(0), policy);
        changed |= assign_opt(&mut self.gpu_model, u.gpu_model.as_ref(), policy);
        changed |= assign_opt(&mut self.gpu_vendor, u.gpu_vendor.as_ref(), policy);
        changed |= assign_opt(&mut self.local_storage, u.local_storage.as_ref(), policy);
        changed
    }
}

impl Merge<ImageUpdate> for Image {
    fn merge(&mut self, u: &ImageUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.uuid, u.uuid.as_ref(), None, policy);
        changed |= assign_opt(&mut self.os_type, u.os_type.as_ref(), policy);
        changed |= assign_opt(&mut self.os_distro, u.os_distro.as_ref(), policy);
        changed |= assign_opt(&mut self.os_version, u.os_version.as_ref(), policy);
        changed |= assign_opt(&mut self.architecture, u.architecture.as_ref(), policy);
        changed |= assign_opt(&mut self.kernel_id, u.kernel_id.as_ref(), policy);
        changed |= assign(&mut self.cuda_support, u.cuda_support.as_ref(), Some(false), policy);
        changed |= assign(&mut self.gpu_driver, u.gpu_driver.as_ref(), Some(false), policy);
        changed |= assign(&mut self.is_public, u.is_public.as_ref(), Some(true), policy);
        changed |= assign(&mut self.tags, u.tags.as_ref(), Some(Vec::new()), policy);
        changed
    }
}

impl Merge<NetworkUpdate> for Network {
    fn merge(&mut self, u: &NetworkUpdate, policy: MergePolicy) -> bool {
        let mut changed = description(&mut self.description, u.description.as_ref(), policy);
        changed |= assign(&mut self.name, u.name.as_ref(), None, policy);
        changed |= assign(&mut self.uuid, u.uuid.as_ref(), None, policy);
        changed |= assign(&mut self.is_shared, u.is_shared.as_ref(), Some(true), policy);
        changed |= assign(
            &mut self.is_router_external,
            u.is_router_external.as_ref(),
            Some(false),
            policy,
        );
        changed |= assign(&mut self.is_default, u.is_default.as_ref(), Some(false), policy);
        changed |= assign_opt(&mut self.mtu, u.mtu.as_ref(), policy);
        changed |= assign_opt(&mut self.proxy_host, u.proxy_host.as_ref(), policy);
        changed |= assign_opt(&mut self.proxy_user, u.proxy_user.as_ref(), policy);
        changed |= assign(&mut self.tags, u.tags.as_ref(), Some(Vec::new()), policy);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region {
            uid: "r1".to_string(),
            description: "main".to_string(),
            name: "RegionOne".to_string(),
            overbooking_cpu: 2.0,
            overbooking_ram: 1.0,
            bandwidth_in: 10.0,
            bandwidth_out: 10.0,
        }
    }

    #[test]
    fn test_partial_merge_ignores_absent_fields() {
        let mut r = region();
        let update = RegionUpdate {
            bandwidth_in: Some(20.0),
            ..Default::default()
        };
        assert!(r.merge(&update, MergePolicy::PartialMerge));
        assert_eq!(r.bandwidth_in, 20.0);
        assert_eq!(r.overbooking_cpu, 2.0);
        assert_eq!(r.description, "main");
    }

    #[test]
    fn test_full_replace_resets_defaults() {
        let mut r = region();
        let update = RegionUpdate::default();
        assert!(r.merge(&update, MergePolicy::FullReplace));
        assert_eq!(r.overbooking_cpu, 1.0);
        assert_eq!(r.description, "");
        // required fields are never reset
        assert_eq!(r.name, "RegionOne");
    }

    #[test]
    fn test_unchanged_merge_reports_no_change() {
        let mut r = region();
        let update = RegionUpdate {
            name: Some("RegionOne".to_string()),
            overbooking_cpu: Some(2.0),
            ..Default::default()
        };
        assert!(!r.merge(&update, MergePolicy::PartialMerge));
        assert_eq!(r, region());
    }

    #[test]
    fn test_quota_merge_object_store_defaults() {
        let mut quota = Quota {
            uid: "q1".to_string(),
            description: String::new(),
            per_user: false,
            usage: false,
            limits: QuotaLimits::ObjectStore {
                bytes: 10,
                containers: 5,
                objects: -1,
            },
        };
        assert!(quota.merge(&QuotaUpdate::default(), MergePolicy::FullReplace));
        assert_eq!(
            quota.limits,
            QuotaLimits::ObjectStore {
                bytes: -1,
                containers: 1000,
                objects: -1
            }
        );
    }
}
