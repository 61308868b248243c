//! Input trees accepted when creating (or fully replacing) a provider

use chrono::NaiveDate;
use fedreg_core::{
    AuthMethod, ImageOs, ProviderStatus, ProviderType, QuotaLimits, ServiceName, ServiceType,
};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_overbooking() -> f64 {
    1.0
}

fn default_bandwidth() -> f64 {
    10.0
}

/// Provider attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Provider name
    pub name: String,
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Provider status
    #[serde(default)]
    pub status: ProviderStatus,
    /// Public or private provider
    #[serde(default)]
    pub is_public: bool,
    /// Maintainers e-mails
    #[serde(default)]
    pub support_emails: Vec<String>,
}

/// Provider with its whole nested tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCreateExtended {
    /// Provider attributes
    #[serde(flatten)]
    pub base: ProviderCreate,
    /// Projects supplied by the provider
    #[serde(default)]
    pub projects: Vec<ProjectCreate>,
    /// Trusted identity providers
    #[serde(default)]
    pub identity_providers: Vec<IdentityProviderCreateExtended>,
    /// Regions
    #[serde(default)]
    pub regions: Vec<RegionCreateExtended>,
}

/// Project attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Project name in the provider
    pub name: String,
    /// Project unique ID in the provider
    pub uuid: String,
}

/// Identity provider attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProviderCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// URL of the identity provider
    pub endpoint: String,
    /// Token claim carrying the user group name
    pub group_claim: String,
}

/// Identity provider as seen by one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProviderCreateExtended {
    /// Identity provider attributes
    #[serde(flatten)]
    pub base: IdentityProviderCreate,
    /// How the provider authenticates against this identity provider
    pub relationship: AuthMethod,
    /// User groups granted access to the provider
    pub user_groups: Vec<UserGroupCreateExtended>,
}

/// User group attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroupCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// User group name in the identity provider
    pub name: String,
}

/// User group with the SLA granting it access to a provider project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroupCreateExtended {
    /// User group attributes
    #[serde(flatten)]
    pub base: UserGroupCreate,
    /// SLA linking the group to a project
    pub sla: SlaCreateExtended,
}

/// SLA attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Unique ID of the document with the SLA details
    pub doc_uuid: String,
    /// Validity start date
    pub start_date: NaiveDate,
    /// Validity end date
    pub end_date: NaiveDate,
}

/// SLA with the uuid of the target provider project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCreateExtended {
    /// SLA attributes
    #[serde(flatten)]
    pub base: SlaCreate,
    /// Project uuid within the provider
    pub project: String,
}

/// Region attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Region name in the provider
    pub name: String,
    /// CPU overbooking factor
    #[serde(default = "default_overbooking")]
    pub overbooking_cpu: f64,
    /// RAM overbooking factor
    #[serde(default = "default_overbooking")]
    pub overbooking_ram: f64,
    /// Inbound bandwidth (Gbps)
    #[serde(default = "default_bandwidth")]
    pub bandwidth_in: f64,
    /// Outbound bandwidth (Gbps)
    #[serde(default = "default_bandwidth")]
    pub bandwidth_out: f64,
}

/// Region with location and services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCreateExtended {
    /// Region attributes
    #[serde(flatten)]
    pub base: RegionCreate,
    /// Hosting site
    #[serde(default)]
    pub location: Option<LocationCreate>,
    /// Block storage services
    #[serde(default)]
    pub block_storage_services: Vec<ServiceCreateExtended>,
    /// Compute services
    #[serde(default)]
    pub compute_services: Vec<ServiceCreateExtended>,
    /// Identity services
    #[serde(default)]
    pub identity_services: Vec<ServiceCreateExtended>,
    /// Network services
    #[serde(default)]
    pub network_services: Vec<ServiceCreateExtended>,
    /// Object store services
    #[serde(default)]
    pub object_store_services: Vec<ServiceCreateExtended>,
}

impl RegionCreateExtended {
    /// Service lists paired with the type their members must have
    pub fn services_by_type(&self) -> [(ServiceType, &[ServiceCreateExtended]); 5] {
        [
            (ServiceType::BlockStorage, self.block_storage_services.as_slice()),
            (ServiceType::Compute, self.compute_services.as_slice()),
            (ServiceType::Identity, self.identity_services.as_slice()),
            (ServiceType::Network, self.network_services.as_slice()),
            (ServiceType::ObjectStore, self.object_store_services.as_slice()),
        ]
    }

    /// Every service of the region regardless of type
    pub fn services(&self) -> impl Iterator<Item = &ServiceCreateExtended> {
        self.block_storage_services
            .iter()
            .chain(&self.compute_services)
            .chain(&self.identity_services)
            .chain(&self.network_services)
            .chain(&self.object_store_services)
    }
}

/// Location attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Site name
    pub site: String,
    /// Country name
    pub country: String,
    /// Latitude
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Service attributes. The type is implied by the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// URL of the service
    pub endpoint: String,
    /// Service implementation
    pub name: ServiceName,
}

/// Service with quotas, flavors, images and networks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCreateExtended {
    /// Service attributes
    #[serde(flatten)]
    pub base: ServiceCreate,
    /// Quotas applied to provider projects
    #[serde(default)]
    pub quotas: Vec<QuotaCreateExtended>,
    /// Flavors (compute only)
    #[serde(default)]
    pub flavors: Vec<FlavorCreateExtended>,
    /// Images (compute only)
    #[serde(default)]
    pub images: Vec<ImageCreateExtended>,
    /// Networks (networking only)
    #[serde(default)]
    pub networks: Vec<NetworkCreateExtended>,
}

impl ServiceCreateExtended {
    /// Type implied by the service name
    pub fn service_type(&self) -> ServiceType {
        self.base.name.service_type()
    }
}

/// Quota with the uuid of the target provider project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaCreateExtended {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Limitation applied to each user
    #[serde(default)]
    pub per_user: bool,
    /// Values describe current usage instead of limits
    #[serde(default)]
    pub usage: bool,
    /// Project uuid within the provider
    pub project: String,
    /// Typed limits
    #[serde(flatten)]
    pub limits: QuotaLimits,
}

/// Flavor attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Flavor name in the provider
    pub name: String,
    /// Flavor unique ID in the provider
    pub uuid: String,
    /// Reserved disk size (GiB)
    #[serde(default)]
    pub disk: u64,
    /// Public or private flavor
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Reserved RAM (MiB)
    #[serde(default)]
    pub ram: u64,
    /// Number of virtual CPUs
    #[serde(default)]
    pub vcpus: u64,
    /// Swap size (GiB)
    #[serde(default)]
    pub swap: u64,
    /// Ephemeral disk size (GiB)
    #[serde(default)]
    pub ephemeral: u64,
    /// MPI enabled
    #[serde(default)]
    pub infiniband: bool,
    /// Number of GPUs
    #[serde(default)]
    pub gpus: u64,
    /// GPU model
    #[serde(default)]
    pub gpu_model: Option<String>,
    /// GPU vendor
    #[serde(default)]
    pub gpu_vendor: Option<String>,
    /// Local storage
    #[serde(default)]
    pub local_storage: Option<String>,
}

/// Flavor with the uuids of the projects allowed to use it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorCreateExtended {
    /// Flavor attributes
    #[serde(flatten)]
    pub base: FlavorCreate,
    /// Project uuids (private flavors only)
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Image attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Image name in the provider
    pub name: String,
    /// Image unique ID in the provider
    pub uuid: String,
    /// OS type
    #[serde(default)]
    pub os_type: Option<ImageOs>,
    /// OS distribution
    #[serde(default)]
    pub os_distro: Option<String>,
    /// Distribution version
    #[serde(default)]
    pub os_version: Option<String>,
    /// OS architecture
    #[serde(default)]
    pub architecture: Option<String>,
    /// Kernel version
    #[serde(default)]
    pub kernel_id: Option<String>,
    /// CUDA support
    #[serde(default)]
    pub cuda_support: bool,
    /// GPU drivers installed
    #[serde(default)]
    pub gpu_driver: bool,
    /// Public or private image
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Image with the uuids of the projects allowed to use it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCreateExtended {
    /// Image attributes
    #[serde(flatten)]
    pub base: ImageCreate,
    /// Project uuids (private images only)
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Network attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCreate {
    /// Brief description
    #[serde(default)]
    pub description: String,
    /// Network name in the provider
    pub name: String,
    /// Network unique ID in the provider
    pub uuid: String,
    /// Shared or private network
    #[serde(default = "default_true")]
    pub is_shared: bool,
    /// Access to external networks
    #[serde(default)]
    pub is_router_external: bool,
    /// Default network
    #[serde(default)]
    pub is_default: bool,
    /// Maximum transmission unit (B)
    #[serde(default)]
    pub mtu: Option<u32>,
    /// Proxy address
    #[serde(default)]
    pub proxy_host: Option<String>,
    /// Proxy username
    #[serde(default)]
    pub proxy_user: Option<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Network with the uuid of the owning project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCreateExtended {
    /// Network attributes
    #[serde(flatten)]
    pub base: NetworkCreate,
    /// Project uuid (private networks only)
    #[serde(default)]
    pub project: Option<String>,
}
