//! Persisted node types of the registry graph
//!
//! Nodes carry only their own attributes. Relationships between nodes live
//! in the store's edge tables, so a node never embeds another node's uid.

use crate::types::{ImageOs, ProviderStatus, ProviderType, ServiceName, ServiceType, Uid};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Common behaviour of every stored node
pub trait Node: Clone + Serialize + Send + Sync + 'static {
    /// Human readable kind, used in error messages
    const KIND: &'static str;

    /// Database identifier
    fn uid(&self) -> &str;

    /// Fields visible to non-authenticated users (besides uid and description)
    fn public_fields() -> &'static [&'static str];
}

macro_rules! impl_node {
    ($ty:ty, $kind:literal, [$($field:literal),* $(,)?]) => {
        impl Node for $ty {
            const KIND: &'static str = $kind;

            fn uid(&self) -> &str {
                &self.uid
            }

            fn public_fields() -> &'static [&'static str] {
                &[$($field),*]
            }
        }
    };
}

/// Registered resource provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Provider unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Provider name
    pub name: String,
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Provider status
    pub status: ProviderStatus,
    /// Public or private provider
    pub is_public: bool,
    /// Maintainers e-mails
    pub support_emails: Vec<String>,
}

/// Project (tenant) supplied by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Project name in the provider
    pub name: String,
    /// Project unique ID in the provider
    pub uuid: String,
}

/// Identity provider, shared among providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProvider {
    /// Identity provider unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// URL of the identity provider
    pub endpoint: String,
    /// Token claim carrying the user group name
    pub group_claim: String,
}

/// Properties of the provider → identity provider relationship
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMethod {
    /// Name the provider gives to the identity provider
    pub idp_name: String,
    /// Protocol used to authenticate
    pub protocol: String,
}

/// Group of users defined in an identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroup {
    /// User group unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// User group name in the identity provider
    pub name: String,
}

/// Service level agreement between a user group and provider projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sla {
    /// SLA unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Unique ID of the document with the SLA details
    pub doc_uuid: String,
    /// Validity start date
    pub start_date: NaiveDate,
    /// Validity end date
    pub end_date: NaiveDate,
}

/// Region of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Region name in the provider
    pub name: String,
    /// CPU overbooking factor
    pub overbooking_cpu: f64,
    /// RAM overbooking factor
    pub overbooking_ram: f64,
    /// Inbound bandwidth (Gbps)
    pub bandwidth_in: f64,
    /// Outbound bandwidth (Gbps)
    pub bandwidth_out: f64,
}

/// Physical site hosting one or more regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Location unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Site name
    pub site: String,
    /// Country name
    pub country: String,
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
}

/// Service exposed by a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// URL of the service
    pub endpoint: String,
    /// Service type
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Service implementation
    pub name: ServiceName,
}

/// Typed limits of a quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuotaLimits {
    /// Block storage limits
    BlockStorage {
        /// Max usable GiB
        gigabytes: Option<i64>,
        /// Max GiB per volume
        per_volume_gigabytes: Option<i64>,
        /// Max number of volumes
        volumes: Option<i64>,
    },
    /// Compute limits
    Compute {
        /// Max usable cores
        cores: Option<i64>,
        /// Max VM instances
        instances: Option<i64>,
        /// Max usable RAM (MiB)
        ram: Option<i64>,
    },
    /// Network limits
    #[serde(rename = "networking")]
    Network {
        /// Max floating IPs
        public_ips: Option<i64>,
        /// Max networks
        networks: Option<i64>,
        /// Max ports
        ports: Option<i64>,
        /// Max security groups
        security_groups: Option<i64>,
        /// Max security group rules
        security_group_rules: Option<i64>,
    },
    /// Object store limits
    ObjectStore {
        /// Max bytes (-1 unlimited)
        #[serde(default = "unlimited")]
        bytes: i64,
        /// Max containers
        #[serde(default = "default_containers")]
        containers: i64,
        /// Max objects (-1 unlimited)
        #[serde(default = "unlimited")]
        objects: i64,
    },
}

fn unlimited() -> i64 {
    -1
}

fn default_containers() -> i64 {
    1000
}

impl QuotaLimits {
    /// Typology of these limits
    pub fn quota_type(&self) -> ServiceType {
        match self {
            QuotaLimits::BlockStorage { .. } => ServiceType::BlockStorage,
            QuotaLimits::Compute { .. } => ServiceType::Compute,
            QuotaLimits::Network { .. } => ServiceType::Network,
            QuotaLimits::ObjectStore { .. } => ServiceType::ObjectStore,
        }
    }
}

/// Resource limits applied to a project on a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    /// Quota unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Limitation applied to each user
    pub per_user: bool,
    /// Values describe current usage instead of limits
    pub usage: bool,
    /// Typed limits
    #[serde(flatten)]
    pub limits: QuotaLimits,
}

/// VM flavor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    /// Flavor unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Flavor name in the provider
    pub name: String,
    /// Flavor unique ID in the provider
    pub uuid: String,
    /// Reserved disk size (GiB)
    pub disk: u64,
    /// Public or private flavor
    pub is_public: bool,
    /// Reserved RAM (MiB)
    pub ram: u64,
    /// Number of virtual CPUs
    pub vcpus: u64,
    /// Swap size (GiB)
    pub swap: u64,
    /// Ephemeral disk size (GiB)
    pub ephemeral: u64,
    /// MPI enabled
    pub infiniband: bool,
    /// Number of GPUs
    pub gpus: u64,
    /// GPU model
    pub gpu_model: Option<String>,
    /// GPU vendor
    pub gpu_vendor: Option<String>,
    /// Local storage
    pub local_storage: Option<String>,
}

/// VM image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Image name in the provider
    pub name: String,
    /// Image unique ID in the provider
    pub uuid: String,
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
    pub cuda_support: bool,
    /// GPU drivers installed
    pub gpu_driver: bool,
    /// Public or private image
    pub is_public: bool,
    /// Tags
    pub tags: Vec<String>,
}

/// Network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Network unique ID
    pub uid: Uid,
    /// Brief description
    pub description: String,
    /// Network name in the provider
    pub name: String,
    /// Network unique ID in the provider
    pub uuid: String,
    /// Shared or private network
    pub is_shared: bool,
    /// Access to external networks
    pub is_router_external: bool,
    /// Default network
    pub is_default: bool,
    /// Maximum transmission unit (B)
    pub mtu: Option<u32>,
    /// Proxy address
    pub proxy_host: Option<String>,
    /// Proxy username
    pub proxy_user: Option<String>,
    /// Tags
    pub tags: Vec<String>,
}

impl_node!(Provider, "Provider", ["name"]);
impl_node!(Project, "Project", ["name", "uuid"]);
impl_node!(IdentityProvider, "Identity Provider", ["endpoint"]);
impl_node!(UserGroup, "User Group", ["name"]);
impl_node!(Sla, "SLA", ["doc_uuid"]);
impl_node!(Region, "Region", ["name"]);
impl_node!(Location, "Location", ["site", "country"]);
impl_node!(Service, "Service", ["endpoint", "type"]);
impl_node!(Quota, "Quota", ["type", "per_user", "usage"]);
impl_node!(Flavor, "Flavor", ["name", "uuid"]);
impl_node!(Image, "Image", ["name", "uuid"]);
impl_node!(Network, "Network", ["name", "uuid"]);
