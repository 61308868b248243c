//! Enumerations and identifiers shared by every registry entity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-generated node identifier (32 lowercase hex chars)
pub type Uid = String;

/// Generate a fresh node identifier
pub fn new_uid() -> Uid {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Normalize a uid received from a client (dashes are accepted)
pub fn normalize_uid(raw: &str) -> Uid {
    raw.replace('-', "").to_lowercase()
}

/// Kind of resource provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenStack cluster
    Openstack,
    /// Kubernetes cluster
    Kubernetes,
}

impl ProviderType {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Openstack => "openstack",
            ProviderType::Kubernetes => "kubernetes",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Accepting workloads
    #[default]
    Active,
    /// Temporarily unavailable
    Maintenance,
    /// Accepting a reduced set of workloads
    Limited,
}

/// Service typology. Quotas share the same typology as their service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    /// Volumes
    BlockStorage,
    /// Virtual machines
    Compute,
    /// Authentication endpoint
    Identity,
    /// Networks, routers, floating IPs
    #[serde(rename = "networking")]
    Network,
    /// Buckets and objects
    ObjectStore,
}

impl ServiceType {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::BlockStorage => "block-storage",
            ServiceType::Compute => "compute",
            ServiceType::Identity => "identity",
            ServiceType::Network => "networking",
            ServiceType::ObjectStore => "object-store",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well known service implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceName {
    /// OpenStack block storage
    #[serde(rename = "org.openstack.cinder")]
    OpenstackCinder,
    /// OpenStack compute
    #[serde(rename = "org.openstack.nova")]
    OpenstackNova,
    /// OpenStack identity
    #[serde(rename = "org.openstack.keystone")]
    OpenstackKeystone,
    /// OpenStack networking
    #[serde(rename = "org.openstack.neutron")]
    OpenstackNeutron,
    /// OpenStack object storage
    #[serde(rename = "org.openstack.swift")]
    OpenstackSwift,
}

impl ServiceName {
    /// Typology implemented by this service
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceName::OpenstackCinder => ServiceType::BlockStorage,
            ServiceName::OpenstackNova => ServiceType::Compute,
            ServiceName::OpenstackKeystone => ServiceType::Identity,
            ServiceName::OpenstackNeutron => ServiceType::Network,
            ServiceName::OpenstackSwift => ServiceType::ObjectStore,
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::OpenstackCinder => "org.openstack.cinder",
            ServiceName::OpenstackNova => "org.openstack.nova",
            ServiceName::OpenstackKeystone => "org.openstack.keystone",
            ServiceName::OpenstackNeutron => "org.openstack.neutron",
            ServiceName::OpenstackSwift => "org.openstack.swift",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageOs {
    /// GNU/Linux
    Linux,
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    MacOS,
}
