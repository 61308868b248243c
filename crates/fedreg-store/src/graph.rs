//! In-memory property graph
//!
//! One [`Table`] per node kind and one [`Relation`] per relationship type.

use crate::relation::Relation;
use fedreg_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nodes of a single kind, keyed by uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<T> {
    rows: BTreeMap<Uid, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Node> Table<T> {
    /// Insert (or replace) a node
    pub fn insert(&mut self, node: T) {
        self.rows.insert(node.uid().to_string(), node);
    }

    /// Get a node by uid
    pub fn get(&self, uid: &str) -> Option<&T> {
        self.rows.get(uid)
    }

    /// Get a mutable node by uid
    pub fn get_mut(&mut self, uid: &str) -> Option<&mut T> {
        self.rows.get_mut(uid)
    }

    /// Get a node by uid or fail with a not-found error
    pub fn require(&self, uid: &str) -> Result<&T> {
        self.rows.get(uid).ok_or_else(|| Error::not_found(T::KIND, uid))
    }

    /// Get a mutable node by uid or fail with a not-found error
    pub fn require_mut(&mut self, uid: &str) -> Result<&mut T> {
        self.rows
            .get_mut(uid)
            .ok_or_else(|| Error::not_found(T::KIND, uid))
    }

    /// Remove a node. Edges are not touched; use [`Graph::delete`] for that.
    pub fn remove(&mut self, uid: &str) -> Option<T> {
        self.rows.remove(uid)
    }

    /// Check whether a node exists
    pub fn contains(&self, uid: &str) -> bool {
        self.rows.contains_key(uid)
    }

    /// Iterate over all nodes, ordered by uid
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Resolve a list of uids, skipping dangling ones
    pub fn many<'a>(&'a self, uids: &'a [Uid]) -> impl Iterator<Item = &'a T> + 'a {
        uids.iter().filter_map(move |uid| self.rows.get(uid))
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whole registry graph
///
/// Relationship fields are named `<source>_<target>`; the source is always the
/// owning side (provider → project, service → quota, quota → project, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Graph {
    /// Providers
    pub providers: Table<Provider>,
    /// Projects
    pub projects: Table<Project>,
    /// Identity providers
    pub identity_providers: Table<IdentityProvider>,
    /// User groups
    pub user_groups: Table<UserGroup>,
    /// SLAs
    pub slas: Table<Sla>,
    /// Regions
    pub regions: Table<Region>,
    /// Locations
    pub locations: Table<Location>,
    /// Services
    pub services: Table<Service>,
    /// Quotas
    pub quotas: Table<Quota>,
    /// Flavors
    pub flavors: Table<Flavor>,
    /// Images
    pub images: Table<Image>,
    /// Networks
    pub networks: Table<Network>,

    /// Provider → Project
    pub provider_projects: Relation,
    /// Provider → Region
    pub provider_regions: Relation,
    /// Provider → IdentityProvider, with authentication method details
    pub auth_methods: Relation<AuthMethod>,
    /// IdentityProvider → UserGroup
    pub idp_user_groups: Relation,
    /// UserGroup → SLA
    pub user_group_slas: Relation,
    /// SLA → Project
    pub sla_projects: Relation,
    /// Region → Location
    pub region_location: Relation,
    /// Region → Service
    pub region_services: Relation,
    /// Service → Quota
    pub service_quotas: Relation,
    /// Quota → Project
    pub quota_project: Relation,
    /// Service → Flavor
    pub service_flavors: Relation,
    /// Flavor → Project
    pub flavor_projects: Relation,
    /// Service → Image
    pub service_images: Relation,
    /// Image → Project
    pub image_projects: Relation,
    /// Service → Network
    pub service_networks: Relation,
    /// Network → Project
    pub network_project: Relation,
}

/// Node kinds stored in the [`Graph`]
pub trait GraphNode: Node {
    /// Table holding this kind
    fn table(graph: &Graph) -> &Table<Self>;

    /// Mutable table holding this kind
    fn table_mut(graph: &mut Graph) -> &mut Table<Self>;
}

macro_rules! graph_node {
    ($ty:ty, $field:ident) => {
        impl GraphNode for $ty {
            fn table(graph: &Graph) -> &Table<Self> {
                &graph.$field
            }

            fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
                &mut graph.$field
            }
        }
    };
}

graph_node!(Provider, providers);
graph_node!(Project, projects);
graph_node!(IdentityProvider, identity_providers);
graph_node!(UserGroup, user_groups);
graph_node!(Sla, slas);
graph_node!(Region, regions);
graph_node!(Location, locations);
graph_node!(Service, services);
graph_node!(Quota, quotas);
graph_node!(Flavor, flavors);
graph_node!(Image, images);
graph_node!(Network, networks);

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node of any kind or fail with a not-found error
    pub fn require<T: GraphNode>(&self, uid: &str) -> Result<&T> {
        T::table(self).require(uid)
    }

    /// Insert a node of any kind
    pub fn insert<T: GraphNode>(&mut self, node: T) {
        T::table_mut(self).insert(node)
    }

    /// Delete a node and every edge touching it
    pub fn delete<T: GraphNode>(&mut self, uid: &str) -> Option<T> {
        let removed = T::table_mut(self).remove(uid);
        if removed.is_some() {
            self.detach(uid);
        }
        removed
    }

    /// Remove every edge touching `uid`
    pub fn detach(&mut self, uid: &str) -> usize {
        self.provider_projects.detach(uid)
            + self.provider_regions.detach(uid)
            + self.auth_methods.detach(uid)
            + self.idp_user_groups.detach(uid)
            + self.user_group_slas.detach(uid)
            + self.sla_projects.detach(uid)
            + self.region_location.detach(uid)
            + self.region_services.detach(uid)
            + self.service_quotas.detach(uid)
            + self.quota_project.detach(uid)
            + self.service_flavors.detach(uid)
            + self.flavor_projects.detach(uid)
            + self.service_images.detach(uid)
            + self.image_projects.detach(uid)
            + self.service_networks.detach(uid)
            + self.network_project.detach(uid)
    }

    /// Node count per kind
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("providers", self.providers.len()),
            ("projects", self.projects.len()),
            ("identity_providers", self.identity_providers.len()),
            ("user_groups", self.user_groups.len()),
            ("slas", self.slas.len()),
            ("regions", self.regions.len()),
            ("locations", self.locations.len()),
            ("services", self.services.len()),
            ("quotas", self.quotas.len()),
            ("flavors", self.flavors.len()),
            ("images", self.images.len()),
            ("networks", self.networks.len()),
        ])
    }
}
