//! Generic per-node-kind operations: consistency checks of attribute
//! updates, cascading deletion and connected entities.

use crate::read::{nodes, optional};
use crate::{
    flavor, identity_provider, image, network, project, provider, quota, region, service, sla,
    user_group,
};
use fedreg_core::prelude::*;
use fedreg_schema::*;
use fedreg_store::{Graph, GraphNode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// A node kind exposed through the generic read / patch / delete operations.
///
/// Every implementor also merges its own `Update` type (see [`Merge`]).
pub trait Resource: GraphNode {
    /// Partial attribute update accepted by PATCH
    type Update: Validate + DeserializeOwned + Debug + Send + Sync + 'static;

    /// Checks an update must pass against the current graph
    fn check_update(graph: &Graph, uid: &str, update: &Self::Update) -> Result<()>;

    /// Delete the node and cascade to what it owns
    fn remove(graph: &mut Graph, uid: &str) -> Result<()>;

    /// Connected entities rendered in the extended projection
    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>>;
}

fn conflict(kind: &str, field: &str, value: &str) -> Error {
    Error::bad_request(format!("{kind} with {field} '{value}' already exists"))
}

/// Reject `value` when a sibling other than `uid` already has it
fn unique_among<T: GraphNode>(
    graph: &Graph,
    siblings: &[Uid],
    uid: &str,
    field: &str,
    value: Option<&String>,
    get: impl Fn(&T) -> &str,
) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let clash = T::table(graph)
        .many(siblings)
        .any(|item| item.uid() != uid && get(item) == value);
    if clash {
        Err(conflict(T::KIND, field, value))
    } else {
        Ok(())
    }
}

fn all_uids<T: GraphNode>(graph: &Graph) -> Vec<Uid> {
    T::table(graph).values().map(|n| n.uid().to_string()).collect()
}

fn set(map: &mut Map<String, Value>, key: &str, value: Value) {
    map.insert(key.to_string(), value);
}

impl Resource for Provider {
    type Update = ProviderUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &ProviderUpdate) -> Result<()> {
        let current = graph.providers.require(uid)?;
        let name = update.name.as_deref().unwrap_or(&current.name);
        let provider_type = update.provider_type.unwrap_or(current.provider_type);
        crate::checks::provider_unique(graph, name, provider_type, Some(uid))
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        provider::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut tree = crate::read::provider_tree(graph, uid, private)?;
        let mut out = Map::new();
        for key in ["projects", "identity_providers", "regions"] {
            if let Some(value) = tree.remove(key) {
                out.insert(key.to_string(), value);
            }
        }
        Ok(out)
    }
}

impl Resource for Project {
    type Update = ProjectUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &ProjectUpdate) -> Result<()> {
        graph.projects.require(uid)?;
        for provider_uid in graph.provider_projects.sources(uid) {
            let siblings = graph.provider_projects.targets(&provider_uid);
            unique_among::<Project>(graph, &siblings, uid, "name", update.name.as_ref(), |p| &p.name)?;
            unique_among::<Project>(graph, &siblings, uid, "uuid", update.uuid.as_ref(), |p| &p.uuid)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        project::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "provider", optional::<Provider>(graph, graph.provider_projects.single_source(uid), private)?);
        set(&mut out, "sla", optional::<Sla>(graph, graph.sla_projects.single_source(uid), private)?);
        set(&mut out, "quotas", nodes::<Quota>(graph, &graph.quota_project.sources(uid), private)?);
        set(&mut out, "flavors", nodes::<Flavor>(graph, &graph.flavor_projects.sources(uid), private)?);
        set(&mut out, "images", nodes::<Image>(graph, &graph.image_projects.sources(uid), private)?);
        set(&mut out, "networks", nodes::<Network>(graph, &graph.network_project.sources(uid), private)?);
        Ok(out)
    }
}

impl Resource for IdentityProvider {
    type Update = IdentityProviderUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &IdentityProviderUpdate) -> Result<()> {
        graph.identity_providers.require(uid)?;
        let all = all_uids::<IdentityProvider>(graph);
        unique_among::<IdentityProvider>(graph, &all, uid, "endpoint", update.endpoint.as_ref(), |i| {
            &i.endpoint
        })
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        identity_provider::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut providers = Vec::new();
        for provider_uid in graph.auth_methods.sources(uid) {
            let Some(p) = graph.providers.get(&provider_uid) else {
                continue;
            };
            let mut entry = crate::read::node(p, private)?;
            if private {
                let auth = graph.auth_methods.props(&provider_uid, uid).cloned().unwrap_or_default();
                entry.insert("relationship".to_string(), serde_json::to_value(auth)?);
            }
            providers.push(Value::Object(entry));
        }
        let mut out = Map::new();
        set(&mut out, "providers", Value::Array(providers));
        set(&mut out, "user_groups", nodes::<UserGroup>(graph, &graph.idp_user_groups.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for UserGroup {
    type Update = UserGroupUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &UserGroupUpdate) -> Result<()> {
        graph.user_groups.require(uid)?;
        for idp_uid in graph.idp_user_groups.sources(uid) {
            let siblings = graph.idp_user_groups.targets(&idp_uid);
            unique_among::<UserGroup>(graph, &siblings, uid, "name", update.name.as_ref(), |g| &g.name)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        user_group::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(
            &mut out,
            "identity_provider",
            optional::<IdentityProvider>(graph, graph.idp_user_groups.single_source(uid), private)?,
        );
        set(&mut out, "slas", nodes::<Sla>(graph, &graph.user_group_slas.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Sla {
    type Update = SlaUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &SlaUpdate) -> Result<()> {
        let current = graph.slas.require(uid)?;
        let start = update.start_date.unwrap_or(current.start_date);
        let end = update.end_date.unwrap_or(current.end_date);
        if start >= end {
            return Err(Error::validation(format!(
                "Start date {start} should be lower than end date {end}"
            )));
        }
        let all = all_uids::<Sla>(graph);
        unique_among::<Sla>(graph, &all, uid, "doc_uuid", update.doc_uuid.as_ref(), |s| &s.doc_uuid)
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        sla::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(
            &mut out,
            "user_group",
            optional::<UserGroup>(graph, graph.user_group_slas.single_source(uid), private)?,
        );
        set(&mut out, "projects", nodes::<Project>(graph, &graph.sla_projects.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Region {
    type Update = RegionUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &RegionUpdate) -> Result<()> {
        graph.regions.require(uid)?;
        for provider_uid in graph.provider_regions.sources(uid) {
            let siblings = graph.provider_regions.targets(&provider_uid);
            unique_among::<Region>(graph, &siblings, uid, "name", update.name.as_ref(), |r| &r.name)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        region::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "provider", optional::<Provider>(graph, graph.provider_regions.single_source(uid), private)?);
        set(&mut out, "location", optional::<Location>(graph, graph.region_location.single_target(uid), private)?);
        set(&mut out, "services", nodes::<Service>(graph, &graph.region_services.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Location {
    type Update = LocationUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &LocationUpdate) -> Result<()> {
        graph.locations.require(uid)?;
        let all = all_uids::<Location>(graph);
        unique_among::<Location>(graph, &all, uid, "site", update.site.as_ref(), |l| &l.site)
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        graph
            .delete::<Location>(uid)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(Location::KIND, uid))
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "regions", nodes::<Region>(graph, &graph.region_location.sources(uid), private)?);
        Ok(out)
    }
}

impl Resource for Service {
    type Update = ServiceUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &ServiceUpdate) -> Result<()> {
        let current = graph.services.require(uid)?;
        if let Some(name) = update.name {
            if name.service_type() != current.service_type {
                return Err(Error::validation(format!(
                    "Service name {name} does not match service type {}",
                    current.service_type
                )));
            }
        }
        let all = all_uids::<Service>(graph);
        unique_among::<Service>(graph, &all, uid, "endpoint", update.endpoint.as_ref(), |s| &s.endpoint)
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        service::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "region", optional::<Region>(graph, graph.region_services.single_source(uid), private)?);
        set(&mut out, "quotas", nodes::<Quota>(graph, &graph.service_quotas.targets(uid), private)?);
        set(&mut out, "flavors", nodes::<Flavor>(graph, &graph.service_flavors.targets(uid), private)?);
        set(&mut out, "images", nodes::<Image>(graph, &graph.service_images.targets(uid), private)?);
        set(&mut out, "networks", nodes::<Network>(graph, &graph.service_networks.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Quota {
    type Update = QuotaUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &QuotaUpdate) -> Result<()> {
        let current = graph.quotas.require(uid)?;
        update.check_type(current.limits.quota_type())?;

        let per_user = update.per_user.unwrap_or(current.per_user);
        let usage = update.usage.unwrap_or(current.usage);
        let project = graph.quota_project.single_target(uid);
        for service_uid in graph.service_quotas.sources(uid) {
            let clash = graph
                .service_quotas
                .targets(&service_uid)
                .iter()
                .filter(|other| other.as_str() != uid)
                .filter_map(|other| quota::key(graph, other))
                .any(|(p, u, us)| Some(&p) == project.as_ref() && u == per_user && us == usage);
            if clash {
                return Err(Error::bad_request(
                    "The service already has a quota of this kind for the same project",
                ));
            }
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        quota::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "service", optional::<Service>(graph, graph.service_quotas.single_source(uid), private)?);
        set(&mut out, "project", optional::<Project>(graph, graph.quota_project.single_target(uid), private)?);
        Ok(out)
    }
}

impl Resource for Flavor {
    type Update = FlavorUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &FlavorUpdate) -> Result<()> {
        let current = graph.flavors.require(uid)?;
        if update.is_public.is_some_and(|v| v != current.is_public) {
            return Err(Error::bad_request(
                "Flavor visibility (is_public) cannot be changed",
            ));
        }
        for service_uid in graph.service_flavors.sources(uid) {
            let siblings = graph.service_flavors.targets(&service_uid);
            unique_among::<Flavor>(graph, &siblings, uid, "name", update.name.as_ref(), |f| &f.name)?;
            unique_among::<Flavor>(graph, &siblings, uid, "uuid", update.uuid.as_ref(), |f| &f.uuid)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        flavor::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "services", nodes::<Service>(graph, &graph.service_flavors.sources(uid), private)?);
        set(&mut out, "projects", nodes::<Project>(graph, &graph.flavor_projects.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Image {
    type Update = ImageUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &ImageUpdate) -> Result<()> {
        let current = graph.images.require(uid)?;
        if update.is_public.is_some_and(|v| v != current.is_public) {
            return Err(Error::bad_request(
                "Image visibility (is_public) cannot be changed",
            ));
        }
        for service_uid in graph.service_images.sources(uid) {
            let siblings = graph.service_images.targets(&service_uid);
            unique_among::<Image>(graph, &siblings, uid, "name", update.name.as_ref(), |i| &i.name)?;
            unique_among::<Image>(graph, &siblings, uid, "uuid", update.uuid.as_ref(), |i| &i.uuid)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        image::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "services", nodes::<Service>(graph, &graph.service_images.sources(uid), private)?);
        set(&mut out, "projects", nodes::<Project>(graph, &graph.image_projects.targets(uid), private)?);
        Ok(out)
    }
}

impl Resource for Network {
    type Update = NetworkUpdate;

    fn check_update(graph: &Graph, uid: &str, update: &NetworkUpdate) -> Result<()> {
        let current = graph.networks.require(uid)?;
        if update.is_shared.is_some_and(|v| v != current.is_shared) {
            return Err(Error::bad_request(
                "Network sharing (is_shared) cannot be changed",
            ));
        }
        for service_uid in graph.service_networks.sources(uid) {
            let siblings = graph.service_networks.targets(&service_uid);
            unique_among::<Network>(graph, &siblings, uid, "name", update.name.as_ref(), |n| &n.name)?;
            unique_among::<Network>(graph, &siblings, uid, "uuid", update.uuid.as_ref(), |n| &n.uuid)?;
        }
        Ok(())
    }

    fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
        network::remove(graph, uid)
    }

    fn connections(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        set(&mut out, "service", optional::<Service>(graph, graph.service_networks.single_source(uid), private)?);
        set(&mut out, "project", optional::<Project>(graph, graph.network_project.single_target(uid), private)?);
        Ok(out)
    }
}
