//! Read projections
//!
//! Nodes are rendered as JSON objects. The public projection keeps `uid`,
//! `description` and the natural key fields; the private one keeps everything.
//! Extended projections add connected entities.

use crate::scope::ProviderScope;
use crate::user_group::slas_in_scope;
use fedreg_core::prelude::*;
use fedreg_store::{Graph, GraphNode};
use serde_json::{json, Map, Value};

/// Requested projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    /// All attributes instead of the public subset
    pub private: bool,
    /// Include connected entities
    pub extended: bool,
}

impl View {
    /// Discriminator carried by every top-level payload
    pub fn schema_type(&self) -> &'static str {
        match (self.private, self.extended) {
            (false, false) => "public",
            (true, false) => "private",
            (false, true) => "public_extended",
            (true, true) => "private_extended",
        }
    }
}

/// Render a single node
pub(crate) fn node<T: Node>(item: &T, private: bool) -> Result<Map<String, Value>> {
    let Value::Object(mut map) = serde_json::to_value(item)? else {
        return Err(Error::Internal(format!("{} is not a JSON object", T::KIND)));
    };
    if !private {
        let public = T::public_fields();
        map.retain(|key, _| key == "uid" || key == "description" || public.contains(&key.as_str()));
    }
    Ok(map)
}

/// Render the nodes behind a list of uids
pub(crate) fn nodes<T: GraphNode>(graph: &Graph, uids: &[Uid], private: bool) -> Result<Value> {
    T::table(graph)
        .many(uids)
        .map(|item| node(item, private).map(Value::Object))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Render the node behind an optional uid, `null` when absent
pub(crate) fn optional<T: GraphNode>(graph: &Graph, uid: Option<Uid>, private: bool) -> Result<Value> {
    match uid.as_deref().and_then(|uid| T::table(graph).get(uid)) {
        Some(item) => node(item, private).map(Value::Object),
        None => Ok(Value::Null),
    }
}

fn project_uuids(graph: &Graph, uids: &[Uid]) -> Value {
    Value::Array(
        graph
            .projects
            .many(uids)
            .map(|p| Value::String(p.uuid.clone()))
            .collect(),
    )
}

fn project_uuid(graph: &Graph, uid: Option<Uid>) -> Value {
    uid.as_deref()
        .and_then(|uid| graph.projects.get(uid))
        .map(|p| Value::String(p.uuid.clone()))
        .unwrap_or(Value::Null)
}

fn services_key(service_type: ServiceType) -> &'static str {
    match service_type {
        ServiceType::BlockStorage => "block_storage_services",
        ServiceType::Compute => "compute_services",
        ServiceType::Identity => "identity_services",
        ServiceType::Network => "network_services",
        ServiceType::ObjectStore => "object_store_services",
    }
}

/// Render a provider with its whole nested tree, in the same shape accepted
/// on creation.
pub(crate) fn provider_tree(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
    let provider = graph.providers.require(uid)?;
    let scope = ProviderScope::load(graph, uid);
    let mut out = node(provider, private)?;

    out.insert(
        "projects".to_string(),
        nodes::<Project>(graph, &graph.provider_projects.targets(uid), private)?,
    );

    let mut idps = Vec::new();
    for idp_uid in graph.auth_methods.targets(uid) {
        let idp = graph.identity_providers.require(&idp_uid)?;
        let mut entry = node(idp, private)?;
        if private {
            let auth = graph.auth_methods.props(uid, &idp_uid).cloned().unwrap_or_default();
            entry.insert("relationship".to_string(), serde_json::to_value(auth)?);
        }
        let mut groups = Vec::new();
        for group_uid in graph.idp_user_groups.targets(&idp_uid) {
            let slas = slas_in_scope(graph, &group_uid, &scope);
            let Some(sla_uid) = slas.first() else {
                continue;
            };
            let group = graph.user_groups.require(&group_uid)?;
            let sla = graph.slas.require(sla_uid)?;
            let mut sla_entry = node(sla, private)?;
            let project = graph
                .sla_projects
                .targets(sla_uid)
                .into_iter()
                .find(|p| scope.owns(p));
            sla_entry.insert("project".to_string(), project_uuid(graph, project));

            let mut group_entry = node(group, private)?;
            group_entry.insert("sla".to_string(), Value::Object(sla_entry));
            groups.push(Value::Object(group_entry));
        }
        entry.insert("user_groups".to_string(), Value::Array(groups));
        idps.push(Value::Object(entry));
    }
    out.insert("identity_providers".to_string(), Value::Array(idps));

    let mut regions = Vec::new();
    for region_uid in graph.provider_regions.targets(uid) {
        regions.push(Value::Object(region_tree(graph, &region_uid, private)?));
    }
    out.insert("regions".to_string(), Value::Array(regions));
    Ok(out)
}

fn region_tree(graph: &Graph, uid: &str, private: bool) -> Result<Map<String, Value>> {
    let region = graph.regions.require(uid)?;
    let mut out = node(region, private)?;
    out.insert(
        "location".to_string(),
        optional::<Location>(graph, graph.region_location.single_target(uid), private)?,
    );
    for service_type in [
        ServiceType::BlockStorage,
        ServiceType::Compute,
        ServiceType::Identity,
        ServiceType::Network,
        ServiceType::ObjectStore,
    ] {
        out.insert(services_key(service_type).to_string(), json!([]));
    }

    for service_uid in graph.region_services.targets(uid) {
        let service = graph.services.require(&service_uid)?;
        let entry = service_tree(graph, service, private)?;
        if let Some(Value::Array(list)) = out.get_mut(services_key(service.service_type)) {
            list.push(Value::Object(entry));
        }
    }
    Ok(out)
}

fn service_tree(graph: &Graph, service: &Service, private: bool) -> Result<Map<String, Value>> {
    let uid = service.uid.as_str();
    let mut out = node(service, private)?;

    let mut quotas = Vec::new();
    for quota in graph.quotas.many(&graph.service_quotas.targets(uid)) {
        let mut entry = node(quota, private)?;
        entry.insert(
            "project".to_string(),
            project_uuid(graph, graph.quota_project.single_target(&quota.uid)),
        );
        quotas.push(Value::Object(entry));
    }
    out.insert("quotas".to_string(), Value::Array(quotas));

    if service.service_type == ServiceType::Compute {
        let mut flavors = Vec::new();
        for flavor in graph.flavors.many(&graph.service_flavors.targets(uid)) {
            let mut entry = node(flavor, private)?;
            entry.insert(
                "projects".to_string(),
                project_uuids(graph, &graph.flavor_projects.targets(&flavor.uid)),
            );
            flavors.push(Value::Object(entry));
        }
        out.insert("flavors".to_string(), Value::Array(flavors));

        let mut images = Vec::new();
        for image in graph.images.many(&graph.service_images.targets(uid)) {
            let mut entry = node(image, private)?;
            entry.insert(
                "projects".to_string(),
                project_uuids(graph, &graph.image_projects.targets(&image.uid)),
            );
            images.push(Value::Object(entry));
        }
        out.insert("images".to_string(), Value::Array(images));
    }

    if service.service_type == ServiceType::Network {
        let mut networks = Vec::new();
        for network in graph.networks.many(&graph.service_networks.targets(uid)) {
            let mut entry = node(network, private)?;
            entry.insert(
                "project".to_string(),
                project_uuid(graph, graph.network_project.single_target(&network.uid)),
            );
            networks.push(Value::Object(entry));
        }
        out.insert("networks".to_string(), Value::Array(networks));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Provider {
        Provider {
            uid: "p1".to_string(),
            description: "test".to_string(),
            name: "cloud".to_string(),
            provider_type: ProviderType::Openstack,
            status: ProviderStatus::Active,
            is_public: true,
            support_emails: vec!["admin@cloud.example.org".to_string()],
        }
    }

    #[test]
    fn test_public_projection_hides_attributes() {
        let public = node(&provider(), false).unwrap();
        assert_eq!(public.len(), 3);
        assert!(public.contains_key("name"));
        assert!(!public.contains_key("support_emails"));

        let private = node(&provider(), true).unwrap();
        assert_eq!(private["support_emails"][0], "admin@cloud.example.org");
        assert_eq!(private["type"], "openstack");
    }

    #[test]
    fn test_schema_types() {
        let view = View {
            private: false,
            extended: true,
        };
        assert_eq!(view.schema_type(), "public_extended");
        let view = View {
            private: true,
            extended: false,
        };
        assert_eq!(view.schema_type(), "private");
    }

    #[test]
    fn test_empty_provider_tree() {
        let mut graph = Graph::new();
        graph.insert(provider());
        let tree = provider_tree(&graph, "p1", true).unwrap();
        assert_eq!(tree["projects"], json!([]));
        assert_eq!(tree["identity_providers"], json!([]));
        assert_eq!(tree["regions"], json!([]));
    }
}
