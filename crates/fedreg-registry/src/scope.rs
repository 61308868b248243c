//! Provider-local lookups shared by the reconcilers

use fedreg_core::{Error, Result, Uid};
use fedreg_store::{Graph, Relation};
use std::collections::{HashMap, HashSet};

/// Projects of the provider being reconciled, by uuid and by uid
#[derive(Debug, Clone)]
pub(crate) struct ProviderScope {
    pub(crate) provider: Uid,
    by_uuid: HashMap<String, Uid>,
    uids: HashSet<Uid>,
}

impl ProviderScope {
    /// Snapshot the projects currently connected to `provider`
    pub(crate) fn load(graph: &Graph, provider: &str) -> Self {
        let mut by_uuid = HashMap::new();
        let mut uids = HashSet::new();
        for uid in graph.provider_projects.targets(provider) {
            if let Some(project) = graph.projects.get(&uid) {
                by_uuid.insert(project.uuid.clone(), uid.clone());
                uids.insert(uid);
            }
        }
        Self {
            provider: provider.to_string(),
            by_uuid,
            uids,
        }
    }

    /// Resolve a project uuid of this provider to its uid
    pub(crate) fn project(&self, uuid: &str) -> Result<&Uid> {
        self.by_uuid.get(uuid).ok_or_else(|| {
            Error::validation(format!(
                "Project {uuid} is not in the provider's project list"
            ))
        })
    }

    /// Resolve a list of project uuids
    pub(crate) fn projects(&self, uuids: &[String]) -> Result<HashSet<Uid>> {
        uuids
            .iter()
            .map(|uuid| self.project(uuid).cloned())
            .collect()
    }

    /// Whether the project uid belongs to this provider
    pub(crate) fn owns(&self, project: &str) -> bool {
        self.uids.contains(project)
    }
}

/// Make the in-scope targets of `source` equal to `desired`, leaving targets
/// owned by other providers untouched. Returns `true` if an edge changed.
pub(crate) fn sync_targets(
    relation: &mut Relation,
    source: &str,
    desired: &HashSet<Uid>,
    scope: &ProviderScope,
) -> bool {
    let mut changed = false;
    for target in relation.targets(source) {
        if scope.owns(&target) && !desired.contains(&target) {
            relation.disconnect(source, &target);
            changed = true;
        }
    }
    for target in desired {
        changed |= relation.connect(source, target);
    }
    changed
}

/// Provider owning a region
pub(crate) fn provider_of_region(graph: &Graph, region: &str) -> Option<Uid> {
    graph.provider_regions.single_source(region)
}

/// Provider owning a service (through its region)
pub(crate) fn provider_of_service(graph: &Graph, service: &str) -> Option<Uid> {
    graph
        .region_services
        .single_source(service)
        .and_then(|region| provider_of_region(graph, &region))
}

/// Every service of a provider, across all its regions
pub(crate) fn provider_services(graph: &Graph, provider: &str) -> Vec<Uid> {
    graph
        .provider_regions
        .targets(provider)
        .iter()
        .flat_map(|region| graph.region_services.targets(region))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedreg_core::Project;

    fn scoped_graph() -> Graph {
        let mut graph = Graph::new();
        for (uid, uuid) in [("u1", "a"), ("u2", "b")] {
            graph.insert(Project {
                uid: uid.to_string(),
                description: String::new(),
                name: uuid.to_string(),
                uuid: uuid.to_string(),
            });
        }
        graph.provider_projects.connect("p1", "u1");
        graph.provider_projects.connect("p2", "u2");
        graph
    }

    #[test]
    fn test_scope_resolves_own_projects_only() {
        let graph = scoped_graph();
        let scope = ProviderScope::load(&graph, "p1");
        assert_eq!(scope.project("a").unwrap(), "u1");
        assert!(scope.project("b").is_err());
        assert!(scope.owns("u1"));
        assert!(!scope.owns("u2"));
    }

    #[test]
    fn test_sync_targets_keeps_foreign_edges() {
        let mut graph = scoped_graph();
        graph.flavor_projects.connect("f1", "u1");
        graph.flavor_projects.connect("f1", "u2");
        let scope = ProviderScope::load(&graph, "p1");

        let changed = sync_targets(&mut graph.flavor_projects, "f1", &HashSet::new(), &scope);
        assert!(changed);
        assert_eq!(graph.flavor_projects.targets("f1"), vec!["u2".to_string()]);

        let desired = HashSet::from(["u1".to_string()]);
        assert!(sync_targets(&mut graph.flavor_projects, "f1", &desired, &scope));
        assert!(!sync_targets(&mut graph.flavor_projects, "f1", &desired, &scope));
    }
}
