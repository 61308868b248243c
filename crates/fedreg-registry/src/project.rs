//! Project reconciliation

use crate::{network, quota, sla};
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, ProjectCreate, ProjectUpdate};
use fedreg_store::Graph;
use tracing::debug;

pub(crate) fn create(graph: &mut Graph, provider: &str, input: &ProjectCreate) -> Uid {
    let project = Project {
        uid: new_uid(),
        description: input.description.clone(),
        name: input.name.clone(),
        uuid: input.uuid.clone(),
    };
    let uid = project.uid.clone();
    debug!(uid = %uid, uuid = %input.uuid, provider, "Creating project");

    graph.insert(project);
    graph.provider_projects.connect(provider, &uid);
    uid
}

pub(crate) fn update(graph: &mut Graph, uid: &str, input: &ProjectCreate) -> Result<bool> {
    Ok(graph
        .projects
        .require_mut(uid)?
        .merge(&ProjectUpdate::from(input), MergePolicy::FullReplace))
}

/// Delete a project together with its quotas, its private networks and the
/// SLAs pointing only to it.
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    for sla_uid in graph.sla_projects.sources(uid) {
        if graph.sla_projects.targets(&sla_uid).len() <= 1 {
            sla::remove(graph, &sla_uid)?;
        }
    }
    for quota_uid in graph.quota_project.sources(uid) {
        quota::remove(graph, &quota_uid)?;
    }
    for network_uid in graph.network_project.sources(uid) {
        network::remove(graph, &network_uid)?;
    }
    debug!(uid, "Deleting project");
    graph
        .delete::<Project>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Project::KIND, uid))
}
