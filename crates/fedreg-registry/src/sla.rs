//! SLA reconciliation

use crate::scope::ProviderScope;
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, SlaCreate, SlaCreateExtended, SlaUpdate};
use fedreg_store::Graph;
use tracing::debug;

/// Free `project` from the SLA currently pointing to it: an SLA left with no
/// other project is deleted, otherwise the project is just disconnected.
pub(crate) fn release_project(graph: &mut Graph, project: &str) -> Result<bool> {
    let Some(sla) = graph.sla_projects.single_source(project) else {
        return Ok(false);
    };
    if graph.sla_projects.targets(&sla).len() <= 1 {
        remove(graph, &sla)?;
    } else {
        debug!(sla = %sla, project, "Disconnecting project from SLA");
        graph.sla_projects.disconnect(&sla, project);
    }
    Ok(true)
}

/// Link `user_group` to `project` through an SLA, reusing the group's SLA
/// with the same document when it exists.
pub(crate) fn create(
    graph: &mut Graph,
    user_group: &str,
    project: &str,
    input: &SlaCreate,
) -> Result<Uid> {
    let existing = graph
        .user_group_slas
        .targets(user_group)
        .into_iter()
        .find(|uid| graph.slas.get(uid).is_some_and(|s| s.doc_uuid == input.doc_uuid));

    let uid = match existing {
        Some(uid) => {
            debug!(uid = %uid, doc_uuid = %input.doc_uuid, "Reusing SLA of the user group");
            graph
                .slas
                .require_mut(&uid)?
                .merge(&SlaUpdate::from(input), MergePolicy::FullReplace);
            uid
        }
        None => {
            let sla = Sla {
                uid: new_uid(),
                description: input.description.clone(),
                doc_uuid: input.doc_uuid.clone(),
                start_date: input.start_date,
                end_date: input.end_date,
            };
            let uid = sla.uid.clone();
            debug!(uid = %uid, doc_uuid = %input.doc_uuid, user_group, "Creating SLA");
            graph.insert(sla);
            graph.user_group_slas.connect(user_group, &uid);
            uid
        }
    };
    graph.sla_projects.connect(&uid, project);
    Ok(uid)
}

/// Replace SLA attributes and move its provider-local project to the input one
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &SlaCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let project = scope.project(&input.project)?.clone();
    let mut changed = graph
        .slas
        .require_mut(uid)?
        .merge(&SlaUpdate::from(&input.base), MergePolicy::FullReplace);

    if !graph.sla_projects.is_connected(uid, &project) {
        for old in graph.sla_projects.targets(uid) {
            if scope.owns(&old) {
                graph.sla_projects.disconnect(uid, &old);
            }
        }
        release_project(graph, &project)?;
        graph.sla_projects.connect(uid, &project);
        debug!(uid, project = %input.project, "SLA moved to a new project");
        changed = true;
    }
    Ok(changed)
}

pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    debug!(uid, "Deleting SLA");
    graph
        .delete::<Sla>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Sla::KIND, uid))
}
