//! User group reconciliation

use crate::scope::ProviderScope;
use crate::sla;
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, UserGroupCreateExtended, UserGroupUpdate};
use fedreg_store::Graph;
use tracing::debug;

/// Create a user group under `identity_provider` with its SLA.
///
/// If the SLA's target project already has an SLA, that SLA is deleted when
/// it has no other project, otherwise the project is disconnected from it.
pub(crate) fn create(
    graph: &mut Graph,
    identity_provider: &str,
    input: &UserGroupCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let group = UserGroup {
        uid: new_uid(),
        description: input.base.description.clone(),
        name: input.base.name.clone(),
    };
    let uid = group.uid.clone();
    debug!(uid = %uid, name = %input.base.name, identity_provider, "Creating user group");

    graph.insert(group);
    graph.idp_user_groups.connect(identity_provider, &uid);
    attach_sla(graph, &uid, input, scope)?;
    Ok(uid)
}

fn attach_sla(
    graph: &mut Graph,
    uid: &str,
    input: &UserGroupCreateExtended,
    scope: &ProviderScope,
) -> Result<()> {
    let project = scope.project(&input.sla.project)?.clone();
    sla::release_project(graph, &project)?;
    sla::create(graph, uid, &project, &input.sla.base)?;
    Ok(())
}

/// SLAs of the group pointing to at least one project of the provider
pub(crate) fn slas_in_scope(graph: &Graph, uid: &str, scope: &ProviderScope) -> Vec<Uid> {
    graph
        .user_group_slas
        .targets(uid)
        .into_iter()
        .filter(|sla| {
            graph
                .sla_projects
                .targets(sla)
                .iter()
                .any(|p| scope.owns(p))
        })
        .collect()
}

/// Replace user group attributes and reconcile its SLA for this provider
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &UserGroupCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = graph
        .user_groups
        .require_mut(uid)?
        .merge(&UserGroupUpdate::from(&input.base), MergePolicy::FullReplace);

    match slas_in_scope(graph, uid, scope).into_iter().next() {
        Some(current) => {
            let same_doc = graph
                .slas
                .get(&current)
                .is_some_and(|s| s.doc_uuid == input.sla.base.doc_uuid);
            if same_doc {
                changed |= sla::update(graph, &current, &input.sla, scope)?;
            } else {
                debug!(uid, sla = %current, "User group SLA document changed");
                drop_provider_projects(graph, &current, scope)?;
                attach_sla(graph, uid, input, scope)?;
                changed = true;
            }
        }
        None => {
            attach_sla(graph, uid, input, scope)?;
            changed = true;
        }
    }
    Ok(changed)
}

/// Remove the provider's projects from an SLA, deleting the SLA when nothing
/// else is left.
pub(crate) fn drop_provider_projects(
    graph: &mut Graph,
    sla_uid: &str,
    scope: &ProviderScope,
) -> Result<()> {
    let projects = graph.sla_projects.targets(sla_uid);
    if projects.iter().all(|p| scope.owns(p)) {
        sla::remove(graph, sla_uid)
    } else {
        for project in projects.iter().filter(|p| scope.owns(p)) {
            graph.sla_projects.disconnect(sla_uid, project);
        }
        Ok(())
    }
}

/// Detach the provider from a user group it no longer lists: its SLAs toward
/// the provider go away and a group left without SLAs is deleted.
pub(crate) fn release(graph: &mut Graph, uid: &str, scope: &ProviderScope) -> Result<bool> {
    let slas = slas_in_scope(graph, uid, scope);
    if slas.is_empty() {
        return Ok(false);
    }
    for sla_uid in &slas {
        drop_provider_projects(graph, sla_uid, scope)?;
    }
    if graph.user_group_slas.targets(uid).is_empty() {
        remove(graph, uid)?;
    }
    Ok(true)
}

/// Delete a user group and its SLAs
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    for sla_uid in graph.user_group_slas.targets(uid) {
        sla::remove(graph, &sla_uid)?;
    }
    debug!(uid, "Deleting user group");
    graph
        .delete::<UserGroup>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(UserGroup::KIND, uid))
}
