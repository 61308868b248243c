//! Quota reconciliation

use crate::scope::ProviderScope;
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, QuotaCreateExtended, QuotaUpdate};
use fedreg_store::Graph;
use tracing::debug;

/// Natural key of a quota within its service
pub(crate) type QuotaKey = (Uid, bool, bool);

/// Key of a stored quota: (project uid, per_user, usage)
pub(crate) fn key(graph: &Graph, uid: &str) -> Option<QuotaKey> {
    let quota = graph.quotas.get(uid)?;
    let project = graph.quota_project.single_target(uid)?;
    Some((project, quota.per_user, quota.usage))
}

/// Create a quota on `service` for the project named in the input
pub(crate) fn create(
    graph: &mut Graph,
    service: &str,
    input: &QuotaCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let project = scope.project(&input.project)?.clone();
    let quota = Quota {
        uid: new_uid(),
        description: input.description.clone(),
        per_user: input.per_user,
        usage: input.usage,
        limits: input.limits.clone(),
    };
    let uid = quota.uid.clone();
    debug!(uid = %uid, service, project = %input.project, quota_type = %input.limits.quota_type(), "Creating quota");

    graph.insert(quota);
    graph.service_quotas.connect(service, &uid);
    graph.quota_project.connect(&uid, &project);
    Ok(uid)
}

/// Replace quota attributes and make sure it points to the input project
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &QuotaCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let project = scope.project(&input.project)?.clone();
    let mut changed = graph
        .quotas
        .require_mut(uid)?
        .merge(&QuotaUpdate::from(input), MergePolicy::FullReplace);

    if !graph.quota_project.is_connected(uid, &project) {
        debug!(uid, project = %input.project, "Reconnecting quota to a new project");
        for old in graph.quota_project.targets(uid) {
            graph.quota_project.disconnect(uid, &old);
        }
        graph.quota_project.connect(uid, &project);
        changed = true;
    }
    Ok(changed)
}

/// Delete a quota
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    debug!(uid, "Deleting quota");
    graph
        .delete::<Quota>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Quota::KIND, uid))
}
