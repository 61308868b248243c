//! Identity provider reconciliation
//!
//! Identity providers are shared: they are resolved by endpoint, reused by
//! every provider trusting them and deleted only when the last provider goes.

use crate::scope::ProviderScope;
use crate::user_group;
use fedreg_core::prelude::*;
use fedreg_schema::{IdentityProviderCreateExtended, IdentityProviderUpdate, Merge, MergePolicy};
use fedreg_store::Graph;
use std::collections::HashMap;
use tracing::{debug, info};

/// Identity provider with the given endpoint, anywhere in the graph
pub(crate) fn find_by_endpoint(graph: &Graph, endpoint: &str) -> Option<Uid> {
    graph
        .identity_providers
        .values()
        .find(|idp| idp.endpoint == endpoint)
        .map(|idp| idp.uid.clone())
}

/// Connect an identity provider to the provider, creating it when no
/// identity provider with the same endpoint exists.
pub(crate) fn attach(
    graph: &mut Graph,
    input: &IdentityProviderCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    if let Some(uid) = find_by_endpoint(graph, &input.base.endpoint) {
        info!(uid = %uid, endpoint = %input.base.endpoint, provider = %scope.provider, "Reusing shared identity provider");
        graph
            .auth_methods
            .connect_with(&scope.provider, &uid, input.relationship.clone());
        update(graph, &uid, input, scope)?;
        return Ok(uid);
    }

    let base = &input.base;
    let idp = IdentityProvider {
        uid: new_uid(),
        description: base.description.clone(),
        endpoint: base.endpoint.clone(),
        group_claim: base.group_claim.clone(),
    };
    let uid = idp.uid.clone();
    debug!(uid = %uid, endpoint = %base.endpoint, "Creating identity provider");

    graph.insert(idp);
    graph
        .auth_methods
        .connect_with(&scope.provider, &uid, input.relationship.clone());
    for group in &input.user_groups {
        user_group::create(graph, &uid, group, scope)?;
    }
    Ok(uid)
}

/// Replace identity provider attributes, the provider's authentication method
/// and the user groups granted access to the provider.
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &IdentityProviderCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = graph
        .identity_providers
        .require_mut(uid)?
        .merge(&IdentityProviderUpdate::from(&input.base), MergePolicy::FullReplace);

    match graph.auth_methods.props_mut(&scope.provider, uid) {
        Some(auth) if *auth != input.relationship => {
            *auth = input.relationship.clone();
            changed = true;
        }
        Some(_) => {}
        None => {
            graph
                .auth_methods
                .connect_with(&scope.provider, uid, input.relationship.clone());
            changed = true;
        }
    }

    let mut existing: HashMap<String, Uid> = graph
        .idp_user_groups
        .targets(uid)
        .into_iter()
        .filter_map(|g| graph.user_groups.get(&g).map(|ug| (ug.name.clone(), g)))
        .collect();

    for group in &input.user_groups {
        match existing.remove(&group.base.name) {
            Some(group_uid) => changed |= user_group::update(graph, &group_uid, group, scope)?,
            None => {
                user_group::create(graph, uid, group, scope)?;
                changed = true;
            }
        }
    }
    // Groups not listed any more: only their ties to this provider are dropped.
    for group_uid in existing.into_values() {
        changed |= user_group::release(graph, &group_uid, scope)?;
    }
    Ok(changed)
}

/// Disconnect the provider from a shared identity provider, dropping the
/// provider's SLAs and the user groups left without any SLA.
pub(crate) fn disconnect(graph: &mut Graph, uid: &str, scope: &ProviderScope) -> Result<()> {
    info!(uid, provider = %scope.provider, "Disconnecting shared identity provider");
    graph.auth_methods.disconnect(&scope.provider, uid);
    for group_uid in graph.idp_user_groups.targets(uid) {
        user_group::release(graph, &group_uid, scope)?;
    }
    Ok(())
}

/// Drop the provider's reference: delete the identity provider when this was
/// the last one, disconnect it otherwise.
pub(crate) fn release(graph: &mut Graph, uid: &str, scope: &ProviderScope) -> Result<()> {
    if graph.auth_methods.sources(uid).len() <= 1 {
        remove(graph, uid)
    } else {
        disconnect(graph, uid, scope)
    }
}

/// Delete an identity provider with its user groups
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    for group_uid in graph.idp_user_groups.targets(uid) {
        user_group::remove(graph, &group_uid)?;
    }
    info!(uid, "Deleting identity provider");
    graph
        .delete::<IdentityProvider>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(IdentityProvider::KIND, uid))
}
