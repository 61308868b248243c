//! Provider aggregate reconciliation
//!
//! The provider owns its projects and regions and references shared identity
//! providers. Creation and full replacement walk the whole nested tree;
//! children are matched by natural key and created, updated in place or
//! removed accordingly.

use crate::scope::ProviderScope;
use crate::{checks, identity_provider, project, region};
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, ProviderCreateExtended, ProviderUpdate};
use fedreg_store::Graph;
use std::collections::HashMap;
use tracing::info;

/// Create a provider with its whole tree. Returns the new uid.
pub(crate) fn create(graph: &mut Graph, input: &ProviderCreateExtended) -> Result<Uid> {
    checks::provider_tree(graph, input, None)?;

    let base = &input.base;
    let provider = Provider {
        uid: new_uid(),
        description: base.description.clone(),
        name: base.name.clone(),
        provider_type: base.provider_type,
        status: base.status,
        is_public: base.is_public,
        support_emails: base.support_emails.clone(),
    };
    let uid = provider.uid.clone();
    info!(uid = %uid, name = %base.name, provider_type = %base.provider_type, "Creating provider");
    graph.insert(provider);

    for item in &input.projects {
        project::create(graph, &uid, item);
    }
    let scope = ProviderScope::load(graph, &uid);
    for item in &input.identity_providers {
        identity_provider::attach(graph, item, &scope)?;
    }
    for item in &input.regions {
        region::create(graph, item, &scope)?;
    }
    Ok(uid)
}

/// Replace a provider with the input tree. Returns `true` if anything changed.
pub(crate) fn replace(graph: &mut Graph, uid: &str, input: &ProviderCreateExtended) -> Result<bool> {
    graph.providers.require(uid)?;
    checks::provider_tree(graph, input, Some(uid))?;

    let mut changed = graph
        .providers
        .require_mut(uid)?
        .merge(&ProviderUpdate::from(&input.base), MergePolicy::FullReplace);
    let leftovers = update_projects(graph, uid, input, &mut changed)?;

    // Project uids may have changed: resolve them again for the children.
    let scope = ProviderScope::load(graph, uid);
    changed |= update_identity_providers(graph, input, &scope)?;
    changed |= update_regions(graph, input, &scope)?;

    // Dropped projects go last: user groups losing their SLA toward this
    // provider are released through the identity providers first.
    for project_uid in leftovers {
        project::remove(graph, &project_uid)?;
        changed = true;
    }

    info!(uid, changed, "Provider replaced");
    Ok(changed)
}

/// Create and update the listed projects. Returns the uids of the projects
/// no longer listed, still connected.
fn update_projects(
    graph: &mut Graph,
    uid: &str,
    input: &ProviderCreateExtended,
    changed: &mut bool,
) -> Result<Vec<Uid>> {
    let mut existing: HashMap<String, Uid> = graph
        .provider_projects
        .targets(uid)
        .into_iter()
        .filter_map(|p| graph.projects.get(&p).map(|proj| (proj.uuid.clone(), p)))
        .collect();

    for item in &input.projects {
        match existing.remove(&item.uuid) {
            Some(project_uid) => *changed |= project::update(graph, &project_uid, item)?,
            None => {
                project::create(graph, uid, item);
                *changed = true;
            }
        }
    }
    Ok(existing.into_values().collect())
}

fn update_identity_providers(
    graph: &mut Graph,
    input: &ProviderCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<String, Uid> = graph
        .auth_methods
        .targets(&scope.provider)
        .into_iter()
        .filter_map(|i| {
            graph
                .identity_providers
                .get(&i)
                .map(|idp| (idp.endpoint.clone(), i))
        })
        .collect();

    for item in &input.identity_providers {
        match existing.remove(&item.base.endpoint) {
            Some(idp_uid) => changed |= identity_provider::update(graph, &idp_uid, item, scope)?,
            None => {
                identity_provider::attach(graph, item, scope)?;
                changed = true;
            }
        }
    }
    for idp_uid in existing.into_values() {
        identity_provider::release(graph, &idp_uid, scope)?;
        changed = true;
    }
    Ok(changed)
}

fn update_regions(
    graph: &mut Graph,
    input: &ProviderCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<String, Uid> = graph
        .provider_regions
        .targets(&scope.provider)
        .into_iter()
        .filter_map(|r| graph.regions.get(&r).map(|reg| (reg.name.clone(), r)))
        .collect();

    for item in &input.regions {
        match existing.remove(&item.base.name) {
            Some(region_uid) => changed |= region::update(graph, &region_uid, item, scope)?,
            None => {
                region::create(graph, item, scope)?;
                changed = true;
            }
        }
    }
    for region_uid in existing.into_values() {
        region::remove(graph, &region_uid)?;
        changed = true;
    }
    Ok(changed)
}

/// Delete a provider with everything it owns. Shared identity providers are
/// only disconnected while another provider still references them.
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    graph.providers.require(uid)?;
    let scope = ProviderScope::load(graph, uid);

    for idp_uid in graph.auth_methods.targets(uid) {
        identity_provider::release(graph, &idp_uid, &scope)?;
    }
    for project_uid in graph.provider_projects.targets(uid) {
        project::remove(graph, &project_uid)?;
    }
    for region_uid in graph.provider_regions.targets(uid) {
        region::remove(graph, &region_uid)?;
    }
    info!(uid, "Deleting provider");
    graph.delete::<Provider>(uid);
    Ok(())
}
