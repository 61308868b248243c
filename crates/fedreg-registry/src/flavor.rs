//! Flavor reconciliation
//!
//! A flavor is shared among the compute services of one provider: attaching a
//! flavor whose uuid already exists in the provider reuses it.

use crate::scope::{provider_services, sync_targets, ProviderScope};
use fedreg_core::prelude::*;
use fedreg_schema::{FlavorCreateExtended, FlavorUpdate, Merge, MergePolicy};
use fedreg_store::Graph;
use tracing::debug;

/// Flavor with the given uuid already linked to a service of the provider
fn find_in_provider(graph: &Graph, provider: &str, uuid: &str) -> Option<Uid> {
    provider_services(graph, provider)
        .iter()
        .flat_map(|service| graph.service_flavors.targets(service))
        .find(|uid| graph.flavors.get(uid).is_some_and(|f| f.uuid == uuid))
}

/// Connect a flavor to `service`, reusing the provider's flavor with the same
/// uuid when there is one. Returns `true` if the graph changed.
pub(crate) fn attach(
    graph: &mut Graph,
    service: &str,
    input: &FlavorCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    match find_in_provider(graph, &scope.provider, &input.base.uuid) {
        Some(uid) => {
            debug!(uid = %uid, uuid = %input.base.uuid, service, "Reusing flavor");
            let changed = update(graph, &uid, input, scope)?;
            Ok(graph.service_flavors.connect(service, &uid) || changed)
        }
        None => {
            create(graph, service, input, scope)?;
            Ok(true)
        }
    }
}

fn create(
    graph: &mut Graph,
    service: &str,
    input: &FlavorCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let projects = scope.projects(&input.projects)?;
    let base = &input.base;
    let flavor = Flavor {
        uid: new_uid(),
        description: base.description.clone(),
        name: base.name.clone(),
        uuid: base.uuid.clone(),
        disk: base.disk,
        is_public: base.is_public,
        ram: base.ram,
        vcpus: base.vcpus,
        swap: base.swap,
        ephemeral: base.ephemeral,
        infiniband: base.infiniband,
        gpus: base.gpus,
        gpu_model: base.gpu_model.clone(),
        gpu_vendor: base.gpu_vendor.clone(),
        local_storage: base.local_storage.clone(),
    };
    let uid = flavor.uid.clone();
    debug!(uid = %uid, uuid = %base.uuid, service, "Creating flavor");

    graph.insert(flavor);
    graph.service_flavors.connect(service, &uid);
    for project in &projects {
        graph.flavor_projects.connect(&uid, project);
    }
    Ok(uid)
}

/// Replace flavor attributes and its provider-local project list
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &FlavorCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let projects = scope.projects(&input.projects)?;
    let changed = graph
        .flavors
        .require_mut(uid)?
        .merge(&FlavorUpdate::from(&input.base), MergePolicy::FullReplace);
    Ok(sync_targets(&mut graph.flavor_projects, uid, &projects, scope) || changed)
}

/// Drop a flavor from `service`: delete it when no other service uses it
pub(crate) fn detach(graph: &mut Graph, service: &str, uid: &str) -> Result<()> {
    if graph.service_flavors.sources(uid).len() <= 1 {
        remove(graph, uid)
    } else {
        debug!(uid, service, "Disconnecting shared flavor");
        graph.service_flavors.disconnect(service, uid);
        Ok(())
    }
}

pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    debug!(uid, "Deleting flavor");
    graph
        .delete::<Flavor>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Flavor::KIND, uid))
}
