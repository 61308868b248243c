//! Service reconciliation: quotas, flavors, images and networks

use crate::scope::ProviderScope;
use crate::{flavor, image, network, quota};
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, ServiceCreateExtended, ServiceUpdate};
use fedreg_store::Graph;
use std::collections::HashMap;
use tracing::debug;

pub(crate) fn create(
    graph: &mut Graph,
    region: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let service = Service {
        uid: new_uid(),
        description: input.base.description.clone(),
        endpoint: input.base.endpoint.clone(),
        service_type: input.service_type(),
        name: input.base.name,
    };
    let uid = service.uid.clone();
    debug!(uid = %uid, endpoint = %input.base.endpoint, service_type = %service.service_type, region, "Creating service");

    graph.insert(service);
    graph.region_services.connect(region, &uid);
    for item in &input.quotas {
        quota::create(graph, &uid, item, scope)?;
    }
    for item in &input.flavors {
        flavor::attach(graph, &uid, item, scope)?;
    }
    for item in &input.images {
        image::attach(graph, &uid, item, scope)?;
    }
    for item in &input.networks {
        network::create(graph, &uid, item, scope)?;
    }
    Ok(uid)
}

/// Replace service attributes and reconcile its children
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = graph
        .services
        .require_mut(uid)?
        .merge(&ServiceUpdate::from(&input.base), MergePolicy::FullReplace);
    changed |= update_quotas(graph, uid, input, scope)?;
    changed |= update_flavors(graph, uid, input, scope)?;
    changed |= update_images(graph, uid, input, scope)?;
    changed |= update_networks(graph, uid, input, scope)?;
    Ok(changed)
}

fn update_quotas(
    graph: &mut Graph,
    uid: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<quota::QuotaKey, Uid> = graph
        .service_quotas
        .targets(uid)
        .into_iter()
        .filter_map(|q| quota::key(graph, &q).map(|k| (k, q)))
        .collect();

    for item in &input.quotas {
        let project = scope.project(&item.project)?.clone();
        match existing.remove(&(project, item.per_user, item.usage)) {
            Some(quota_uid) => changed |= quota::update(graph, &quota_uid, item, scope)?,
            None => {
                quota::create(graph, uid, item, scope)?;
                changed = true;
            }
        }
    }
    for quota_uid in existing.into_values() {
        quota::remove(graph, &quota_uid)?;
        changed = true;
    }
    Ok(changed)
}

fn update_flavors(
    graph: &mut Graph,
    uid: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<String, Uid> = graph
        .service_flavors
        .targets(uid)
        .into_iter()
        .filter_map(|f| graph.flavors.get(&f).map(|flv| (flv.uuid.clone(), f)))
        .collect();

    for item in &input.flavors {
        match existing.remove(&item.base.uuid) {
            Some(flavor_uid) => changed |= flavor::update(graph, &flavor_uid, item, scope)?,
            None => changed |= flavor::attach(graph, uid, item, scope)?,
        }
    }
    for flavor_uid in existing.into_values() {
        flavor::detach(graph, uid, &flavor_uid)?;
        changed = true;
    }
    Ok(changed)
}

fn update_images(
    graph: &mut Graph,
    uid: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<String, Uid> = graph
        .service_images
        .targets(uid)
        .into_iter()
        .filter_map(|i| graph.images.get(&i).map(|img| (img.uuid.clone(), i)))
        .collect();

    for item in &input.images {
        match existing.remove(&item.base.uuid) {
            Some(image_uid) => changed |= image::update(graph, &image_uid, item, scope)?,
            None => changed |= image::attach(graph, uid, item, scope)?,
        }
    }
    for image_uid in existing.into_values() {
        image::detach(graph, uid, &image_uid)?;
        changed = true;
    }
    Ok(changed)
}

fn update_networks(
    graph: &mut Graph,
    uid: &str,
    input: &ServiceCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = false;
    let mut existing: HashMap<String, Uid> = graph
        .service_networks
        .targets(uid)
        .into_iter()
        .filter_map(|n| graph.networks.get(&n).map(|net| (net.uuid.clone(), n)))
        .collect();

    for item in &input.networks {
        match existing.remove(&item.base.uuid) {
            Some(network_uid) => changed |= network::update(graph, &network_uid, item, scope)?,
            None => {
                network::create(graph, uid, item, scope)?;
                changed = true;
            }
        }
    }
    for network_uid in existing.into_values() {
        network::remove(graph, &network_uid)?;
        changed = true;
    }
    Ok(changed)
}

/// Delete a service with its quotas and networks; flavors and images are
/// deleted only when no other service uses them.
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    for quota_uid in graph.service_quotas.targets(uid) {
        quota::remove(graph, &quota_uid)?;
    }
    for flavor_uid in graph.service_flavors.targets(uid) {
        flavor::detach(graph, uid, &flavor_uid)?;
    }
    for image_uid in graph.service_images.targets(uid) {
        image::detach(graph, uid, &image_uid)?;
    }
    for network_uid in graph.service_networks.targets(uid) {
        network::remove(graph, &network_uid)?;
    }
    debug!(uid, "Deleting service");
    graph
        .delete::<Service>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Service::KIND, uid))
}
