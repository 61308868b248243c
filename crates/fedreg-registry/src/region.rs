//! Region reconciliation

use crate::scope::ProviderScope;
use crate::{location, service};
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, RegionCreateExtended, RegionUpdate};
use fedreg_store::Graph;
use std::collections::HashMap;
use tracing::debug;

pub(crate) fn create(
    graph: &mut Graph,
    input: &RegionCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let base = &input.base;
    let region = Region {
        uid: new_uid(),
        description: base.description.clone(),
        name: base.name.clone(),
        overbooking_cpu: base.overbooking_cpu,
        overbooking_ram: base.overbooking_ram,
        bandwidth_in: base.bandwidth_in,
        bandwidth_out: base.bandwidth_out,
    };
    let uid = region.uid.clone();
    debug!(uid = %uid, name = %base.name, provider = %scope.provider, "Creating region");

    graph.insert(region);
    graph.provider_regions.connect(&scope.provider, &uid);
    if let Some(loc) = &input.location {
        location::attach(graph, &uid, loc)?;
    }
    for item in input.services() {
        service::create(graph, &uid, item, scope)?;
    }
    Ok(uid)
}

/// Replace region attributes, its location and its services (matched by
/// type and endpoint).
pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &RegionCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let mut changed = graph
        .regions
        .require_mut(uid)?
        .merge(&RegionUpdate::from(&input.base), MergePolicy::FullReplace);
    changed |= location::update(graph, uid, input.location.as_ref())?;

    let mut existing: HashMap<(ServiceType, String), Uid> = graph
        .region_services
        .targets(uid)
        .into_iter()
        .filter_map(|s| {
            graph
                .services
                .get(&s)
                .map(|svc| ((svc.service_type, svc.endpoint.clone()), s))
        })
        .collect();

    for item in input.services() {
        let key = (item.service_type(), item.base.endpoint.clone());
        match existing.remove(&key) {
            Some(service_uid) => changed |= service::update(graph, &service_uid, item, scope)?,
            None => {
                service::create(graph, uid, item, scope)?;
                changed = true;
            }
        }
    }
    for service_uid in existing.into_values() {
        service::remove(graph, &service_uid)?;
        changed = true;
    }
    Ok(changed)
}

/// Delete a region with its services; the location goes only with its last region
pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    for service_uid in graph.region_services.targets(uid) {
        service::remove(graph, &service_uid)?;
    }
    if let Some(loc) = graph.region_location.single_target(uid) {
        location::detach(graph, uid, &loc)?;
    }
    debug!(uid, "Deleting region");
    graph
        .delete::<Region>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Region::KIND, uid))
}
