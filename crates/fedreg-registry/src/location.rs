//! Location reconciliation. Locations are shared among regions by site.

use fedreg_core::prelude::*;
use fedreg_schema::{LocationCreate, LocationUpdate, Merge, MergePolicy};
use fedreg_store::Graph;
use tracing::debug;

/// Location with the given site, anywhere in the graph
pub(crate) fn find_by_site(graph: &Graph, site: &str) -> Option<Uid> {
    graph
        .locations
        .values()
        .find(|loc| loc.site == site)
        .map(|loc| loc.uid.clone())
}

/// Connect `region` to the location of the input site, creating it if needed
pub(crate) fn attach(graph: &mut Graph, region: &str, input: &LocationCreate) -> Result<Uid> {
    let uid = match find_by_site(graph, &input.site) {
        Some(uid) => {
            debug!(uid = %uid, site = %input.site, region, "Reusing location");
            graph
                .locations
                .require_mut(&uid)?
                .merge(&LocationUpdate::from(input), MergePolicy::FullReplace);
            uid
        }
        None => {
            let location = Location {
                uid: new_uid(),
                description: input.description.clone(),
                site: input.site.clone(),
                country: input.country.clone(),
                latitude: input.latitude,
                longitude: input.longitude,
            };
            let uid = location.uid.clone();
            debug!(uid = %uid, site = %input.site, region, "Creating location");
            graph.insert(location);
            uid
        }
    };
    graph.region_location.connect(region, &uid);
    Ok(uid)
}

/// Drop `region`'s reference: the location is deleted with its last region
pub(crate) fn detach(graph: &mut Graph, region: &str, uid: &str) -> Result<()> {
    if graph.region_location.sources(uid).len() <= 1 {
        debug!(uid, "Deleting location");
        graph
            .delete::<Location>(uid)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(Location::KIND, uid))
    } else {
        debug!(uid, region, "Disconnecting shared location");
        graph.region_location.disconnect(region, uid);
        Ok(())
    }
}

/// Reconcile the location of `region` with the input one
pub(crate) fn update(graph: &mut Graph, region: &str, input: Option<&LocationCreate>) -> Result<bool> {
    let current = graph.region_location.single_target(region);
    let current_site = current
        .as_deref()
        .and_then(|uid| graph.locations.get(uid))
        .map(|loc| loc.site.clone());

    match (current, input) {
        (None, None) => Ok(false),
        (Some(uid), None) => {
            detach(graph, region, &uid)?;
            Ok(true)
        }
        (None, Some(input)) => {
            attach(graph, region, input)?;
            Ok(true)
        }
        (Some(uid), Some(input)) if current_site.as_deref() == Some(input.site.as_str()) => Ok(graph
            .locations
            .require_mut(&uid)?
            .merge(&LocationUpdate::from(input), MergePolicy::FullReplace)),
        (Some(uid), Some(input)) => {
            detach(graph, region, &uid)?;
            attach(graph, region, input)?;
            Ok(true)
        }
    }
}
