//! Network reconciliation. Networks are owned by a single service.

use crate::scope::ProviderScope;
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, NetworkCreateExtended, NetworkUpdate};
use fedreg_store::Graph;
use tracing::debug;

pub(crate) fn create(
    graph: &mut Graph,
    service: &str,
    input: &NetworkCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let project = input
        .project
        .as_deref()
        .map(|uuid| scope.project(uuid).cloned())
        .transpose()?;

    let base = &input.base;
    let network = Network {
        uid: new_uid(),
        description: base.description.clone(),
        name: base.name.clone(),
        uuid: base.uuid.clone(),
        is_shared: base.is_shared,
        is_router_external: base.is_router_external,
        is_default: base.is_default,
        mtu: base.mtu,
        proxy_host: base.proxy_host.clone(),
        proxy_user: base.proxy_user.clone(),
        tags: base.tags.clone(),
    };
    let uid = network.uid.clone();
    debug!(uid = %uid, uuid = %base.uuid, service, "Creating network");

    graph.insert(network);
    graph.service_networks.connect(service, &uid);
    if let Some(project) = project {
        graph.network_project.connect(&uid, &project);
    }
    Ok(uid)
}

pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &NetworkCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let project = input
        .project
        .as_deref()
        .map(|uuid| scope.project(uuid).cloned())
        .transpose()?;

    let mut changed = graph
        .networks
        .require_mut(uid)?
        .merge(&NetworkUpdate::from(&input.base), MergePolicy::FullReplace);

    let current = graph.network_project.single_target(uid);
    if current != project {
        debug!(uid, "Network owner project changed");
        if let Some(old) = current {
            graph.network_project.disconnect(uid, &old);
        }
        if let Some(new) = project {
            graph.network_project.connect(uid, &new);
        }
        changed = true;
    }
    Ok(changed)
}

pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    debug!(uid, "Deleting network");
    graph
        .delete::<Network>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Network::KIND, uid))
}
