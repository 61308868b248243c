//! Image reconciliation. Images are shared like flavors.

use crate::scope::{provider_services, sync_targets, ProviderScope};
use fedreg_core::prelude::*;
use fedreg_schema::{ImageCreateExtended, ImageUpdate, Merge, MergePolicy};
use fedreg_store::Graph;
use tracing::debug;

fn find_in_provider(graph: &Graph, provider: &str, uuid: &str) -> Option<Uid> {
    provider_services(graph, provider)
        .iter()
        .flat_map(|service| graph.service_images.targets(service))
        .find(|uid| graph.images.get(uid).is_some_and(|i| i.uuid == uuid))
}

pub(crate) fn attach(
    graph: &mut Graph,
    service: &str,
    input: &ImageCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    match find_in_provider(graph, &scope.provider, &input.base.uuid) {
        Some(uid) => {
            debug!(uid = %uid, uuid = %input.base.uuid, service, "Reusing image");
            let changed = update(graph, &uid, input, scope)?;
            Ok(graph.service_images.connect(service, &uid) || changed)
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
    input: &ImageCreateExtended,
    scope: &ProviderScope,
) -> Result<Uid> {
    let projects = scope.projects(&input.projects)?;
    let base = &input.base;
    let image = Image {
        uid: new_uid(),
        description: base.description.clone(),
        name: base.name.clone(),
        uuid: base.uuid.clone(),
        os_type: base.os_type,
        os_distro: base.os_distro.clone(),
        os_version: base.os_version.clone(),
        architecture: base.architecture.clone(),
        kernel_id: base.kernel_id.clone(),
        cuda_support: base.cuda_support,
        gpu_driver: base.gpu_driver,
        is_public: base.is_public,
        tags: base.tags.clone(),
    };
    let uid = image.uid.clone();
    debug!(uid = %uid, uuid = %base.uuid, service, "Creating image");

    graph.insert(image);
    graph.service_images.connect(service, &uid);
    for project in &projects {
        graph.image_projects.connect(&uid, project);
    }
    Ok(uid)
}

pub(crate) fn update(
    graph: &mut Graph,
    uid: &str,
    input: &ImageCreateExtended,
    scope: &ProviderScope,
) -> Result<bool> {
    let projects = scope.projects(&input.projects)?;
    let changed = graph
        .images
        .require_mut(uid)?
        .merge(&ImageUpdate::from(&input.base), MergePolicy::FullReplace);
    Ok(sync_targets(&mut graph.image_projects, uid, &projects, scope) || changed)
}

pub(crate) fn detach(graph: &mut Graph, service: &str, uid: &str) -> Result<()> {
    if graph.service_images.sources(uid).len() <= 1 {
        remove(graph, uid)
    } else {
        debug!(uid, service, "Disconnecting shared image");
        graph.service_images.disconnect(service, uid);
        Ok(())
    }
}

pub(crate) fn remove(graph: &mut Graph, uid: &str) -> Result<()> {
    debug!(uid, "Deleting image");
    graph
        .delete::<Image>(uid)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(Image::KIND, uid))
}
