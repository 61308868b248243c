//! Graph-level consistency checks run before a provider tree is written

use crate::identity_provider::find_by_endpoint;
use crate::location::find_by_site;
use crate::scope::{provider_of_region, provider_of_service};
use fedreg_core::prelude::*;
use fedreg_schema::{IdentityProviderCreate, LocationCreate, ProviderCreateExtended};
use fedreg_store::Graph;
use tracing::warn;

fn referenced_elsewhere(owners: &[Uid], provider: Option<&str>) -> bool {
    owners.iter().any(|owner| Some(owner.as_str()) != provider)
}

/// A provider is unique by name and type
pub(crate) fn provider_unique(
    graph: &Graph,
    name: &str,
    provider_type: ProviderType,
    exclude: Option<&str>,
) -> Result<()> {
    let clash = graph.providers.values().any(|p| {
        p.name == name && p.provider_type == provider_type && Some(p.uid.as_str()) != exclude
    });
    if clash {
        warn!(name, provider_type = %provider_type, "Duplicated provider");
        return Err(Error::bad_request(format!(
            "Provider with name '{name}' and type '{provider_type}' already exists"
        )));
    }
    Ok(())
}

/// An existing identity provider with the same endpoint must agree on the
/// group claim unless only `provider` references it.
pub(crate) fn identity_provider(
    graph: &Graph,
    input: &IdentityProviderCreate,
    provider: Option<&str>,
) -> Result<()> {
    let Some(uid) = find_by_endpoint(graph, &input.endpoint) else {
        return Ok(());
    };
    let existing = graph.identity_providers.require(&uid)?;
    let owners = graph.auth_methods.sources(&uid);
    if existing.group_claim != input.group_claim && referenced_elsewhere(&owners, provider) {
        warn!(endpoint = %input.endpoint, "Conflicting identity provider");
        return Err(Error::bad_request(format!(
            "Identity provider with endpoint '{}' already exists with group claim '{}'",
            input.endpoint, existing.group_claim
        )));
    }
    Ok(())
}

/// An existing location with the same site must agree on its attributes
/// unless only regions of `provider` reference it.
pub(crate) fn location(graph: &Graph, input: &LocationCreate, provider: Option<&str>) -> Result<()> {
    let Some(uid) = find_by_site(graph, &input.site) else {
        return Ok(());
    };
    let existing = graph.locations.require(&uid)?;
    let same = existing.country == input.country
        && existing.latitude == input.latitude
        && existing.longitude == input.longitude;
    let owners: Vec<Uid> = graph
        .region_location
        .sources(&uid)
        .iter()
        .filter_map(|region| provider_of_region(graph, region))
        .collect();
    if !same && referenced_elsewhere(&owners, provider) {
        warn!(site = %input.site, "Conflicting location");
        return Err(Error::bad_request(format!(
            "Location with site '{}' already exists with different attributes",
            input.site
        )));
    }
    Ok(())
}

/// A service endpoint belongs to one provider only
pub(crate) fn service_endpoint(graph: &Graph, endpoint: &str, provider: Option<&str>) -> Result<()> {
    let owners: Vec<Uid> = graph
        .services
        .values()
        .filter(|s| s.endpoint == endpoint)
        .filter_map(|s| provider_of_service(graph, &s.uid))
        .collect();
    if referenced_elsewhere(&owners, provider) {
        warn!(endpoint, "Service endpoint used by another provider");
        return Err(Error::bad_request(format!(
            "Service endpoint '{endpoint}' already belongs to another provider"
        )));
    }
    Ok(())
}

/// Every check for a whole provider tree. `provider` is the uid being
/// replaced, `None` on creation.
pub(crate) fn provider_tree(
    graph: &Graph,
    input: &ProviderCreateExtended,
    provider: Option<&str>,
) -> Result<()> {
    provider_unique(graph, &input.base.name, input.base.provider_type, provider)?;
    for idp in &input.identity_providers {
        identity_provider(graph, &idp.base, provider)?;
    }
    for region in &input.regions {
        if let Some(loc) = &region.location {
            location(graph, loc, provider)?;
        }
        for service in region.services() {
            service_endpoint(graph, &service.base.endpoint, provider)?;
        }
    }
    Ok(())
}
