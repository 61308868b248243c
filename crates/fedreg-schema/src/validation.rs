//! Input validation
//!
//! Runs on deserialized input before any write. Duplicate natural keys are
//! reported as [`Error::BadRequest`]; every other violation as
//! [`Error::Validation`].

use crate::create::*;
use crate::update::*;
use fedreg_core::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid e-mail regex")
});

/// Input that can be checked before it reaches the store
pub trait Validate {
    /// Check the input, returning the first violation found
    fn validate(&self) -> Result<()>;
}

/// Reject the first value appearing twice in `items`
pub fn find_duplicates<'a>(items: impl IntoIterator<Item = &'a str>, attr: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(Error::bad_request(format!(
                "There are multiple items with identical {attr}: {item}"
            )));
        }
    }
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(Error::validation(format!("Invalid e-mail address: {email}")))
    }
}

fn check_url(endpoint: &str) -> Result<()> {
    match url::Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err(Error::validation(format!("Invalid URL: {endpoint}"))),
    }
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::validation(format!(
                "Latitude {lat} out of range [-90, 90]"
            )));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::validation(format!(
                "Longitude {lon} out of range [-180, 180]"
            )));
        }
    }
    Ok(())
}

fn check_dates(start: &chrono::NaiveDate, end: &chrono::NaiveDate) -> Result<()> {
    if start < end {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Start date {start} should be lower than end date {end}"
        )))
    }
}

fn check_lower_bound(name: &str, value: Option<i64>, min: i64) -> Result<()> {
    match value {
        Some(v) if v < min => Err(Error::validation(format!(
            "Field '{name}' must be greater than or equal to {min}"
        ))),
        _ => Ok(()),
    }
}

fn check_mtu(mtu: Option<u32>) -> Result<()> {
    match mtu {
        Some(0) => Err(Error::validation("Field 'mtu' must be greater than 0")),
        _ => Ok(()),
    }
}

fn check_in_provider(project: &str, provider_projects: &HashSet<&str>, owner: &str) -> Result<()> {
    if provider_projects.contains(project) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{owner} refers to project {project} which is not in the provider's project list"
        )))
    }
}

fn check_limits(limits: &QuotaLimits) -> Result<()> {
    match limits {
        QuotaLimits::BlockStorage {
            gigabytes,
            per_volume_gigabytes,
            volumes,
        } => {
            check_lower_bound("gigabytes", *gigabytes, -1)?;
            check_lower_bound("per_volume_gigabytes", *per_volume_gigabytes, -1)?;
            check_lower_bound("volumes", *volumes, -1)
        }
        QuotaLimits::Compute {
            cores,
            instances,
            ram,
        } => {
            check_lower_bound("cores", *cores, 0)?;
            check_lower_bound("instances", *instances, 0)?;
            check_lower_bound("ram", *ram, 0)
        }
        QuotaLimits::Network {
            public_ips,
            networks,
            ports,
            security_groups,
            security_group_rules,
        } => {
            check_lower_bound("public_ips", *public_ips, -1)?;
            check_lower_bound("networks", *networks, -1)?;
            check_lower_bound("ports", *ports, -1)?;
            check_lower_bound("security_groups", *security_groups, -1)?;
            check_lower_bound("security_group_rules", *security_group_rules, -1)
        }
        QuotaLimits::ObjectStore {
            bytes,
            containers,
            objects,
        } => {
            check_lower_bound("bytes", Some(*bytes), -1)?;
            check_lower_bound("containers", Some(*containers), -1)?;
            check_lower_bound("objects", Some(*objects), -1)
        }
    }
}

/// Visibility rule shared by flavors and images
fn check_visibility(kind: &str, uuid: &str, is_public: bool, projects: &[String]) -> Result<()> {
    if is_public && !projects.is_empty() {
        return Err(Error::validation(format!(
            "Public {kind} {uuid} should not have authorized projects"
        )));
    }
    if !is_public && projects.is_empty() {
        return Err(Error::validation(format!(
            "Private {kind} {uuid} needs at least one authorized project"
        )));
    }
    find_duplicates(projects.iter().map(String::as_str), "project")
}

impl Validate for ProviderCreateExtended {
    fn validate(&self) -> Result<()> {
        for email in &self.base.support_emails {
            check_email(email)?;
        }
        find_duplicates(self.projects.iter().map(|p| p.uuid.as_str()), "uuid")?;
        find_duplicates(self.projects.iter().map(|p| p.name.as_str()), "name")?;
        find_duplicates(
            self.identity_providers.iter().map(|i| i.base.endpoint.as_str()),
            "endpoint",
        )?;
        find_duplicates(self.regions.iter().map(|r| r.base.name.as_str()), "name")?;

        let projects: HashSet<&str> = self.projects.iter().map(|p| p.uuid.as_str()).collect();

        // An SLA document and an SLA project belong to one user group only.
        let mut sla_docs: HashMap<&str, (&str, &str)> = HashMap::new();
        let mut sla_projects: HashMap<&str, (&str, &str)> = HashMap::new();
        for idp in &self.identity_providers {
            idp.validate()?;
            for group in &idp.user_groups {
                let sla = &group.sla;
                check_in_provider(&sla.project, &projects, "SLA")?;
                let owner = (idp.base.endpoint.as_str(), group.base.name.as_str());
                if let Some(prev) = sla_docs.insert(sla.base.doc_uuid.as_str(), owner) {
                    if prev != owner {
                        return Err(Error::bad_request(format!(
                            "SLA {} is used by multiple user groups",
                            sla.base.doc_uuid
                        )));
                    }
                }
                if let Some(prev) = sla_projects.insert(sla.project.as_str(), owner) {
                    if prev != owner {
                        return Err(Error::bad_request(format!(
                            "Project {} is used by multiple SLAs",
                            sla.project
                        )));
                    }
                }
            }
        }

        let mut sites: HashMap<&str, &LocationCreate> = HashMap::new();
        for region in &self.regions {
            region.validate()?;
            region.validate_projects(&projects)?;
            if let Some(location) = &region.location {
                if let Some(prev) = sites.insert(location.site.as_str(), location) {
                    if prev != location {
                        return Err(Error::bad_request(format!(
                            "Location {} is defined with different attributes in multiple regions",
                            location.site
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Validate for IdentityProviderCreateExtended {
    fn validate(&self) -> Result<()> {
        check_url(&self.base.endpoint)?;
        if self.user_groups.is_empty() {
            return Err(Error::validation(format!(
                "Identity provider {} needs at least one user group",
                self.base.endpoint
            )));
        }
        find_duplicates(self.user_groups.iter().map(|g| g.base.name.as_str()), "name")?;
        for group in &self.user_groups {
            check_dates(&group.sla.base.start_date, &group.sla.base.end_date)?;
        }
        Ok(())
    }
}

impl RegionCreateExtended {
    /// Check that every project referenced by the region's services belongs to
    /// the provider.
    pub fn validate_projects(&self, projects: &HashSet<&str>) -> Result<()> {
        for service in self.services() {
            for quota in &service.quotas {
                check_in_provider(&quota.project, projects, "Quota")?;
            }
            for flavor in &service.flavors {
                for project in &flavor.projects {
                    check_in_provider(project, projects, "Flavor")?;
                }
            }
            for image in &service.images {
                for project in &image.projects {
                    check_in_provider(project, projects, "Image")?;
                }
            }
            for network in &service.networks {
                if let Some(project) = &network.project {
                    check_in_provider(project, projects, "Network")?;
                }
            }
        }
        Ok(())
    }
}

impl Validate for RegionCreateExtended {
    fn validate(&self) -> Result<()> {
        if let Some(location) = &self.location {
            check_coordinates(location.latitude, location.longitude)?;
        }
        for (service_type, services) in self.services_by_type() {
            find_duplicates(services.iter().map(|s| s.base.endpoint.as_str()), "endpoint")?;
            for service in services {
                if service.service_type() != service_type {
                    return Err(Error::validation(format!(
                        "Service {} named {} listed among {service_type} services",
                        service.base.endpoint, service.base.name
                    )));
                }
                service.validate()?;
            }
        }
        Ok(())
    }
}

impl Validate for ServiceCreateExtended {
    fn validate(&self) -> Result<()> {
        check_url(&self.base.endpoint)?;
        let service_type = self.service_type();

        if service_type != ServiceType::Compute && (!self.flavors.is_empty() || !self.images.is_empty()) {
            return Err(Error::validation(format!(
                "Only compute services have flavors and images, {} is {service_type}",
                self.base.endpoint
            )));
        }
        if service_type != ServiceType::Network && !self.networks.is_empty() {
            return Err(Error::validation(format!(
                "Only networking services have networks, {} is {service_type}",
                self.base.endpoint
            )));
        }

        let mut quota_keys = HashSet::new();
        for quota in &self.quotas {
            if quota.limits.quota_type() != service_type {
                return Err(Error::validation(format!(
                    "Quota of type {} does not match {service_type} service {}",
                    quota.limits.quota_type(),
                    self.base.endpoint
                )));
            }
            check_limits(&quota.limits)?;
            if !quota_keys.insert((quota.project.as_str(), quota.per_user, quota.usage)) {
                let kind = match (quota.per_user, quota.usage) {
                    (_, true) => "usage",
                    (true, false) => "per-user",
                    (false, false) => "project",
                };
                return Err(Error::bad_request(format!(
                    "Multiple {kind} quotas on the same project {}",
                    quota.project
                )));
            }
        }

        find_duplicates(self.flavors.iter().map(|f| f.base.uuid.as_str()), "uuid")?;
        find_duplicates(self.flavors.iter().map(|f| f.base.name.as_str()), "name")?;
        for flavor in &self.flavors {
            check_visibility("flavor", &flavor.base.uuid, flavor.base.is_public, &flavor.projects)?;
        }

        find_duplicates(self.images.iter().map(|i| i.base.uuid.as_str()), "uuid")?;
        find_duplicates(self.images.iter().map(|i| i.base.name.as_str()), "name")?;
        for image in &self.images {
            check_visibility("image", &image.base.uuid, image.base.is_public, &image.projects)?;
        }

        find_duplicates(self.networks.iter().map(|n| n.base.uuid.as_str()), "uuid")?;
        for network in &self.networks {
            check_mtu(network.base.mtu)?;
            match (network.base.is_shared, &network.project) {
                (true, Some(_)) => {
                    return Err(Error::validation(format!(
                        "Shared network {} should not have an owner project",
                        network.base.uuid
                    )))
                }
                (false, None) => {
                    return Err(Error::validation(format!(
                        "Private network {} needs an owner project",
                        network.base.uuid
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Validate for ProviderUpdate {
    fn validate(&self) -> Result<()> {
        for email in self.support_emails.iter().flatten() {
            check_email(email)?;
        }
        Ok(())
    }
}

impl Validate for ProjectUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for IdentityProviderUpdate {
    fn validate(&self) -> Result<()> {
        match &self.endpoint {
            Some(endpoint) => check_url(endpoint),
            None => Ok(()),
        }
    }
}

impl Validate for UserGroupUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for SlaUpdate {
    fn validate(&self) -> Result<()> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => check_dates(start, end),
            _ => Ok(()),
        }
    }
}

impl Validate for RegionUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for LocationUpdate {
    fn validate(&self) -> Result<()> {
        check_coordinates(self.latitude, self.longitude)
    }
}

impl Validate for ServiceUpdate {
    fn validate(&self) -> Result<()> {
        match &self.endpoint {
            Some(endpoint) => check_url(endpoint),
            None => Ok(()),
        }
    }
}

impl Validate for QuotaUpdate {
    fn validate(&self) -> Result<()> {
        check_lower_bound("gigabytes", self.gigabytes, -1)?;
        check_lower_bound("per_volume_gigabytes", self.per_volume_gigabytes, -1)?;
        check_lower_bound("volumes", self.volumes, -1)?;
        check_lower_bound("cores", self.cores, 0)?;
        check_lower_bound("instances", self.instances, 0)?;
        check_lower_bound("ram", self.ram, 0)?;
        check_lower_bound("public_ips", self.public_ips, -1)?;
        check_lower_bound("networks", self.networks, -1)?;
        check_lower_bound("ports", self.ports, -1)?;
        check_lower_bound("security_groups", self.security_groups, -1)?;
        check_lower_bound("security_group_rules", self.security_group_rules, -1)?;
        check_lower_bound("bytes", self.bytes, -1)?;
        check_lower_bound("containers", self.containers, -1)?;
        check_lower_bound("objects", self.objects, -1)
    }
}

impl Validate for FlavorUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for ImageUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for NetworkUpdate {
    fn validate(&self) -> Result<()> {
        check_mtu(self.mtu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn provider(body: Value) -> ProviderCreateExtended {
        serde_json::from_value(body).unwrap()
    }

    fn idp(endpoint: &str, group: &str, doc: &str, project: &str) -> Value {
        json!({
            "endpoint": endpoint,
            "group_claim": "groups",
            "relationship": {"idp_name": "egi", "protocol": "openid"},
            "user_groups": [{
                "name": group,
                "sla": {
                    "doc_uuid": doc,
                    "start_date": "2024-01-01",
                    "end_date": "2025-01-01",
                    "project": project,
                }
            }]
        })
    }

    #[test]
    fn test_valid_provider_tree() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "support_emails": ["admin@cloud.example.org"],
            "projects": [{"name": "p1", "uuid": "u1"}],
            "identity_providers": [idp("https://idp.example.org", "g1", "d1", "u1")],
            "regions": [{
                "name": "RegionOne",
                "location": {"site": "bari", "country": "Italy", "latitude": 41.1},
                "compute_services": [{
                    "endpoint": "https://nova.example.org",
                    "name": "org.openstack.nova",
                    "quotas": [{"type": "compute", "project": "u1", "cores": 8}],
                    "flavors": [{"name": "small", "uuid": "f1", "is_public": false, "projects": ["u1"]}],
                }],
            }],
        }));
        p.validate().unwrap();
    }

    #[test]
    fn test_duplicate_project_uuid_is_bad_request() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "projects": [{"name": "a", "uuid": "u1"}, {"name": "b", "uuid": "u1"}],
        }));
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert!(err.to_string().contains("u1"));
    }

    #[test]
    fn test_invalid_email() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "support_emails": ["not-an-email"],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn test_sla_project_must_belong_to_provider() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "projects": [{"name": "a", "uuid": "u1"}],
            "identity_providers": [idp("https://idp.example.org", "g1", "d1", "missing")],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn test_sla_shared_between_groups_rejected() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "projects": [{"name": "a", "uuid": "u1"}, {"name": "b", "uuid": "u2"}],
            "identity_providers": [
                idp("https://idp1.example.org", "g1", "d1", "u1"),
                idp("https://idp2.example.org", "g2", "d1", "u2"),
            ],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::BadRequest(_)));
    }

    #[test]
    fn test_service_name_must_match_list() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "regions": [{
                "name": "RegionOne",
                "block_storage_services": [{
                    "endpoint": "https://nova.example.org",
                    "name": "org.openstack.nova",
                }],
            }],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn test_multiple_project_quotas_rejected() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "projects": [{"name": "a", "uuid": "u1"}],
            "regions": [{
                "name": "RegionOne",
                "compute_services": [{
                    "endpoint": "https://nova.example.org",
                    "name": "org.openstack.nova",
                    "quotas": [
                        {"type": "compute", "project": "u1", "cores": 1},
                        {"type": "compute", "project": "u1", "cores": 2},
                    ],
                }],
            }],
        }));
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert!(err.to_string().contains("project quotas"));
    }

    #[test]
    fn test_private_flavor_needs_projects() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "regions": [{
                "name": "RegionOne",
                "compute_services": [{
                    "endpoint": "https://nova.example.org",
                    "name": "org.openstack.nova",
                    "flavors": [{"name": "small", "uuid": "f1", "is_public": false}],
                }],
            }],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn test_conflicting_location_across_regions() {
        let p = provider(json!({
            "name": "cloud",
            "type": "openstack",
            "regions": [
                {"name": "r1", "location": {"site": "bari", "country": "Italy"}},
                {"name": "r2", "location": {"site": "bari", "country": "Spain"}},
            ],
        }));
        assert!(matches!(p.validate().unwrap_err(), Error::BadRequest(_)));
    }

    #[test]
    fn test_update_checks() {
        let loc = LocationUpdate {
            latitude: Some(95.0),
            ..Default::default()
        };
        assert!(loc.validate().is_err());

        let net = NetworkUpdate {
            mtu: Some(0),
            ..Default::default()
        };
        assert!(net.validate().is_err());

        let idp = IdentityProviderUpdate {
            endpoint: Some("ftp://idp.example.org".to_string()),
            ..Default::default()
        };
        assert!(idp.validate().is_err());
    }
}
