//! Integration tests for provider tree reconciliation
//!
//! Every scenario drives the public `Registry` API and inspects the
//! resulting graph through generic reads and the store counters.

use fedreg_core::prelude::*;
use fedreg_registry::{ListParams, Registry, View};
use fedreg_schema::{ProviderCreateExtended, ProjectUpdate};
use serde_json::{json, Value};

fn tree(name: &str) -> Value {
    json!({
        "name": name,
        "type": "openstack",
        "support_emails": ["ops@example.org"],
        "projects": [{"name": "tenant", "uuid": "u1", "description": "first"}],
        "identity_providers": [{
            "endpoint": "https://idp.example.org",
            "group_claim": "groups",
            "relationship": {"idp_name": "egi", "protocol": "openid"},
            "user_groups": [{
                "name": "admins",
                "sla": {
                    "doc_uuid": format!("doc-{name}"),
                    "start_date": "2024-01-01",
                    "end_date": "2026-01-01",
                    "project": "u1"
                }
            }]
        }],
        "regions": [{
            "name": "RegionOne",
            "location": {"site": "bologna", "country": "Italy"},
            "compute_services": [{
                "endpoint": format!("https://{name}.example.org/compute"),
                "name": "org.openstack.nova",
                "quotas": [{"type": "compute", "project": "u1", "cores": 10}],
                "flavors": [{"name": "tiny", "uuid": format!("{name}-f1"), "vcpus": 1, "ram": 512}]
            }]
        }]
    })
}

fn input(value: Value) -> ProviderCreateExtended {
    serde_json::from_value(value).unwrap()
}

fn count(registry: &Registry, kind: &str) -> usize {
    registry.database().counts()[kind]
}

fn uids<R: fedreg_registry::Resource>(registry: &Registry) -> Vec<String> {
    let list = registry.list::<R>(&ListParams::default(), true).unwrap();
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["uid"].as_str().unwrap().to_string())
        .collect()
}

async fn create(registry: &Registry, value: Value) -> String {
    let created = registry.create_provider(input(value)).await.unwrap();
    created["uid"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_provider_delete_cascades_and_keeps_shared_identity_provider() {
    let registry = Registry::in_memory();
    let p1 = create(&registry, tree("alpha")).await;
    let p2 = create(&registry, tree("beta")).await;

    assert_eq!(count(&registry, "identity_providers"), 1);
    assert_eq!(count(&registry, "user_groups"), 1);
    assert_eq!(count(&registry, "slas"), 2);
    assert_eq!(count(&registry, "locations"), 1);

    registry.delete::<Provider>(&p1).await.unwrap();
    assert_eq!(count(&registry, "providers"), 1);
    assert_eq!(count(&registry, "projects"), 1);
    assert_eq!(count(&registry, "regions"), 1);
    assert_eq!(count(&registry, "services"), 1);
    assert_eq!(count(&registry, "flavors"), 1);
    assert_eq!(count(&registry, "quotas"), 1);
    // Shared nodes survive while another provider references them
    assert_eq!(count(&registry, "identity_providers"), 1);
    assert_eq!(count(&registry, "user_groups"), 1);
    assert_eq!(count(&registry, "slas"), 1);
    assert_eq!(count(&registry, "locations"), 1);

    registry.delete::<Provider>(&p2).await.unwrap();
    for (kind, n) in registry.database().counts() {
        assert_eq!(n, 0, "{kind} left behind");
    }
}

#[tokio::test]
async fn test_region_delete_keeps_shared_location() {
    let registry = Registry::in_memory();
    let mut value = tree("alpha");
    let mut second = value["regions"][0].clone();
    second["name"] = json!("RegionTwo");
    second["compute_services"][0]["endpoint"] = json!("https://alpha.example.org/compute2");
    value["regions"].as_array_mut().unwrap().push(second);
    create(&registry, value).await;

    assert_eq!(count(&registry, "regions"), 2);
    assert_eq!(count(&registry, "locations"), 1);

    let regions = uids::<Region>(&registry);
    registry.delete::<Region>(&regions[0]).await.unwrap();
    assert_eq!(count(&registry, "locations"), 1);

    registry.delete::<Region>(&regions[1]).await.unwrap();
    assert_eq!(count(&registry, "locations"), 0);
    assert_eq!(count(&registry, "services"), 0);
    assert_eq!(count(&registry, "flavors"), 0);
}

#[tokio::test]
async fn test_full_replace_with_unchanged_tree_is_not_modified() {
    let registry = Registry::in_memory();
    let uid = create(&registry, tree("alpha")).await;
    let before: Vec<Vec<String>> = vec![
        uids::<Project>(&registry),
        uids::<UserGroup>(&registry),
        uids::<Sla>(&registry),
        uids::<Region>(&registry),
        uids::<Service>(&registry),
        uids::<Quota>(&registry),
        uids::<Flavor>(&registry),
    ];

    let replaced = registry.replace_provider(&uid, input(tree("alpha"))).await.unwrap();
    assert!(replaced.is_none());

    let after: Vec<Vec<String>> = vec![
        uids::<Project>(&registry),
        uids::<UserGroup>(&registry),
        uids::<Sla>(&registry),
        uids::<Region>(&registry),
        uids::<Service>(&registry),
        uids::<Quota>(&registry),
        uids::<Flavor>(&registry),
    ];
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_full_replace_updates_child_in_place() {
    let registry = Registry::in_memory();
    let uid = create(&registry, tree("alpha")).await;
    let flavor = uids::<Flavor>(&registry).remove(0);

    let mut value = tree("alpha");
    value["regions"][0]["compute_services"][0]["flavors"][0]["ram"] = json!(1024);
    let replaced = registry.replace_provider(&uid, input(value)).await.unwrap().unwrap();
    assert_eq!(
        replaced["regions"][0]["compute_services"][0]["flavors"][0]["ram"],
        1024
    );
    assert_eq!(uids::<Flavor>(&registry), vec![flavor]);
}

#[tokio::test]
async fn test_full_replace_updates_project_description_in_place() {
    let registry = Registry::in_memory();
    let uid = create(&registry, tree("alpha")).await;
    let project = uids::<Project>(&registry).remove(0);

    let mut value = tree("alpha");
    value["projects"][0]["description"] = json!("renamed tenant");
    let replaced = registry.replace_provider(&uid, input(value)).await.unwrap().unwrap();

    let projects = replaced["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["uid"], project.as_str());
    assert_eq!(projects[0]["description"], "renamed tenant");
    assert_eq!(count(&registry, "projects"), 1);
}

#[tokio::test]
async fn test_full_replace_removes_missing_children() {
    let registry = Registry::in_memory();
    let uid = create(&registry, tree("alpha")).await;

    let mut value = tree("alpha");
    value["regions"] = json!([]);
    registry.replace_provider(&uid, input(value)).await.unwrap().unwrap();

    assert_eq!(count(&registry, "regions"), 0);
    assert_eq!(count(&registry, "services"), 0);
    assert_eq!(count(&registry, "locations"), 0);
    assert_eq!(count(&registry, "projects"), 1);
    assert_eq!(count(&registry, "identity_providers"), 1);
}

#[tokio::test]
async fn test_identity_provider_group_claim_conflict() {
    let registry = Registry::in_memory();
    create(&registry, tree("alpha")).await;

    let mut value = tree("beta");
    value["identity_providers"][0]["group_claim"] = json!("entitlements");
    let err = registry.create_provider(input(value)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    assert_eq!(count(&registry, "providers"), 1);
}

#[tokio::test]
async fn test_invalid_tree_rejected_before_write() {
    let registry = Registry::in_memory();
    let mut value = tree("alpha");
    value["identity_providers"][0]["user_groups"][0]["sla"]["project"] = json!("unknown");
    let err = registry.create_provider(input(value)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_) | Error::BadRequest(_)));
    assert_eq!(count(&registry, "providers"), 0);
}

#[tokio::test]
async fn test_patch_project_name_must_stay_unique() {
    let registry = Registry::in_memory();
    let mut value = tree("alpha");
    value["projects"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "other", "uuid": "u2"}));
    create(&registry, value).await;

    let params = ListParams {
        filters: vec![("uuid".to_string(), "u2".to_string())],
        ..Default::default()
    };
    let list = registry.list::<Project>(&params, true).unwrap();
    let uid = list[0]["uid"].as_str().unwrap().to_string();

    let update = ProjectUpdate {
        name: Some("tenant".to_string()),
        ..Default::default()
    };
    let err = registry.patch::<Project>(&uid, update).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let view = registry
        .get::<Project>(&uid, View { private: true, extended: true })
        .unwrap();
    assert_eq!(view["name"], "other");
    assert!(view["provider"].is_object());
}

#[tokio::test]
async fn test_flavor_visibility_cannot_change() {
    let registry = Registry::in_memory();
    create(&registry, tree("alpha")).await;
    let flavor = uids::<Flavor>(&registry).remove(0);

    let update = serde_json::from_value(json!({"is_public": false})).unwrap();
    let err = registry.patch::<Flavor>(&flavor, update).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}

fn tree_with_group(name: &str, group: &str) -> Value {
    let mut value = tree(name);
    value["identity_providers"][0]["user_groups"][0]["name"] = json!(group);
    value
}

fn names<R: fedreg_registry::Resource>(registry: &Registry, field: &str) -> Vec<String> {
    let list = registry.list::<R>(&ListParams::default(), true).unwrap();
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item[field].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_replace_dropping_shared_identity_provider_and_project() {
    let registry = Registry::in_memory();
    let p1 = create(&registry, tree_with_group("alpha", "g-alpha")).await;
    create(&registry, tree_with_group("beta", "g-beta")).await;
    assert_eq!(count(&registry, "identity_providers"), 1);
    assert_eq!(count(&registry, "user_groups"), 2);

    let value = json!({
        "name": "alpha",
        "type": "openstack",
        "projects": [{"name": "fresh", "uuid": "u9"}]
    });
    registry.replace_provider(&p1, input(value)).await.unwrap().unwrap();

    // The identity provider is still trusted by beta: only alpha's group goes
    assert_eq!(count(&registry, "identity_providers"), 1);
    assert_eq!(names::<UserGroup>(&registry, "name"), vec!["g-beta".to_string()]);
    assert_eq!(names::<Sla>(&registry, "doc_uuid"), vec!["doc-beta".to_string()]);
    assert_eq!(count(&registry, "projects"), 2);
    assert_eq!(count(&registry, "locations"), 1);
}

#[tokio::test]
async fn test_full_replace_and_delete_leave_the_same_graph() {
    let replaced = Registry::in_memory();
    let p1 = create(&replaced, tree_with_group("alpha", "g-alpha")).await;
    create(&replaced, tree_with_group("beta", "g-beta")).await;
    let value = json!({"name": "alpha", "type": "openstack"});
    replaced.replace_provider(&p1, input(value)).await.unwrap().unwrap();

    let deleted = Registry::in_memory();
    let p1 = create(&deleted, tree_with_group("alpha", "g-alpha")).await;
    create(&deleted, tree_with_group("beta", "g-beta")).await;
    deleted.delete::<Provider>(&p1).await.unwrap();

    let mut expected = deleted.database().counts();
    expected.insert("providers", 2);
    assert_eq!(replaced.database().counts(), expected);
}

#[tokio::test]
async fn test_full_replace_moves_region_to_another_site() {
    let registry = Registry::in_memory();
    let p1 = create(&registry, tree("alpha")).await;
    create(&registry, tree("beta")).await;
    assert_eq!(count(&registry, "locations"), 1);

    let mut value = tree("alpha");
    value["regions"][0]["location"] = json!({"site": "padova", "country": "Italy"});
    let replaced = registry.replace_provider(&p1, input(value)).await.unwrap().unwrap();
    assert_eq!(replaced["regions"][0]["location"]["site"], "padova");

    // bologna is kept for beta's region
    let mut sites = names::<Location>(&registry, "site");
    sites.sort();
    assert_eq!(sites, vec!["bologna".to_string(), "padova".to_string()]);

    // Moving beta as well deletes the location nobody references
    let p2_uid = {
        let params = ListParams {
            filters: vec![("name".to_string(), "beta".to_string())],
            ..Default::default()
        };
        let list = registry.list::<Provider>(&params, true).unwrap();
        list[0]["uid"].as_str().unwrap().to_string()
    };
    let mut value = tree("beta");
    value["regions"][0]["location"] = json!({"site": "padova", "country": "Italy"});
    registry.replace_provider(&p2_uid, input(value)).await.unwrap().unwrap();
    assert_eq!(names::<Location>(&registry, "site"), vec!["padova".to_string()]);
}
