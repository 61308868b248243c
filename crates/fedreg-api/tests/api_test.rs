//! HTTP level tests driving the router with `tower::ServiceExt::oneshot`

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fedreg_api::{build_router, AppState, Claims};
use fedreg_config::ConfigBuilder;
use fedreg_registry::Registry;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn app() -> Router {
    let config = ConfigBuilder::new()
        .jwt_secret(SECRET)
        .admin_subject("admin")
        .build()
        .unwrap();
    let state = Arc::new(AppState::new(Registry::in_memory(), &config.auth));
    build_router(state, &config.server)
}

fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: 4_102_444_800,
        iat: None,
        iss: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn provider() -> Value {
    json!({
        "name": "cloud",
        "type": "openstack",
        "support_emails": ["ops@example.org"],
        "projects": [{"name": "tenant", "uuid": "u1"}],
        "regions": [{
            "name": "RegionOne",
            "location": {"site": "bologna", "country": "Italy"},
            "compute_services": [{
                "endpoint": "https://cloud.example.org/compute",
                "name": "org.openstack.nova",
                "flavors": [{"name": "tiny", "uuid": "f1", "vcpus": 1}]
            }]
        }]
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router) -> String {
    let (status, body) = call(app, Method::POST, "/api/v1/providers/", Some("admin"), Some(provider())).await;
    assert_eq!(status, StatusCode::CREATED);
    body["uid"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_status() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "inmemory");
}

#[tokio::test]
async fn test_create_requires_admin() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/api/v1/providers/", None, Some(provider())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let (status, _) = call(&app, Method::POST, "/api/v1/providers/", Some("guest"), Some(provider())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_and_private_views() {
    let app = app();
    create(&app).await;

    let (status, body) = call(&app, Method::GET, "/api/v1/providers/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["schema_type"], "public");
    assert!(body[0].get("support_emails").is_none());

    let (_, body) = call(&app, Method::GET, "/api/v1/providers/", Some("guest"), None).await;
    assert_eq!(body[0]["schema_type"], "private");
    assert_eq!(body[0]["support_emails"][0], "ops@example.org");

    let (_, body) = call(&app, Method::GET, "/api/v1/providers/?short=true", Some("guest"), None).await;
    assert_eq!(body[0]["schema_type"], "public");
}

#[tokio::test]
async fn test_get_with_connections() {
    let app = app();
    let uid = create(&app).await;

    let uri = format!("/api/v1/providers/{uid}?with_conn=true");
    let (status, body) = call(&app, Method::GET, &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schema_type"], "private_extended");
    assert_eq!(body["regions"][0]["location"]["site"], "bologna");
    assert_eq!(
        body["regions"][0]["compute_services"][0]["flavors"][0]["uuid"],
        "f1"
    );

    let (_, flavors) = call(&app, Method::GET, "/api/v1/flavors/?with_conn=true", None, None).await;
    assert_eq!(flavors[0]["schema_type"], "public_extended");
    assert_eq!(flavors[0]["services"][0]["endpoint"], "https://cloud.example.org/compute");
}

#[tokio::test]
async fn test_put_and_patch_unchanged_are_not_modified() {
    let app = app();
    let uid = create(&app).await;
    let uri = format!("/api/v1/providers/{uid}");

    let (status, _) = call(&app, Method::PUT, &uri, Some("admin"), Some(provider())).await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);

    let (status, _) = call(&app, Method::PATCH, &uri, Some("admin"), Some(json!({"name": "cloud"}))).await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);

    let (status, body) = call(&app, Method::PATCH, &uri, Some("admin"), Some(json!({"status": "maintenance"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "maintenance");
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let app = app();
    let uid = create(&app).await;
    let uri = format!("/api/v1/providers/{uid}");

    let (status, _) = call(&app, Method::DELETE, &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains(&uid));

    let (_, regions) = call(&app, Method::GET, "/api/v1/regions/", None, None).await;
    assert_eq!(regions, json!([]));
}

#[tokio::test]
async fn test_invalid_body_is_unprocessable() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/providers/",
        Some("admin"),
        Some(json!({"name": "cloud"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let mut bad_email = provider();
    bad_email["support_emails"] = json!(["not-an-email"]);
    let (status, _) = call(&app, Method::POST, "/api/v1/providers/", Some("admin"), Some(bad_email)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_provider_is_bad_request() {
    let app = app();
    create(&app).await;
    let (status, _) = call(&app, Method::POST, "/api/v1/providers/", Some("admin"), Some(provider())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/v1/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not Found");
}
