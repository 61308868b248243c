//! Route table and HTTP layers

use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use fedreg_config::ServerConfig;
use fedreg_core::prelude::*;
use fedreg_registry::Resource;
use fedreg_schema::Merge;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Generic read / partial update / delete routes of one node kind
fn resource<R>(router: Router<Arc<AppState>>, path: &str) -> Router<Arc<AppState>>
where
    R: Resource + Merge<<R as Resource>::Update>,
{
    router
        .route(&format!("/{path}"), get(handlers::list::<R>))
        .route(&format!("/{path}/"), get(handlers::list::<R>))
        .route(
            &format!("/{path}/:uid"),
            get(handlers::get::<R>)
                .patch(handlers::patch::<R>)
                .delete(handlers::delete::<R>),
        )
}

/// API routes without prefix or layers
pub fn api_routes() -> Router<Arc<AppState>> {
    let router = Router::new()
        .route(
            "/providers",
            get(handlers::list::<Provider>).post(handlers::create_provider),
        )
        .route(
            "/providers/",
            get(handlers::list::<Provider>).post(handlers::create_provider),
        )
        .route(
            "/providers/:uid",
            get(handlers::get::<Provider>)
                .put(handlers::replace_provider)
                .patch(handlers::patch::<Provider>)
                .delete(handlers::delete::<Provider>),
        )
        .route("/status", get(handlers::status));

    let router = resource::<Project>(router, "projects");
    let router = resource::<IdentityProvider>(router, "identity_providers");
    let router = resource::<UserGroup>(router, "user_groups");
    let router = resource::<Sla>(router, "slas");
    let router = resource::<Region>(router, "regions");
    let router = resource::<Location>(router, "locations");
    let router = resource::<Service>(router, "services");
    let router = resource::<Quota>(router, "quotas");
    let router = resource::<Flavor>(router, "flavors");
    let router = resource::<Image>(router, "images");
    resource::<Network>(router, "networks")
}

/// Full application: API routes under the configured prefix with tracing,
/// timeout and body size limits.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let api = api_routes();
    let app = if server.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&server.api_prefix, api)
    };

    app.fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(server.request_timeout)),
        )
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .with_state(state)
}
