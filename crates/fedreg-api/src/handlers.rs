//! Request handlers
//!
//! Every node kind shares the generic list / get / patch / delete handlers;
//! providers add creation and full replacement of the nested tree.

use crate::auth::{Admin, Caller};
use crate::error::{detail, ApiError};
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fedreg_core::normalize_uid;
use fedreg_registry::{ListParams, Resource, View};
use fedreg_schema::{Merge, ProviderCreateExtended};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type HandlerResult<T> = Result<T, ApiError>;

/// JSON request body; rejections are rendered like every other error
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Rejected request body");
                Err(detail(rejection.status(), rejection.body_text()))
            }
        }
    }
}

fn modified(item: Option<Value>) -> Response {
    match item {
        Some(item) => Json(item).into_response(),
        None => StatusCode::NOT_MODIFIED.into_response(),
    }
}

/// GET /<kind>/
pub async fn list<R: Resource>(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<HashMap<String, String>>,
) -> HandlerResult<Json<Value>> {
    let params = ListParams::from_query(query)?;
    Ok(Json(state.registry.list::<R>(&params, caller.authenticated)?))
}

/// GET /<kind>/{uid}
pub async fn get<R: Resource>(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(uid): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> HandlerResult<Json<Value>> {
    let params = ListParams::from_query(query)?;
    let view = View {
        private: caller.authenticated && !params.short,
        extended: params.with_conn,
    };
    Ok(Json(state.registry.get::<R>(&normalize_uid(&uid), view)?))
}

/// PATCH /<kind>/{uid}
pub async fn patch<R>(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(uid): Path<String>,
    JsonBody(update): JsonBody<R::Update>,
) -> HandlerResult<Response>
where
    R: Resource + Merge<<R as Resource>::Update>,
{
    let item = state.registry.patch::<R>(&normalize_uid(&uid), update).await?;
    Ok(modified(item))
}

/// DELETE /<kind>/{uid}
pub async fn delete<R: Resource>(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(uid): Path<String>,
) -> HandlerResult<StatusCode> {
    state.registry.delete::<R>(&normalize_uid(&uid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /providers/
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    JsonBody(input): JsonBody<ProviderCreateExtended>,
) -> HandlerResult<(StatusCode, Json<Value>)> {
    let provider = state.registry.create_provider(input).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// PUT /providers/{uid}
pub async fn replace_provider(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(uid): Path<String>,
    JsonBody(input): JsonBody<ProviderCreateExtended>,
) -> HandlerResult<Response> {
    let item = state
        .registry
        .replace_provider(&normalize_uid(&uid), input)
        .await?;
    Ok(modified(item))
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.registry.status())
}

/// Unknown routes
pub async fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Not Found")
}
