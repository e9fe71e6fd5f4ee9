// handlers/protected/resources.rs - Generic CRUD for every registered resource
//
// The router attaches the resource definition as an extension, so one set of
// handlers serves /api/clients, /api/invoices, /api/leave-requests, ...

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Extension;
use serde_json::Value;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::resources::{parse_list_params, ResourceDef, ResourceOps};
use crate::state::AppState;
use crate::store::DocumentVecExt;

/// GET /api/{resource}
pub async fn list(
    State(state): State<AppState>,
    Extension(def): Extension<&'static ResourceDef>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let params = parse_list_params(&params, def, &state.config.api)?;
    let (docs, pagination) = ResourceOps::new(&state, def).list(&user, params).await?;
    Ok(ApiResponse::paginated(docs.to_api(), pagination))
}

/// GET /api/{resource}/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(def): Extension<&'static ResourceDef>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let doc = ResourceOps::new(&state, def).get(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/{resource}
pub async fn create(
    State(state): State<AppState>,
    Extension(def): Extension<&'static ResourceDef>,
    Extension(user): Extension<AuthUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let doc = ResourceOps::new(&state, def).create(&user, body).await?;
    Ok(ApiResponse::created(doc.to_api()))
}

/// PATCH or PUT /api/{resource}/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(def): Extension<&'static ResourceDef>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let doc = ResourceOps::new(&state, def).update(&user, &id, body).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// DELETE /api/{resource}/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(def): Extension<&'static ResourceDef>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let deleted = ResourceOps::new(&state, def).delete(&user, &id).await?;
    Ok(ApiResponse::success(deleted))
}
