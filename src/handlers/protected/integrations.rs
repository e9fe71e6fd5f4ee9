// handlers/protected/integrations.rs - OAuth connect, callback and disconnect

use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::integration::{IntegrationService, INTEGRATION_ROLES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub state: String,
    pub code: String,
}

/// POST /api/integrations/:id/connect
pub async fn connect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(INTEGRATION_ROLES, "connect integrations")?;
    let id = path_id(&id)?;
    let request = IntegrationService::new(state.store.as_ref(), &state.config.integrations)
        .connect(&user, &id)
        .await?;

    Ok(ApiResponse::success(json!({
        "authorizeUrl": request.authorize_url,
        "state": request.state,
        "integration": request.integration.to_api(),
    })))
}

/// POST /api/integrations/:id/callback
pub async fn callback(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(INTEGRATION_ROLES, "connect integrations")?;
    let id = path_id(&id)?;
    let request: CallbackRequest = body.into_typed()?;
    let doc = IntegrationService::new(state.store.as_ref(), &state.config.integrations)
        .callback(&user, &id, &request.state, &request.code)
        .await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/integrations/:id/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(INTEGRATION_ROLES, "disconnect integrations")?;
    let id = path_id(&id)?;
    let doc = IntegrationService::new(state.store.as_ref(), &state.config.integrations)
        .disconnect(&user, &id)
        .await?;
    Ok(ApiResponse::success(doc.to_api()))
}
