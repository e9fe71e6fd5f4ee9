// handlers/protected/leave.rs - Leave request approvals and balance summaries

use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use crate::handlers::path_id;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::leave::{balance_summary, LeaveService, APPROVER_ROLES};
use crate::state::AppState;
use crate::store::collections::LEAVE_BALANCES;

/// POST /api/leave-requests/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(APPROVER_ROLES, "approve leave")?;
    let id = path_id(&id)?;
    let doc = LeaveService::new(state.store.as_ref()).approve(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/leave-requests/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<JsonBody>,
) -> ApiResult<Value> {
    user.require_role(APPROVER_ROLES, "reject leave")?;
    let id = path_id(&id)?;
    let reason = body.as_ref().and_then(|b| b.str_field("reason")).map(str::to_string);
    let doc = LeaveService::new(state.store.as_ref()).reject(&user, &id, reason).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/leave-requests/:id/cancel - the employee or an approver
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    let doc = LeaveService::new(state.store.as_ref()).cancel(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// GET /api/leave-balances/:id/summary
pub async fn balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    let balance = state
        .store
        .find_by_id(LEAVE_BALANCES, &user.scope, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave balance not found"))?;
    Ok(ApiResponse::success(balance_summary(&balance)))
}
