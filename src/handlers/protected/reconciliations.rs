// handlers/protected/reconciliations.rs - Bank reconciliation workflow

use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::reconciliation::{ReconciliationService, ACCOUNTING_ROLES};
use crate::state::AppState;
use crate::validation::ObjectId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub transaction_id: ObjectId,
    pub entry_id: ObjectId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchRequest {
    pub transaction_id: ObjectId,
}

/// GET /api/reconciliations/:id/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    let summary = ReconciliationService::new(&state).summary(&user.scope, &id).await?;
    Ok(ApiResponse::success(summary.to_json()))
}

/// POST /api/reconciliations/:id/auto-match
pub async fn auto_match(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(ACCOUNTING_ROLES, "match transactions")?;
    let id = path_id(&id)?;
    let pairs = ReconciliationService::new(&state).auto_match(&user, &id).await?;
    Ok(ApiResponse::success(json!({ "matched": pairs.len(), "pairs": pairs })))
}

/// POST /api/reconciliations/:id/match
pub async fn manual_match(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(ACCOUNTING_ROLES, "match transactions")?;
    let id = path_id(&id)?;
    let request: MatchRequest = body.into_typed()?;
    let pair = ReconciliationService::new(&state)
        .manual_match(&user, &id, &request.transaction_id, &request.entry_id)
        .await?;
    Ok(ApiResponse::success(json!(pair)))
}

/// POST /api/reconciliations/:id/unmatch
pub async fn unmatch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(ACCOUNTING_ROLES, "unmatch transactions")?;
    let id = path_id(&id)?;
    let request: UnmatchRequest = body.into_typed()?;
    ReconciliationService::new(&state)
        .unmatch(&user, &id, &request.transaction_id)
        .await?;
    Ok(ApiResponse::success(json!({ "unmatched": true, "transactionId": request.transaction_id })))
}

/// POST /api/reconciliations/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(ACCOUNTING_ROLES, "complete reconciliations")?;
    let id = path_id(&id)?;
    let doc = ReconciliationService::new(&state).complete(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/reconciliations/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(ACCOUNTING_ROLES, "cancel reconciliations")?;
    let id = path_id(&id)?;
    let doc = ReconciliationService::new(&state).cancel(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}
