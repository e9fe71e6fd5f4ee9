// handlers/protected/probations.rs - Probation extensions and outcomes

use axum::extract::{Path, State};
use axum::Extension;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::probation::{ProbationService, HR_ROLES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRequest {
    pub new_end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub outcome: String,
    pub notes: Option<String>,
}

/// POST /api/probations/:id/extend
pub async fn extend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(HR_ROLES, "extend probations")?;
    let id = path_id(&id)?;
    let request: ExtendRequest = body.into_typed()?;
    let doc = ProbationService::new(state.store.as_ref())
        .extend(&user, &id, request.new_end_date, request.reason)
        .await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/probations/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(HR_ROLES, "complete probations")?;
    let id = path_id(&id)?;
    let request: CompleteRequest = body.into_typed()?;
    let doc = ProbationService::new(state.store.as_ref())
        .complete(&user, &id, &request.outcome, request.notes)
        .await?;
    Ok(ApiResponse::success(doc.to_api()))
}
