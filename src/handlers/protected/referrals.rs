// handlers/protected/referrals.rs - Referral status transitions

use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::resources::registry::REFERRALS_DEF;
use crate::services::referral::ReferralService;
use crate::state::AppState;

/// POST /api/referrals/:id/accept
pub async fn accept(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(REFERRALS_DEF.write_roles, "accept referrals")?;
    let id = path_id(&id)?;
    let doc = ReferralService::new(state.store.as_ref()).accept(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/referrals/:id/decline
pub async fn decline(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(REFERRALS_DEF.write_roles, "decline referrals")?;
    let id = path_id(&id)?;
    let doc = ReferralService::new(state.store.as_ref()).decline(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/referrals/:id/mark-paid
pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(REFERRALS_DEF.write_roles, "mark referrals paid")?;
    let id = path_id(&id)?;
    let doc = ReferralService::new(state.store.as_ref()).mark_paid(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}
