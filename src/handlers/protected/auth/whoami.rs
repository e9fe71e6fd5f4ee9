use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - the authenticated user and their tenant scope
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "userId": user.user_id,
        "firmId": user.firm_id,
        "role": user.role,
        "scope": user.scope,
    })))
}
