use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::{validate_jwt, Claims, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantScope;
use crate::validation::ObjectId;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub firm_id: Option<ObjectId>,
    pub role: Role,
    pub scope: TenantScope,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let scope = TenantScope::for_user(&claims.sub, claims.firm_id.as_ref());
        Self {
            user_id: claims.sub,
            firm_id: claims.firm_id,
            role: claims.role,
            scope,
        }
    }
}

impl AuthUser {
    /// An empty role list admits every member
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.is_empty() || roles.contains(&self.role)
    }

    pub fn require_role(&self, roles: &[Role], action: &str) -> Result<(), ApiError> {
        if self.has_role(roles) {
            return Ok(());
        }
        tracing::warn!(
            user = %self.user_id,
            role = %self.role,
            action,
            "Role check failed"
        );
        Err(ApiError::forbidden(format!(
            "Role '{}' is not allowed to {}",
            self.role, action
        )))
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    // Validate and decode JWT
    let claims = validate_jwt(&token, &state.config.security)?;

    // Convert claims to AuthUser and inject into request
    let auth_user = AuthUser::from(claims);
    tracing::debug!(user = %auth_user.user_id, scope = %auth_user.scope, "Authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
