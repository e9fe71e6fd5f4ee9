use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::RESOURCES;

/// GET / - service info and the resource index
pub async fn root() -> ApiResult<Value> {
    let resources: Vec<String> = RESOURCES.iter().map(|def| format!("/api/{}", def.segment)).collect();

    Ok(ApiResponse::success(json!({
        "name": "Counsel API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-tenant legal practice management API",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/auth/whoami (protected)",
            "currency": "/api/currency/rates, /api/currency/convert (protected)",
            "resources": resources,
        }
    })))
}
