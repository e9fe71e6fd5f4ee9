// handlers/protected/currency.rs - Exchange rates and conversion

use axum::extract::State;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::money;
use crate::state::AppState;

/// GET /api/currency/rates
pub async fn rates(State(state): State<AppState>) -> ApiResult<Value> {
    let rates: Map<String, Value> = state
        .converter
        .rates()
        .into_iter()
        .map(|(code, rate)| (code, json!(rate.to_string())))
        .collect();

    Ok(ApiResponse::success(json!({
        "base": state.converter.base_currency(),
        "rates": rates,
    })))
}

/// POST /api/currency/convert
pub async fn convert(State(state): State<AppState>, body: JsonBody) -> ApiResult<Value> {
    let amount = body
        .0
        .get("amount")
        .and_then(money::parse_decimal)
        .ok_or_else(|| ApiError::field_error("amount", "Must be a numeric amount"))?;
    let from = body
        .str_field("from")
        .ok_or_else(|| ApiError::field_error("from", "This field is required"))?;
    let to = body
        .str_field("to")
        .ok_or_else(|| ApiError::field_error("to", "This field is required"))?;

    let conversion = state.converter.convert(amount, from, to)?;
    Ok(ApiResponse::success(json!({
        "amount": money::to_value(conversion.amount),
        "from": conversion.from,
        "to": conversion.to,
        "converted": money::to_value(conversion.converted),
        "rate": conversion.rate.to_string(),
    })))
}
