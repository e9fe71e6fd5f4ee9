// handlers/protected/invoices.rs - Invoice send, payment and void actions

use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::money;
use crate::services::invoice::{InvoiceService, Payment, BILLING_ROLES, PAYMENT_METHODS};
use crate::state::AppState;
use crate::validation::fields::date_field;
use crate::validation::{check_required, pick_allowed, validate_fields, FieldDef, FieldKind, ValidationErrors};

const PAYMENT_FIELDS: &[FieldDef] = &[
    FieldDef::new("amount", FieldKind::Money),
    FieldDef::new("date", FieldKind::Date),
    FieldDef::new("method", FieldKind::Enum(PAYMENT_METHODS)),
    FieldDef::new("reference", FieldKind::Text { max: 100 }),
];

fn parse_payment(body: &JsonBody) -> Result<Payment, ApiError> {
    let (mut fields, _) = pick_allowed(&body.0, &["amount", "date", "method", "reference"]);
    let mut errors = ValidationErrors::new();
    validate_fields(&mut fields, PAYMENT_FIELDS, &mut errors);
    check_required(&fields, &["amount", "date"], &mut errors);
    errors.into_result()?;

    let amount = fields.get("amount").and_then(money::parse_decimal);
    let date = date_field(&fields, "date");
    let (Some(amount), Some(date)) = (amount, date) else {
        return Err(ApiError::field_error("amount", "This field is required"));
    };

    let text = |field: &str| fields.get(field).and_then(Value::as_str).map(str::to_string);
    Ok(Payment {
        amount,
        date,
        method: text("method"),
        reference: text("reference"),
    })
}

/// POST /api/invoices/:id/send
pub async fn send(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(BILLING_ROLES, "send invoices")?;
    let id = path_id(&id)?;
    let doc = InvoiceService::new(state.store.as_ref()).send(&user, &id).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/invoices/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: JsonBody,
) -> ApiResult<Value> {
    user.require_role(BILLING_ROLES, "record payments")?;
    let id = path_id(&id)?;
    let payment = parse_payment(&body)?;
    let doc = InvoiceService::new(state.store.as_ref())
        .record_payment(&user, &id, payment)
        .await?;
    Ok(ApiResponse::success(doc.to_api()))
}

/// POST /api/invoices/:id/void
pub async fn void(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<JsonBody>,
) -> ApiResult<Value> {
    user.require_role(BILLING_ROLES, "void invoices")?;
    let id = path_id(&id)?;
    let reason = body.as_ref().and_then(|b| b.str_field("reason")).map(str::to_string);
    let doc = InvoiceService::new(state.store.as_ref()).void(&user, &id, reason).await?;
    Ok(ApiResponse::success(doc.to_api()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> JsonBody {
        JsonBody(value.as_object().unwrap().clone())
    }

    #[test]
    fn payment_accepts_string_amounts() {
        let payment = parse_payment(&body(json!({ "amount": "150.50", "date": "2026-03-01", "method": "card" }))).unwrap();
        assert_eq!(payment.amount, rust_decimal::Decimal::new(15050, 2));
        assert_eq!(payment.method.as_deref(), Some("card"));
    }

    #[test]
    fn payment_errors_are_reported_per_field() {
        let err = parse_payment(&body(json!({ "amount": -5, "method": "barter" }))).unwrap_err();
        let fields = &err.to_json()["field_errors"];
        assert!(fields.get("amount").is_some());
        assert_eq!(fields["date"], json!("This field is required"));
        assert!(fields.get("method").is_some());
    }
}
