use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::middleware::AuthUser;
use crate::money::{parse_decimal, round_cents};
use crate::store::collections::REFERRALS;
use crate::store::{Document, DocumentStore};
use crate::validation::{ObjectId, ValidationErrors};

pub const FEE_TYPES: &[&str] = &["percentage", "flat"];

pub const PENDING: &str = "pending";
pub const ACCEPTED: &str = "accepted";
pub const DECLINED: &str = "declined";
pub const PAID: &str = "paid";

/// Referral fee from a merged referral body.
///
/// `percentage`: `matterValue * feeRate / 100`, capped at `maxFee` when set.
/// `flat`: `flatFee`.
pub fn calculate_fee(body: &Map<String, Value>) -> Result<Decimal, ValidationErrors> {
    let amount = |field: &str| body.get(field).and_then(parse_decimal);
    let mut errors = ValidationErrors::new();

    let fee = match body.get("feeType").and_then(Value::as_str) {
        Some("percentage") => {
            let rate = amount("feeRate");
            let value = amount("matterValue");
            if rate.is_none() {
                errors.add("feeRate", "Required for percentage fees");
            }
            if value.is_none() {
                errors.add("matterValue", "Required for percentage fees");
            }
            match (rate, value) {
                (Some(rate), Some(value)) => {
                    let fee = value * rate / Decimal::ONE_HUNDRED;
                    match amount("maxFee") {
                        Some(cap) if fee > cap => cap,
                        _ => fee,
                    }
                }
                _ => Decimal::ZERO,
            }
        }
        Some("flat") => match amount("flatFee") {
            Some(fee) => fee,
            None => {
                errors.add("flatFee", "Required for flat fees");
                Decimal::ZERO
            }
        },
        _ => {
            errors.add("feeType", "Must be one of: percentage, flat");
            Decimal::ZERO
        }
    };

    errors.into_result()?;
    Ok(round_cents(fee))
}

pub struct ReferralService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ReferralService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn accept(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        self.transition(user, id, "accept", &[PENDING], ACCEPTED, "acceptedAt").await
    }

    pub async fn decline(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        self.transition(user, id, "decline", &[PENDING], DECLINED, "declinedAt").await
    }

    pub async fn mark_paid(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        self.transition(user, id, "mark paid", &[ACCEPTED], PAID, "paidAt").await
    }

    async fn transition(
        &self,
        user: &AuthUser,
        id: &ObjectId,
        action: &'static str,
        from: &[&str],
        to: &str,
        stamp: &str,
    ) -> WorkflowResult<Document> {
        let referral = load_in_scope(self.store, REFERRALS, &user.scope, id, "Referral").await?;
        ensure_status(&referral, action, from)?;

        let mut changes = patch(json!({ "status": to, "updatedBy": user.user_id.as_str() }));
        changes.insert(stamp.to_string(), Value::String(now_rfc3339()));

        let updated = self
            .store
            .update(REFERRALS, &user.scope, id, changes)
            .await?
            .ok_or(WorkflowError::NotFound("Referral"))?;
        tracing::info!(referral = %id, status = to, "Referral {}", action);
        Ok(updated)
    }
}
