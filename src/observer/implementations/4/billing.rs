// Ring 4: Enrichment - invoice totals and referral fees
use async_trait::async_trait;
use serde_json::Value;

use crate::money;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::services::invoice::compute_totals;
use crate::services::referral::calculate_fee;
use crate::store::collections::{INVOICES, REFERRALS};

/// Recomputes totals on every write and numbers new invoices per tenant
pub struct InvoiceTotalsObserver;

#[async_trait]
impl Observer for InvoiceTotalsObserver {
    fn name(&self) -> &'static str {
        "InvoiceTotalsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn priority(&self) -> u8 {
        60
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == INVOICES
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let totals = compute_totals(&ctx.merged())?;
        ctx.changes.extend(totals.to_patch());

        if ctx.operation == Operation::Create {
            let number = ctx.store.next_sequence(ctx.scope(), INVOICES).await?;
            ctx.set("invoiceNumber", Value::String(format!("INV-{:05}", number)));
        }
        Ok(())
    }
}

/// Keeps `fee` in step with the fee inputs
pub struct ReferralFeeObserver;

#[async_trait]
impl Observer for ReferralFeeObserver {
    fn name(&self) -> &'static str {
        "ReferralFeeObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == REFERRALS
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let fee = calculate_fee(&ctx.merged())?;
        ctx.set("fee", money::to_value(fee));
        Ok(())
    }
}
