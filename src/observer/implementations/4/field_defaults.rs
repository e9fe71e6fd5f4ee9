// Ring 4: Enrichment - initial values for managed fields
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::store::collections::*;

/// Fills fields the client did not (or may not) supply when a document is created
pub struct FieldDefaultsObserver {
    pub collection: &'static str,
    pub defaults: fn() -> Vec<(&'static str, Value)>,
}

impl FieldDefaultsObserver {
    pub fn all() -> Vec<Self> {
        vec![
            Self::new(BANK_TRANSACTIONS, || vec![("status", json!("unmatched"))]),
            Self::new(LEDGER_ENTRIES, || vec![("matchedTransactionId", Value::Null)]),
            Self::new(RECONCILIATIONS, || vec![("status", json!("in_progress"))]),
            Self::new(LEAVE_BALANCES, || {
                vec![("used", json!(0)), ("pending", json!(0)), ("carriedOver", json!(0))]
            }),
            Self::new(PROBATIONS, || vec![("status", json!("active")), ("extensions", json!([]))]),
            Self::new(ONBOARDING, || vec![("status", json!("not_started")), ("checklist", json!([]))]),
            Self::new(INVOICES, || {
                vec![("status", json!("draft")), ("amountPaid", json!(0)), ("payments", json!([]))]
            }),
            Self::new(REFERRALS, || vec![("status", json!("pending"))]),
            Self::new(INTEGRATIONS, || vec![("status", json!("disconnected")), ("settings", json!({}))]),
            Self::new(CASES, || vec![("status", json!("open"))]),
            Self::new(REPORTS, || vec![("status", json!("draft"))]),
        ]
    }

    pub fn new(collection: &'static str, defaults: fn() -> Vec<(&'static str, Value)>) -> Self {
        Self { collection, defaults }
    }
}

#[async_trait]
impl Observer for FieldDefaultsObserver {
    fn name(&self) -> &'static str {
        "FieldDefaultsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn priority(&self) -> u8 {
        10
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == self.collection
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        for (field, value) in (self.defaults)() {
            ctx.set_default(field, value);
        }
        Ok(())
    }
}
