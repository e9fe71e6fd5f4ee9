// Ring 3: Business - documents past a workflow stage are frozen
use async_trait::async_trait;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};

/// Refuse `operation` unless the stored status is one of `allowed`
pub struct StatusLockObserver {
    pub collection: &'static str,
    pub operation: Operation,
    pub allowed: &'static [&'static str],
    pub message: &'static str,
}

#[async_trait]
impl Observer for StatusLockObserver {
    fn name(&self) -> &'static str {
        "StatusLockObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn priority(&self) -> u8 {
        10
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == self.operation
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == self.collection
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let status = ctx.existing_status();
        if self.allowed.contains(&status) {
            return Ok(());
        }
        tracing::debug!(collection = self.collection, status, "Write blocked by status lock");
        Err(ObserverError::Conflict(self.message.to_string()))
    }
}

/// Ledger entries paired with a bank transaction stay fixed until released
pub struct MatchedEntryLockObserver;

#[async_trait]
impl Observer for MatchedEntryLockObserver {
    fn name(&self) -> &'static str {
        "MatchedEntryLockObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn priority(&self) -> u8 {
        10
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Update | Operation::Delete)
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == crate::store::collections::LEDGER_ENTRIES
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let matched = ctx
            .existing
            .as_ref()
            .and_then(|doc| doc.get("matchedTransactionId"))
            .is_some_and(|v| !Value::is_null(v));
        if matched {
            return Err(ObserverError::Conflict(
                "Ledger entry is matched to a bank transaction; unmatch it first".to_string(),
            ));
        }
        Ok(())
    }
}
