// Ring 3: Business - at most one open reconciliation per account
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::services::reconciliation::IN_PROGRESS;
use crate::store::collections::RECONCILIATIONS;
use crate::store::Query;

pub struct SingleOpenReconciliationObserver;

#[async_trait]
impl Observer for SingleOpenReconciliationObserver {
    fn name(&self) -> &'static str {
        "SingleOpenReconciliationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == RECONCILIATIONS
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let Some(account_id) = ctx.get_str("accountId") else {
            return Ok(());
        };
        let open = Query::new().eq("accountId", account_id).eq("status", IN_PROGRESS);
        let count = ctx.store.count(RECONCILIATIONS, ctx.scope(), &open.filter).await?;

        if count > 0 {
            return Err(ObserverError::Conflict(
                "This account already has a reconciliation in progress".to_string(),
            ));
        }
        Ok(())
    }
}
