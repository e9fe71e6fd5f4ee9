// Ring 6: Post-Database - hold requested days against the balance
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::services::leave;
use crate::store::collections::LEAVE_REQUESTS;

pub struct LeaveBalanceReservationObserver;

#[async_trait]
impl Observer for LeaveBalanceReservationObserver {
    fn name(&self) -> &'static str {
        "LeaveBalanceReservationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::PostDatabase
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == LEAVE_REQUESTS
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let Some(request) = ctx.result.as_ref() else {
            return Ok(());
        };
        leave::reserve_days(ctx.store, ctx.scope(), request).await?;
        Ok(())
    }
}
