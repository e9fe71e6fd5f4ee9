// Ring 3: Business - leave requests must fit the employee's balance
use async_trait::async_trait;
use chrono::Datelike;
use serde_json::Value;

use crate::money;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::services::leave::{self, PENDING};
use crate::store::collections::LEAVE_REQUESTS;
use crate::validation::fields::parse_date;

/// Counts business days, checks the balance and opens the request as pending
pub struct LeaveRequestRulesObserver;

#[async_trait]
impl Observer for LeaveRequestRulesObserver {
    fn name(&self) -> &'static str {
        "LeaveRequestRulesObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == LEAVE_REQUESTS
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let (Some(start), Some(end)) = (
            ctx.get_str("startDate").and_then(parse_date),
            ctx.get_str("endDate").and_then(parse_date),
        ) else {
            return Ok(());
        };
        let half_day = ctx.get("halfDay").and_then(Value::as_bool).unwrap_or(false);
        let days = leave::business_days(start, end, half_day)?;

        let leave_type = ctx.get_str("leaveType").unwrap_or_default().to_string();
        if leave::needs_balance(&leave_type) {
            let employee_id = ctx.get_str("employeeId").unwrap_or_default().to_string();
            let balance = leave::find_balance(ctx.store, ctx.scope(), &employee_id, &leave_type, start.year())
                .await?
                .ok_or_else(|| {
                    ObserverError::field(
                        "leaveType",
                        format!("No {} leave balance for {}", leave_type, start.year()),
                    )
                })?;

            let available = leave::available(&balance);
            if available < days {
                return Err(ObserverError::Rejected(format!(
                    "Insufficient {} leave balance: {} day(s) available, {} requested",
                    leave_type, available, days
                )));
            }
        }

        ctx.set("days", money::to_value(days));
        ctx.set("status", Value::String(PENDING.to_string()));
        Ok(())
    }
}
