// Ring 1: Input Validation - date ranges must run forwards
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::validation::fields::parse_date;

/// `end` must not precede `start`; with `strict`, it must come after it
pub struct DateOrderObserver {
    pub collection: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub strict: bool,
}

impl DateOrderObserver {
    pub const fn new(collection: &'static str, start: &'static str, end: &'static str, strict: bool) -> Self {
        Self {
            collection,
            start,
            end,
            strict,
        }
    }
}

#[async_trait]
impl Observer for DateOrderObserver {
    fn name(&self) -> &'static str {
        "DateOrderObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == self.collection
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let start = ctx.get_str(self.start).and_then(parse_date);
        let end = ctx.get_str(self.end).and_then(parse_date);

        if let (Some(start), Some(end)) = (start, end) {
            if end < start || (self.strict && end == start) {
                let relation = if self.strict { "after" } else { "on or after" };
                return Err(ObserverError::field(
                    self.end,
                    format!("Must be {} {}", relation, self.start),
                ));
            }
        }
        Ok(())
    }
}
