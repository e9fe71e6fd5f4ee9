// Ring 3: Business - one document per tenant for a combination of fields
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::store::Query;

pub struct UniqueFieldsObserver {
    pub collection: &'static str,
    pub fields: &'static [&'static str],
    pub message: &'static str,
}

#[async_trait]
impl Observer for UniqueFieldsObserver {
    fn name(&self) -> &'static str {
        "UniqueFieldsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == self.collection
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        if ctx.operation == Operation::Update && !self.fields.iter().any(|f| ctx.changes.contains_key(*f)) {
            return Ok(());
        }

        let mut query = Query::new();
        for field in self.fields {
            match ctx.get(field) {
                Some(value) if !value.is_null() => query = query.eq(*field, value.clone()),
                _ => return Ok(()),
            }
        }

        let own_id = ctx.existing.as_ref().map(|doc| doc.id.clone());
        let clashes = ctx
            .store
            .find(ctx.collection, ctx.scope(), &query.page(0, 2))
            .await?
            .into_iter()
            .any(|doc| Some(&doc.id) != own_id.as_ref());

        if clashes {
            return Err(ObserverError::Conflict(self.message.to_string()));
        }
        Ok(())
    }
}
