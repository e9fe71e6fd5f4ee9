// Ring 4: Enrichment - currencies and balances inherited from the account
use async_trait::async_trait;
use serde_json::Value;

use crate::money;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::services::reconciliation::default_opening_balance;
use crate::store::collections::{ACCOUNTS, BANK_TRANSACTIONS, INVOICES, LEDGER_ENTRIES, RECONCILIATIONS};
use crate::store::Document;
use crate::validation::ObjectId;

async fn load_account(ctx: &ObserverContext<'_>) -> Result<Option<Document>, ObserverError> {
    let Some(id) = ctx.get_str("accountId").and_then(|raw| ObjectId::parse(raw).ok()) else {
        return Ok(None);
    };
    Ok(ctx.store.find_by_id(ACCOUNTS, ctx.scope(), &id).await?)
}

/// Accounts and invoices default to the configured base currency
pub struct BaseCurrencyObserver;

#[async_trait]
impl Observer for BaseCurrencyObserver {
    fn name(&self) -> &'static str {
        "BaseCurrencyObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == ACCOUNTS || collection == INVOICES
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        let base = ctx.config.currency.base_currency.to_ascii_uppercase();
        ctx.set_default("currency", Value::String(base));
        Ok(())
    }
}

/// Bank transactions and ledger entries default to their account's currency
pub struct TransactionCurrencyObserver;

#[async_trait]
impl Observer for TransactionCurrencyObserver {
    fn name(&self) -> &'static str {
        "TransactionCurrencyObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == BANK_TRANSACTIONS || collection == LEDGER_ENTRIES
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        if ctx.get_str("currency").is_some() {
            return Ok(());
        }
        let currency = load_account(ctx)
            .await?
            .and_then(|account| account.str_field("currency").map(str::to_string))
            .unwrap_or_else(|| ctx.config.currency.base_currency.to_ascii_uppercase());
        ctx.set("currency", Value::String(currency));
        Ok(())
    }
}

/// A new reconciliation starts from the last completed statement
pub struct ReconciliationOpeningObserver;

#[async_trait]
impl Observer for ReconciliationOpeningObserver {
    fn name(&self) -> &'static str {
        "ReconciliationOpeningObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_collection(&self, collection: &str) -> bool {
        collection == RECONCILIATIONS
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError> {
        if ctx.get("openingBalance").is_some_and(|v| !v.is_null()) {
            return Ok(());
        }
        let Some(account) = load_account(ctx).await? else {
            return Ok(());
        };
        let opening = default_opening_balance(ctx.store, ctx.scope(), &account).await?;
        ctx.set("openingBalance", money::to_value(opening));
        Ok(())
    }
}
