use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use super::currency::CurrencyConverter;
use super::matching::{BankMatcher, MatchCandidate, MatchPair};
use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::auth::Role;
use crate::middleware::AuthUser;
use crate::money::{self, field_or_zero};
use crate::state::AppState;
use crate::store::collections::{ACCOUNTS, BANK_TRANSACTIONS, LEDGER_ENTRIES, RECONCILIATIONS};
use crate::store::{BatchUpdate, Document, DocumentStore, Query, SortDirection, StoreError};
use crate::tenant::TenantScope;
use crate::validation::fields::date_field;
use crate::validation::ObjectId;

pub const IN_PROGRESS: &str = "in_progress";
pub const COMPLETED: &str = "completed";
pub const CANCELLED: &str = "cancelled";

pub const TX_UNMATCHED: &str = "unmatched";
pub const TX_MATCHED: &str = "matched";
pub const TX_RECONCILED: &str = "reconciled";

/// Roles that may run reconciliation workflows
pub const ACCOUNTING_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Accountant];

/// Balance figures for one reconciliation, in the account currency
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationSummary {
    pub currency: String,
    pub opening_balance: Decimal,
    pub statement_balance: Decimal,
    pub cleared_balance: Decimal,
    pub difference: Decimal,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
}

impl ReconciliationSummary {
    pub fn to_json(&self) -> Value {
        json!({
            "currency": self.currency,
            "openingBalance": money::to_value(self.opening_balance),
            "statementBalance": money::to_value(self.statement_balance),
            "clearedBalance": money::to_value(self.cleared_balance),
            "difference": money::to_value(self.difference),
            "matchedCount": self.matched_count,
            "unmatchedCount": self.unmatched_count,
            "totalDeposits": money::to_value(self.total_deposits),
            "totalWithdrawals": money::to_value(self.total_withdrawals),
        })
    }
}

/// Opening balance for a new reconciliation: the latest completed statement,
/// else the account's own opening balance.
pub async fn default_opening_balance(
    store: &dyn DocumentStore,
    scope: &TenantScope,
    account: &Document,
) -> Result<Decimal, StoreError> {
    let query = Query::new()
        .eq("accountId", account.id.as_str())
        .eq("status", COMPLETED)
        .sort_by("periodEnd", SortDirection::Desc)
        .page(0, 1);
    let latest = store.find(RECONCILIATIONS, scope, &query).await?;

    Ok(match latest.first() {
        Some(previous) => field_or_zero(&previous.body, "statementBalance"),
        None => field_or_zero(&account.body, "openingBalance"),
    })
}

/// Bank reconciliation workflow over one account and statement period
pub struct ReconciliationService<'a> {
    store: &'a dyn DocumentStore,
    converter: &'a dyn CurrencyConverter,
    matcher: &'a dyn BankMatcher,
    window_days: i64,
}

impl<'a> ReconciliationService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store.as_ref(),
            converter: state.converter.as_ref(),
            matcher: state.matcher.as_ref(),
            window_days: state.config.reconciliation.date_window_days,
        }
    }

    pub async fn summary(&self, scope: &TenantScope, id: &ObjectId) -> WorkflowResult<ReconciliationSummary> {
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        let account = self.account_for(scope, &rec).await?;
        self.summarize(scope, &rec, &account).await
    }

    pub async fn auto_match(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Vec<MatchPair>> {
        let scope = &user.scope;
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        ensure_status(&rec, "auto-match", &[IN_PROGRESS])?;
        let account = self.account_for(scope, &rec).await?;
        let currency = account_currency(&account, self.converter);
        let (start, end) = period(&rec)?;

        let transactions = self
            .store
            .find(
                BANK_TRANSACTIONS,
                scope,
                &Query::new().eq("accountId", account.id.as_str()).eq("status", TX_UNMATCHED),
            )
            .await?;
        let tx_candidates = self.candidates(&transactions, &currency, start, end)?;

        let window = Duration::days(self.window_days);
        let entries: Vec<Document> = self
            .store
            .find(LEDGER_ENTRIES, scope, &Query::new().eq("accountId", account.id.as_str()))
            .await?
            .into_iter()
            .filter(|entry| is_unset(entry.get("matchedTransactionId")))
            .collect();
        let entry_candidates = self.candidates(&entries, &currency, start - window, end + window)?;

        let pairs = self.matcher.match_transactions(&tx_candidates, &entry_candidates);
        if pairs.is_empty() {
            tracing::info!(reconciliation = %rec.id, "Auto-match found no pairs");
            return Ok(pairs);
        }

        let mut batch = Vec::with_capacity(pairs.len() * 2 + 1);
        batch.push(still_open(&rec));
        for pair in &pairs {
            batch.extend(match_updates(&rec.id, &pair.transaction_id, &pair.entry_id, &user.user_id));
        }
        self.store.apply_batch(scope, batch).await?;

        tracing::info!(
            reconciliation = %rec.id,
            matched = pairs.len(),
            candidates = tx_candidates.len(),
            "Auto-match applied"
        );
        Ok(pairs)
    }

    pub async fn manual_match(
        &self,
        user: &AuthUser,
        id: &ObjectId,
        transaction_id: &ObjectId,
        entry_id: &ObjectId,
    ) -> WorkflowResult<MatchPair> {
        let scope = &user.scope;
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        ensure_status(&rec, "match", &[IN_PROGRESS])?;
        let account_id = rec.str_field("accountId").unwrap_or_default().to_string();

        let tx = load_in_scope(self.store, BANK_TRANSACTIONS, scope, transaction_id, "Bank transaction").await?;
        let entry = load_in_scope(self.store, LEDGER_ENTRIES, scope, entry_id, "Ledger entry").await?;

        for (doc, label) in [(&tx, "Bank transaction"), (&entry, "Ledger entry")] {
            if doc.str_field("accountId") != Some(account_id.as_str()) {
                return Err(WorkflowError::Rejected(format!(
                    "{} does not belong to the reconciled account",
                    label
                )));
            }
        }
        if tx.status() != TX_UNMATCHED {
            return Err(WorkflowError::Conflict("Bank transaction is already matched".to_string()));
        }
        if !is_unset(entry.get("matchedTransactionId")) {
            return Err(WorkflowError::Conflict("Ledger entry is already matched".to_string()));
        }

        let mut batch = vec![still_open(&rec)];
        batch.extend(match_updates(&rec.id, &tx.id, &entry.id, &user.user_id));
        self.store.apply_batch(scope, batch).await?;

        tracing::info!(reconciliation = %rec.id, transaction = %tx.id, entry = %entry.id, "Manual match");
        Ok(MatchPair {
            transaction_id: tx.id,
            entry_id: entry.id,
        })
    }

    pub async fn unmatch(&self, user: &AuthUser, id: &ObjectId, transaction_id: &ObjectId) -> WorkflowResult<()> {
        let scope = &user.scope;
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        ensure_status(&rec, "unmatch", &[IN_PROGRESS])?;

        let tx = load_in_scope(self.store, BANK_TRANSACTIONS, scope, transaction_id, "Bank transaction").await?;
        if tx.status() != TX_MATCHED || tx.str_field("reconciliationId") != Some(rec.id.as_str()) {
            return Err(WorkflowError::Conflict(
                "Transaction is not matched in this reconciliation".to_string(),
            ));
        }

        let mut batch = vec![still_open(&rec)];
        batch.extend(release_updates(&tx));
        self.store.apply_batch(scope, batch).await?;
        tracing::info!(reconciliation = %rec.id, transaction = %tx.id, "Match released");
        Ok(())
    }

    pub async fn complete(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let scope = &user.scope;
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        ensure_status(&rec, "complete", &[IN_PROGRESS])?;
        let account = self.account_for(scope, &rec).await?;
        let summary = self.summarize(scope, &rec, &account).await?;

        if !summary.difference.is_zero() {
            return Err(WorkflowError::Rejected(format!(
                "Reconciliation is out of balance by {} {}",
                money::round_cents(summary.difference),
                summary.currency
            )));
        }

        let mut batch: Vec<BatchUpdate> = self
            .matched_transactions(scope, &rec)
            .await?
            .into_iter()
            .map(|tx| {
                BatchUpdate::new(BANK_TRANSACTIONS, tx.id, patch(json!({ "status": TX_RECONCILED })))
                    .expecting("status", TX_MATCHED)
                    .expecting("reconciliationId", rec.id.as_str())
            })
            .collect();
        batch.push(
            BatchUpdate::new(
                RECONCILIATIONS,
                rec.id.clone(),
                patch(json!({
                    "status": COMPLETED,
                    "completedAt": now_rfc3339(),
                    "completedBy": user.user_id.as_str(),
                    "clearedBalance": money::to_value(summary.cleared_balance),
                    "difference": money::to_value(Decimal::ZERO),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .expecting("status", IN_PROGRESS),
        );
        self.store.apply_batch(scope, batch).await?;

        tracing::info!(reconciliation = %rec.id, matched = summary.matched_count, "Reconciliation completed");
        load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await
    }

    pub async fn cancel(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let scope = &user.scope;
        let rec = load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await?;
        ensure_status(&rec, "cancel", &[IN_PROGRESS])?;

        let mut batch = Vec::new();
        for tx in self.matched_transactions(scope, &rec).await? {
            batch.extend(release_updates(&tx));
        }
        batch.push(
            BatchUpdate::new(
                RECONCILIATIONS,
                rec.id.clone(),
                patch(json!({
                    "status": CANCELLED,
                    "cancelledAt": now_rfc3339(),
                    "cancelledBy": user.user_id.as_str(),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .expecting("status", IN_PROGRESS),
        );
        self.store.apply_batch(scope, batch).await?;

        tracing::info!(reconciliation = %rec.id, "Reconciliation cancelled");
        load_in_scope(self.store, RECONCILIATIONS, scope, id, "Reconciliation").await
    }

    async fn account_for(&self, scope: &TenantScope, rec: &Document) -> WorkflowResult<Document> {
        let account_id = rec
            .str_field("accountId")
            .and_then(|raw| ObjectId::parse(raw).ok())
            .ok_or(WorkflowError::NotFound("Account"))?;
        load_in_scope(self.store, ACCOUNTS, scope, &account_id, "Account").await
    }

    async fn matched_transactions(&self, scope: &TenantScope, rec: &Document) -> WorkflowResult<Vec<Document>> {
        let query = Query::new()
            .eq("reconciliationId", rec.id.as_str())
            .eq("status", TX_MATCHED);
        Ok(self.store.find(BANK_TRANSACTIONS, scope, &query).await?)
    }

    async fn summarize(
        &self,
        scope: &TenantScope,
        rec: &Document,
        account: &Document,
    ) -> WorkflowResult<ReconciliationSummary> {
        let currency = account_currency(account, self.converter);
        let (start, end) = period(rec)?;

        let cleared_rows: Vec<Document> = self
            .store
            .find(
                BANK_TRANSACTIONS,
                scope,
                &Query::new().eq("reconciliationId", rec.id.as_str()),
            )
            .await?
            .into_iter()
            .filter(|tx| matches!(tx.status(), TX_MATCHED | TX_RECONCILED))
            .collect();

        let mut deposits = Decimal::ZERO;
        let mut withdrawals = Decimal::ZERO;
        for tx in &cleared_rows {
            let amount = self.amount_in(tx, &currency)?;
            if amount.is_sign_negative() {
                withdrawals += -amount;
            } else {
                deposits += amount;
            }
        }

        let unmatched_count = self
            .store
            .find(
                BANK_TRANSACTIONS,
                scope,
                &Query::new().eq("accountId", account.id.as_str()).eq("status", TX_UNMATCHED),
            )
            .await?
            .iter()
            .filter(|tx| date_field(&tx.body, "date").is_some_and(|d| d >= start && d <= end))
            .count();

        let opening_balance = field_or_zero(&rec.body, "openingBalance");
        let statement_balance = field_or_zero(&rec.body, "statementBalance");
        let cleared_balance = money::round_cents(opening_balance + deposits - withdrawals);

        Ok(ReconciliationSummary {
            currency,
            opening_balance,
            statement_balance,
            cleared_balance,
            difference: money::round_cents(statement_balance - cleared_balance),
            matched_count: cleared_rows.len(),
            unmatched_count,
            total_deposits: money::round_cents(deposits),
            total_withdrawals: money::round_cents(withdrawals),
        })
    }

    /// Documents dated inside `[from, to]`, amounts converted to `currency`
    fn candidates(
        &self,
        docs: &[Document],
        currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> WorkflowResult<Vec<MatchCandidate>> {
        let mut out = Vec::new();
        for doc in docs {
            let Some(date) = date_field(&doc.body, "date") else {
                continue;
            };
            if date < from || date > to {
                continue;
            }
            out.push(MatchCandidate {
                id: doc.id.clone(),
                date,
                amount: self.amount_in(doc, currency)?,
                reference: doc.str_field("reference").map(str::to_string),
            });
        }
        Ok(out)
    }

    fn amount_in(&self, doc: &Document, currency: &str) -> WorkflowResult<Decimal> {
        let amount = field_or_zero(&doc.body, "amount");
        match doc.str_field("currency") {
            Some(code) if !code.eq_ignore_ascii_case(currency) => {
                Ok(self.converter.convert(amount, code, currency)?.converted)
            }
            _ => Ok(amount),
        }
    }
}

fn account_currency(account: &Document, converter: &dyn CurrencyConverter) -> String {
    account
        .str_field("currency")
        .map(str::to_string)
        .unwrap_or_else(|| converter.base_currency().to_string())
}

fn period(rec: &Document) -> WorkflowResult<(NaiveDate, NaiveDate)> {
    match (date_field(&rec.body, "periodStart"), date_field(&rec.body, "periodEnd")) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(WorkflowError::Rejected(
            "Reconciliation has no valid statement period".to_string(),
        )),
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Touches nothing but fails the batch if the reconciliation left `in_progress`
fn still_open(rec: &Document) -> BatchUpdate {
    BatchUpdate::new(RECONCILIATIONS, rec.id.clone(), Map::new()).expecting("status", IN_PROGRESS)
}

/// Both sides must still be free when the batch lands
fn match_updates(
    reconciliation_id: &ObjectId,
    transaction_id: &ObjectId,
    entry_id: &ObjectId,
    user_id: &ObjectId,
) -> Vec<BatchUpdate> {
    vec![
        BatchUpdate::new(
            BANK_TRANSACTIONS,
            transaction_id.clone(),
            patch(json!({
                "status": TX_MATCHED,
                "matchedEntryId": entry_id.as_str(),
                "reconciliationId": reconciliation_id.as_str(),
                "matchedBy": user_id.as_str(),
                "matchedAt": now_rfc3339(),
            })),
        )
        .expecting("status", TX_UNMATCHED),
        BatchUpdate::new(
            LEDGER_ENTRIES,
            entry_id.clone(),
            patch(json!({
                "matchedTransactionId": transaction_id.as_str(),
                "reconciliationId": reconciliation_id.as_str(),
            })),
        )
        .expecting_unset("matchedTransactionId"),
    ]
}

/// Undo both sides of a transaction's match
fn release_updates(tx: &Document) -> Vec<BatchUpdate> {
    let mut batch = vec![BatchUpdate::new(
        BANK_TRANSACTIONS,
        tx.id.clone(),
        patch(json!({
            "status": TX_UNMATCHED,
            "matchedEntryId": null,
            "reconciliationId": null,
            "matchedBy": null,
            "matchedAt": null,
        })),
    )
    .expecting("status", TX_MATCHED)];
    if let Some(entry_id) = tx.str_field("matchedEntryId").and_then(|raw| ObjectId::parse(raw).ok()) {
        batch.push(
            BatchUpdate::new(
                LEDGER_ENTRIES,
                entry_id,
                patch(json!({ "matchedTransactionId": null, "reconciliationId": null })),
            )
            .expecting("matchedTransactionId", tx.id.as_str()),
        );
    }
    batch
}
