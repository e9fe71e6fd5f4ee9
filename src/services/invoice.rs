use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::auth::Role;
use crate::middleware::AuthUser;
use crate::money::{self, field_or_zero, parse_decimal, round_cents};
use crate::store::collections::INVOICES;
use crate::store::{Document, DocumentStore};
use crate::validation::{ObjectId, ValidationErrors};

pub const DRAFT: &str = "draft";
pub const SENT: &str = "sent";
pub const PARTIALLY_PAID: &str = "partially_paid";
pub const PAID: &str = "paid";
pub const VOID: &str = "void";

pub const PAYMENT_METHODS: &[&str] = &["bank_transfer", "card", "cash", "cheque", "trust_transfer", "other"];

/// Roles allowed to send, take payments on and void invoices
pub const BILLING_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Partner, Role::Accountant];

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
}

impl InvoiceTotals {
    pub fn to_patch(&self) -> Map<String, Value> {
        patch(json!({
            "subtotal": money::to_value(self.subtotal),
            "discount": money::to_value(self.discount),
            "taxAmount": money::to_value(self.tax_amount),
            "total": money::to_value(self.total),
            "amountPaid": money::to_value(self.amount_paid),
            "balanceDue": money::to_value(self.balance_due),
        }))
    }
}

/// Totals from already-validated line items, discount, tax rate and payments.
/// Line products are summed exactly; only the subtotal is rounded.
pub fn compute_totals(body: &Map<String, Value>) -> Result<InvoiceTotals, ValidationErrors> {
    let exact_subtotal: Decimal = body
        .get("lineItems")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let quantity = item.get("quantity").and_then(parse_decimal).unwrap_or_default();
                    let unit_price = item.get("unitPrice").and_then(parse_decimal).unwrap_or_default();
                    quantity * unit_price
                })
                .sum::<Decimal>()
        })
        .unwrap_or_default();
    let subtotal = round_cents(exact_subtotal);

    let discount = field_or_zero(body, "discount");
    if discount > subtotal {
        return Err(ValidationErrors::single("discount", "Cannot exceed the invoice subtotal"));
    }

    let tax_rate = field_or_zero(body, "taxRate");
    let taxable = subtotal - discount;
    let tax_amount = round_cents(taxable * tax_rate / Decimal::ONE_HUNDRED);
    let total = round_cents(taxable + tax_amount);
    let amount_paid = field_or_zero(body, "amountPaid");

    Ok(InvoiceTotals {
        subtotal,
        discount: round_cents(discount),
        tax_amount,
        total,
        amount_paid,
        balance_due: round_cents(total - amount_paid),
    })
}

/// A payment posted against an invoice
#[derive(Debug, Clone)]
pub struct Payment {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: Option<String>,
    pub reference: Option<String>,
}

pub struct InvoiceService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> InvoiceService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn send(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let invoice = load_in_scope(self.store, INVOICES, &user.scope, id, "Invoice").await?;
        ensure_status(&invoice, "send", &[DRAFT])?;

        if field_or_zero(&invoice.body, "total") <= Decimal::ZERO {
            return Err(WorkflowError::Rejected("Cannot send an invoice with a zero total".to_string()));
        }

        let updated = self
            .store
            .update(
                INVOICES,
                &user.scope,
                id,
                patch(json!({
                    "status": SENT,
                    "sentAt": now_rfc3339(),
                    "sentBy": user.user_id.as_str(),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Invoice"))?;

        tracing::info!(invoice = %id, "Invoice sent");
        Ok(updated)
    }

    pub async fn record_payment(&self, user: &AuthUser, id: &ObjectId, payment: Payment) -> WorkflowResult<Document> {
        let invoice = load_in_scope(self.store, INVOICES, &user.scope, id, "Invoice").await?;
        ensure_status(&invoice, "record a payment", &[SENT, PARTIALLY_PAID])?;

        let totals = compute_totals(&invoice.body)?;
        if payment.amount <= Decimal::ZERO {
            return Err(ValidationErrors::single("amount", "Must be greater than zero").into());
        }
        if payment.amount > totals.balance_due {
            return Err(ValidationErrors::single(
                "amount",
                format!("Cannot exceed the balance due of {}", totals.balance_due),
            )
            .into());
        }

        let amount_paid = round_cents(totals.amount_paid + payment.amount);
        let balance_due = round_cents(totals.total - amount_paid);
        let status = if balance_due.is_zero() { PAID } else { PARTIALLY_PAID };

        let mut payments = match invoice.get("payments") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        payments.push(json!({
            "amount": money::to_value(payment.amount),
            "date": payment.date.to_string(),
            "method": payment.method,
            "reference": payment.reference,
            "recordedBy": user.user_id.as_str(),
            "recordedAt": now_rfc3339(),
        }));

        let mut changes = patch(json!({
            "payments": payments,
            "amountPaid": money::to_value(amount_paid),
            "balanceDue": money::to_value(balance_due),
            "status": status,
            "updatedBy": user.user_id.as_str(),
        }));
        if status == PAID {
            changes.insert("paidAt".to_string(), Value::String(now_rfc3339()));
        }

        let updated = self
            .store
            .update(INVOICES, &user.scope, id, changes)
            .await?
            .ok_or(WorkflowError::NotFound("Invoice"))?;

        tracing::info!(invoice = %id, amount = %payment.amount, status, "Payment recorded");
        Ok(updated)
    }

    pub async fn void(&self, user: &AuthUser, id: &ObjectId, reason: Option<String>) -> WorkflowResult<Document> {
        let invoice = load_in_scope(self.store, INVOICES, &user.scope, id, "Invoice").await?;
        ensure_status(&invoice, "void", &[DRAFT, SENT])?;

        if field_or_zero(&invoice.body, "amountPaid") > Decimal::ZERO {
            return Err(WorkflowError::Conflict(
                "Cannot void an invoice that has payments".to_string(),
            ));
        }

        let updated = self
            .store
            .update(
                INVOICES,
                &user.scope,
                id,
                patch(json!({
                    "status": VOID,
                    "voidedAt": now_rfc3339(),
                    "voidedBy": user.user_id.as_str(),
                    "voidReason": reason,
                    "balanceDue": 0,
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Invoice"))?;

        tracing::info!(invoice = %id, "Invoice voided");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::store::MemoryStore;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn totals_apply_discount_before_tax() {
        let totals = compute_totals(&body(json!({
            "lineItems": [
                { "description": "Drafting", "quantity": 2, "unitPrice": 150 },
                { "description": "Filing fee", "quantity": 1, "unitPrice": 45.5 }
            ],
            "discount": 45.5,
            "taxRate": 15
        })))
        .unwrap();

        assert_eq!(totals.subtotal, Decimal::new(3455, 1));
        assert_eq!(totals.tax_amount, Decimal::new(45, 0));
        assert_eq!(totals.total, Decimal::new(345, 0));
        assert_eq!(totals.balance_due, Decimal::new(345, 0));
    }

    #[test]
    fn subtotal_rounds_the_sum_not_each_line() {
        let half_cent = json!({ "description": "Copy", "quantity": 0.5, "unitPrice": 0.01 });
        let totals = compute_totals(&body(json!({
            "lineItems": [half_cent.clone(), half_cent.clone(), half_cent]
        })))
        .unwrap();
        assert_eq!(totals.subtotal, Decimal::new(2, 2));
        assert_eq!(totals.total, Decimal::new(2, 2));
    }

    #[test]
    fn fractional_quantities_bill_at_full_precision() {
        let totals = compute_totals(&body(json!({
            "lineItems": [{ "description": "Research", "quantity": 0.333, "unitPrice": 300 }],
            "taxRate": 15
        })))
        .unwrap();
        assert_eq!(totals.subtotal, Decimal::new(9990, 2));
        // 99.90 * 15% = 14.985
        assert_eq!(totals.tax_amount, Decimal::new(1499, 2));
        assert_eq!(totals.total, Decimal::new(11489, 2));
    }

    #[test]
    fn discount_cannot_exceed_subtotal() {
        let err = compute_totals(&body(json!({
            "lineItems": [{ "description": "Advice", "quantity": 1, "unitPrice": 100 }],
            "discount": 150
        })))
        .unwrap_err();
        assert!(err.get("discount").is_some());
    }

    #[tokio::test]
    async fn payments_settle_the_invoice() {
        let store = MemoryStore::new();
        let user = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Accountant, 1));
        let mut invoice_body = body(json!({
            "lineItems": [{ "description": "Advice", "quantity": 1, "unitPrice": 200 }],
            "status": "draft"
        }));
        let totals = compute_totals(&invoice_body).unwrap();
        invoice_body.extend(totals.to_patch());
        let invoice = store
            .insert(INVOICES, Document::new(&user.scope, &user.user_id, invoice_body))
            .await
            .unwrap();

        let service = InvoiceService::new(&store);
        service.send(&user, &invoice.id).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let partial = service
            .record_payment(&user, &invoice.id, Payment { amount: Decimal::new(50, 0), date, method: None, reference: None })
            .await
            .unwrap();
        assert_eq!(partial.status(), PARTIALLY_PAID);

        let too_much = service
            .record_payment(&user, &invoice.id, Payment { amount: Decimal::new(500, 0), date, method: None, reference: None })
            .await
            .unwrap_err();
        assert!(matches!(too_much, WorkflowError::Validation(_)));

        let paid = service
            .record_payment(&user, &invoice.id, Payment { amount: Decimal::new(150, 0), date, method: None, reference: None })
            .await
            .unwrap();
        assert_eq!(paid.status(), PAID);
        assert_eq!(field_or_zero(&paid.body, "balanceDue"), Decimal::ZERO);

        let err = service.void(&user, &invoice.id, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }
}
