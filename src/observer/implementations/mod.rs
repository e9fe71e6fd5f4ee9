// Observer implementations organized by rings
// Each ring handles a specific phase of a write

// Ring 1: Input Validation - cross-field checks
#[path = "1/date_order.rs"]
pub mod date_order;

// Ring 3: Business - uniqueness, status locks, domain rules
#[path = "3/leave_request_rules.rs"]
pub mod leave_request_rules;
#[path = "3/reconciliation_rules.rs"]
pub mod reconciliation_rules;
#[path = "3/status_lock.rs"]
pub mod status_lock;
#[path = "3/unique_fields.rs"]
pub mod unique_fields;

// Ring 4: Enrichment - defaults and computed fields
#[path = "4/account_defaults.rs"]
pub mod account_defaults;
#[path = "4/billing.rs"]
pub mod billing;
#[path = "4/field_defaults.rs"]
pub mod field_defaults;

// Ring 6: Post-Database - follow-up writes
#[path = "6/leave_balance_reservation.rs"]
pub mod leave_balance_reservation;

pub use account_defaults::*;
pub use billing::*;
pub use date_order::*;
pub use field_defaults::*;
pub use leave_balance_reservation::*;
pub use leave_request_rules::*;
pub use reconciliation_rules::*;
pub use status_lock::*;
pub use unique_fields::*;

use crate::observer::traits::{Observer, Operation};
use crate::store::collections::*;

/// Every built-in resource rule
pub fn default_observers() -> Vec<Box<dyn Observer>> {
    let mut observers: Vec<Box<dyn Observer>> = vec![
        // Ring 1
        Box::new(DateOrderObserver::new(RECONCILIATIONS, "periodStart", "periodEnd", false)),
        Box::new(DateOrderObserver::new(PROBATIONS, "startDate", "endDate", true)),
        Box::new(DateOrderObserver::new(REPORTS, "periodStart", "periodEnd", false)),
        Box::new(DateOrderObserver::new(INVOICES, "issueDate", "dueDate", false)),
        // Ring 3
        Box::new(UniqueFieldsObserver {
            collection: EMPLOYEES,
            fields: &["email"],
            message: "An employee with this email already exists",
        }),
        Box::new(UniqueFieldsObserver {
            collection: LEAVE_BALANCES,
            fields: &["employeeId", "leaveType", "year"],
            message: "A balance for this employee, leave type and year already exists",
        }),
        Box::new(UniqueFieldsObserver {
            collection: INTEGRATIONS,
            fields: &["provider"],
            message: "An integration for this provider already exists",
        }),
        Box::new(SingleOpenReconciliationObserver),
        Box::new(LeaveRequestRulesObserver),
        Box::new(MatchedEntryLockObserver),
        // Ring 4
        Box::new(BaseCurrencyObserver),
        Box::new(TransactionCurrencyObserver),
        Box::new(ReconciliationOpeningObserver),
        Box::new(InvoiceTotalsObserver),
        Box::new(ReferralFeeObserver),
        // Ring 6
        Box::new(LeaveBalanceReservationObserver),
    ];

    for lock in status_locks() {
        observers.push(Box::new(lock));
    }
    for defaults in FieldDefaultsObserver::all() {
        observers.push(Box::new(defaults));
    }
    observers
}

fn status_locks() -> Vec<StatusLockObserver> {
    let lock = |collection: &'static str,
                operation: Operation,
                allowed: &'static [&'static str],
                message: &'static str| StatusLockObserver {
        collection,
        operation,
        allowed,
        message,
    };
    vec![
        lock(INVOICES, Operation::Update, &["draft"], "Only draft invoices can be edited"),
        lock(INVOICES, Operation::Delete, &["draft"], "Only draft invoices can be deleted"),
        lock(
            RECONCILIATIONS,
            Operation::Update,
            &["in_progress"],
            "Only reconciliations in progress can be edited",
        ),
        lock(
            RECONCILIATIONS,
            Operation::Delete,
            &["cancelled"],
            "Only cancelled reconciliations can be deleted; cancel it first",
        ),
        lock(
            REFERRALS,
            Operation::Update,
            &["pending", "accepted", "declined"],
            "Paid referrals cannot be edited",
        ),
        lock(
            BANK_TRANSACTIONS,
            Operation::Update,
            &["unmatched"],
            "Matched or reconciled transactions cannot be edited",
        ),
        lock(
            BANK_TRANSACTIONS,
            Operation::Delete,
            &["unmatched"],
            "Matched or reconciled transactions cannot be deleted",
        ),
        lock(LEAVE_REQUESTS, Operation::Update, &["pending"], "Only pending leave requests can be edited"),
        lock(
            PROBATIONS,
            Operation::Update,
            &["active", "extended"],
            "Completed probations cannot be edited",
        ),
    ]
}
