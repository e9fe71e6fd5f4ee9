//! Collection names shared by the resource registry, observers and services

pub const CLIENTS: &str = "clients";
pub const CASES: &str = "cases";
pub const ACCOUNTS: &str = "accounts";
pub const LEDGER_ENTRIES: &str = "ledger_entries";
pub const BANK_TRANSACTIONS: &str = "bank_transactions";
pub const RECONCILIATIONS: &str = "reconciliations";
pub const EMPLOYEES: &str = "employees";
pub const LEAVE_BALANCES: &str = "leave_balances";
pub const LEAVE_REQUESTS: &str = "leave_requests";
pub const PROBATIONS: &str = "probations";
pub const ONBOARDING: &str = "onboarding";
pub const INVOICES: &str = "invoices";
pub const REFERRALS: &str = "referrals";
pub const REPORTS: &str = "reports";
pub const QUALITY_INSPECTIONS: &str = "quality_inspections";
pub const INTEGRATIONS: &str = "integrations";

/// Users live in the identity service; ids referencing them are format-checked only
pub const USERS: &str = "users";
