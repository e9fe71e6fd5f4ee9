use crate::auth::Role;
use crate::services::integration::{INTEGRATION_ROLES, PROVIDERS};
use crate::services::invoice::BILLING_ROLES;
use crate::services::leave::LEAVE_TYPES;
use crate::services::probation::HR_ROLES as HR;
use crate::services::reconciliation::ACCOUNTING_ROLES as ACCOUNTING;
use crate::services::referral::FEE_TYPES;
use crate::store::collections::*;
use crate::validation::{FieldDef, FieldKind};

use super::def::ResourceDef;

use FieldKind::*;

const fn f(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef::new(name, kind)
}

const NAME: FieldKind = Text { max: 200 };
const SHORT: FieldKind = Text { max: 100 };
const NOTES: FieldKind = Text { max: 5000 };
const LONG: FieldKind = Text { max: 10000 };
const PERCENT: FieldKind = Number { min: 0.0, max: 100.0 };
const DAYS: FieldKind = Number { min: 0.0, max: 366.0 };

const MANAGEMENT: &[Role] = &[Role::Owner, Role::Admin, Role::Partner];
const ANY_MEMBER: &[Role] = &[];

pub static CLIENTS_DEF: ResourceDef = ResourceDef {
    segment: "clients",
    collection: CLIENTS,
    label: "Client",
    fields: &[
        f("name", NAME),
        f("email", Email),
        f("phone", Text { max: 40 }),
        f("address", Text { max: 500 }),
        f("type", Enum(&["individual", "company"])),
        f("notes", NOTES),
    ],
    updatable: &["name", "email", "phone", "address", "type", "notes"],
    required: &["name"],
    filterable: &["type", "email"],
    sortable: &["name"],
    write_roles: ANY_MEMBER,
    allow_delete: true,
};

pub static CASES_DEF: ResourceDef = ResourceDef {
    segment: "cases",
    collection: CASES,
    label: "Case",
    fields: &[
        f("title", NAME),
        f("caseNumber", Text { max: 50 }),
        f("clientId", Ref(CLIENTS)),
        f("status", Enum(&["open", "pending", "closed", "archived"])),
        f("practiceArea", SHORT),
        f("priority", Enum(&["low", "medium", "high", "urgent"])),
        f("assignedTo", RefList(USERS)),
        f("openedAt", Date),
        f("closedAt", Date),
        f("description", LONG),
    ],
    updatable: &[
        "title",
        "caseNumber",
        "clientId",
        "status",
        "practiceArea",
        "priority",
        "assignedTo",
        "openedAt",
        "closedAt",
        "description",
    ],
    required: &["title"],
    filterable: &["status", "clientId", "practiceArea", "priority"],
    sortable: &["title", "openedAt", "status", "priority"],
    write_roles: ANY_MEMBER,
    allow_delete: true,
};

pub static ACCOUNTS_DEF: ResourceDef = ResourceDef {
    segment: "accounts",
    collection: ACCOUNTS,
    label: "Account",
    fields: &[
        f("name", NAME),
        f("type", Enum(&["bank", "ledger", "trust", "operating"])),
        f("currency", Currency),
        f("accountNumber", Text { max: 50 }),
        f("institution", NAME),
        f("openingBalance", SignedMoney),
        f("isActive", Boolean),
    ],
    updatable: &["name", "accountNumber", "institution", "isActive"],
    required: &["name", "type"],
    filterable: &["type", "currency", "isActive"],
    sortable: &["name"],
    write_roles: ACCOUNTING,
    allow_delete: true,
};

pub static LEDGER_ENTRIES_DEF: ResourceDef = ResourceDef {
    segment: "ledger-entries",
    collection: LEDGER_ENTRIES,
    label: "Ledger entry",
    fields: &[
        f("accountId", Ref(ACCOUNTS)),
        f("date", Date),
        f("amount", SignedMoney),
        f("currency", Currency),
        f("description", Text { max: 500 }),
        f("reference", SHORT),
        f("category", SHORT),
    ],
    updatable: &["date", "amount", "description", "reference", "category"],
    required: &["accountId", "date", "amount"],
    filterable: &["accountId", "reconciliationId", "category"],
    sortable: &["date", "amount"],
    write_roles: ACCOUNTING,
    allow_delete: true,
};

pub static BANK_TRANSACTIONS_DEF: ResourceDef = ResourceDef {
    segment: "bank-transactions",
    collection: BANK_TRANSACTIONS,
    label: "Bank transaction",
    fields: &[
        f("accountId", Ref(ACCOUNTS)),
        f("date", Date),
        f("amount", SignedMoney),
        f("currency", Currency),
        f("description", Text { max: 500 }),
        f("reference", SHORT),
        f("payee", NAME),
    ],
    updatable: &["date", "amount", "description", "reference", "payee"],
    required: &["accountId", "date", "amount"],
    filterable: &["accountId", "status", "reconciliationId"],
    sortable: &["date", "amount"],
    write_roles: ACCOUNTING,
    allow_delete: true,
};

pub static RECONCILIATIONS_DEF: ResourceDef = ResourceDef {
    segment: "reconciliations",
    collection: RECONCILIATIONS,
    label: "Reconciliation",
    fields: &[
        f("accountId", Ref(ACCOUNTS)),
        f("periodStart", Date),
        f("periodEnd", Date),
        f("statementBalance", SignedMoney),
        f("openingBalance", SignedMoney),
        f("notes", NOTES),
    ],
    updatable: &["periodStart", "periodEnd", "statementBalance", "openingBalance", "notes"],
    required: &["accountId", "periodStart", "periodEnd", "statementBalance"],
    filterable: &["accountId", "status"],
    sortable: &["periodStart", "periodEnd"],
    write_roles: ACCOUNTING,
    allow_delete: true,
};

pub static EMPLOYEES_DEF: ResourceDef = ResourceDef {
    segment: "employees",
    collection: EMPLOYEES,
    label: "Employee",
    fields: &[
        f("firstName", SHORT),
        f("lastName", SHORT),
        f("email", Email),
        f("phone", Text { max: 40 }),
        f("userId", Ref(USERS)),
        f("position", SHORT),
        f("department", SHORT),
        f("hireDate", Date),
        f("employmentType", Enum(&["full_time", "part_time", "contractor", "intern"])),
        f("managerId", Ref(EMPLOYEES)),
        f("salary", Money),
        f("currency", Currency),
        f("status", Enum(&["active", "on_leave", "terminated"])),
    ],
    updatable: &[
        "firstName",
        "lastName",
        "email",
        "phone",
        "userId",
        "position",
        "department",
        "hireDate",
        "employmentType",
        "managerId",
        "salary",
        "currency",
        "status",
    ],
    required: &["firstName", "lastName", "email"],
    filterable: &["department", "employmentType", "status", "managerId", "userId"],
    sortable: &["lastName", "firstName", "hireDate"],
    write_roles: HR,
    allow_delete: true,
};

pub static LEAVE_BALANCES_DEF: ResourceDef = ResourceDef {
    segment: "leave-balances",
    collection: LEAVE_BALANCES,
    label: "Leave balance",
    fields: &[
        f("employeeId", Ref(EMPLOYEES)),
        f("leaveType", Enum(LEAVE_TYPES)),
        f("year", Integer { min: 2000, max: 2100 }),
        f("entitled", DAYS),
        f("carriedOver", DAYS),
    ],
    updatable: &["entitled", "carriedOver"],
    required: &["employeeId", "leaveType", "year", "entitled"],
    filterable: &["employeeId", "leaveType", "year"],
    sortable: &["year"],
    write_roles: HR,
    allow_delete: true,
};

pub static LEAVE_REQUESTS_DEF: ResourceDef = ResourceDef {
    segment: "leave-requests",
    collection: LEAVE_REQUESTS,
    label: "Leave request",
    fields: &[
        f("employeeId", Ref(EMPLOYEES)),
        f("leaveType", Enum(LEAVE_TYPES)),
        f("startDate", Date),
        f("endDate", Date),
        f("halfDay", Boolean),
        f("reason", Text { max: 2000 }),
    ],
    updatable: &["reason"],
    required: &["employeeId", "leaveType", "startDate", "endDate"],
    filterable: &["employeeId", "leaveType", "status"],
    sortable: &["startDate"],
    write_roles: ANY_MEMBER,
    allow_delete: false,
};

pub static PROBATIONS_DEF: ResourceDef = ResourceDef {
    segment: "probations",
    collection: PROBATIONS,
    label: "Probation",
    fields: &[
        f("employeeId", Ref(EMPLOYEES)),
        f("startDate", Date),
        f("endDate", Date),
        f("reviewerId", Ref(USERS)),
        f("objectives", TextList),
        f("notes", NOTES),
    ],
    updatable: &["reviewerId", "objectives", "notes"],
    required: &["employeeId", "startDate", "endDate"],
    filterable: &["employeeId", "status", "reviewerId"],
    sortable: &["startDate", "endDate"],
    write_roles: HR,
    allow_delete: true,
};

pub static ONBOARDING_DEF: ResourceDef = ResourceDef {
    segment: "onboarding",
    collection: ONBOARDING,
    label: "Onboarding",
    fields: &[
        f("employeeId", Ref(EMPLOYEES)),
        f("checklist", TextList),
        f("completedItems", TextList),
        f("assignedTo", Ref(USERS)),
        f("dueDate", Date),
        f("status", Enum(&["not_started", "in_progress", "completed"])),
        f("notes", NOTES),
    ],
    updatable: &["checklist", "completedItems", "assignedTo", "dueDate", "status", "notes"],
    required: &["employeeId"],
    filterable: &["employeeId", "status", "assignedTo"],
    sortable: &["dueDate"],
    write_roles: HR,
    allow_delete: true,
};

pub static INVOICES_DEF: ResourceDef = ResourceDef {
    segment: "invoices",
    collection: INVOICES,
    label: "Invoice",
    fields: &[
        f("clientId", Ref(CLIENTS)),
        f("caseId", Ref(CASES)),
        f("issueDate", Date),
        f("dueDate", Date),
        f("currency", Currency),
        f("lineItems", LineItems),
        f("taxRate", PERCENT),
        f("discount", Money),
        f("notes", NOTES),
    ],
    updatable: &["caseId", "issueDate", "dueDate", "currency", "lineItems", "taxRate", "discount", "notes"],
    required: &["clientId", "issueDate", "dueDate", "lineItems"],
    filterable: &["clientId", "caseId", "status", "currency"],
    sortable: &["issueDate", "dueDate", "total", "invoiceNumber"],
    write_roles: BILLING_ROLES,
    allow_delete: true,
};

pub static REFERRALS_DEF: ResourceDef = ResourceDef {
    segment: "referrals",
    collection: REFERRALS,
    label: "Referral",
    fields: &[
        f("referrerName", NAME),
        f("referrerEmail", Email),
        f("referrerFirm", NAME),
        f("clientId", Ref(CLIENTS)),
        f("caseId", Ref(CASES)),
        f("feeType", Enum(FEE_TYPES)),
        f("feeRate", PERCENT),
        f("flatFee", Money),
        f("matterValue", Money),
        f("maxFee", Money),
        f("notes", NOTES),
    ],
    updatable: &[
        "referrerName",
        "referrerEmail",
        "referrerFirm",
        "clientId",
        "caseId",
        "feeType",
        "feeRate",
        "flatFee",
        "matterValue",
        "maxFee",
        "notes",
    ],
    required: &["referrerName", "feeType"],
    filterable: &["status", "feeType", "clientId", "caseId"],
    sortable: &["referrerName", "fee"],
    write_roles: ANY_MEMBER,
    allow_delete: true,
};

pub static REPORTS_DEF: ResourceDef = ResourceDef {
    segment: "reports",
    collection: REPORTS,
    label: "Report",
    fields: &[
        f("title", NAME),
        f("type", Enum(&["financial", "billing", "hr", "case", "custom"])),
        f("periodStart", Date),
        f("periodEnd", Date),
        f("parameters", Object),
        f("description", NOTES),
    ],
    updatable: &["title", "periodStart", "periodEnd", "parameters", "description"],
    required: &["title", "type"],
    filterable: &["type", "status"],
    sortable: &["title", "periodEnd"],
    write_roles: ANY_MEMBER,
    allow_delete: true,
};

pub static QUALITY_INSPECTIONS_DEF: ResourceDef = ResourceDef {
    segment: "quality-inspections",
    collection: QUALITY_INSPECTIONS,
    label: "Quality inspection",
    fields: &[
        f("caseId", Ref(CASES)),
        f("inspectorId", Ref(USERS)),
        f("inspectionDate", Date),
        f("score", PERCENT),
        f("findings", LONG),
        f("outcome", Enum(&["pass", "fail", "needs_improvement"])),
        f("followUpDate", Date),
    ],
    updatable: &["inspectorId", "inspectionDate", "score", "findings", "outcome", "followUpDate"],
    required: &["caseId", "inspectionDate"],
    filterable: &["caseId", "outcome", "inspectorId"],
    sortable: &["inspectionDate", "score"],
    write_roles: MANAGEMENT,
    allow_delete: true,
};

pub static INTEGRATIONS_DEF: ResourceDef = ResourceDef {
    segment: "integrations",
    collection: INTEGRATIONS,
    label: "Integration",
    fields: &[f("provider", Enum(PROVIDERS)), f("settings", Object)],
    updatable: &["settings"],
    required: &["provider"],
    filterable: &["provider", "status"],
    sortable: &["provider"],
    write_roles: INTEGRATION_ROLES,
    allow_delete: true,
};

/// Every resource served by the generic controllers
pub static RESOURCES: [&ResourceDef; 16] = [
    &CLIENTS_DEF,
    &CASES_DEF,
    &ACCOUNTS_DEF,
    &LEDGER_ENTRIES_DEF,
    &BANK_TRANSACTIONS_DEF,
    &RECONCILIATIONS_DEF,
    &EMPLOYEES_DEF,
    &LEAVE_BALANCES_DEF,
    &LEAVE_REQUESTS_DEF,
    &PROBATIONS_DEF,
    &ONBOARDING_DEF,
    &INVOICES_DEF,
    &REFERRALS_DEF,
    &REPORTS_DEF,
    &QUALITY_INSPECTIONS_DEF,
    &INTEGRATIONS_DEF,
];

pub fn find(segment: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().copied().find(|def| def.segment == segment)
}

/// Collections this service stores; references to anything else are format-checked only
pub fn is_stored_collection(collection: &str) -> bool {
    RESOURCES.iter().any(|def| def.collection == collection)
}
