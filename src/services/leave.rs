use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::auth::Role;
use crate::middleware::AuthUser;
use crate::money::{self, field_or_zero};
use crate::store::collections::{EMPLOYEES, LEAVE_BALANCES, LEAVE_REQUESTS};
use crate::store::{BatchUpdate, Document, DocumentStore, Query, StoreError};
use crate::tenant::TenantScope;
use crate::validation::fields::date_field;
use crate::validation::{ObjectId, ValidationErrors};

pub const LEAVE_TYPES: &[&str] = &["annual", "sick", "personal", "parental", "unpaid"];

pub const PENDING: &str = "pending";
pub const APPROVED: &str = "approved";
pub const REJECTED: &str = "rejected";
pub const CANCELLED: &str = "cancelled";

/// Roles allowed to decide on someone else's leave
pub const APPROVER_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Hr];

/// Business days between two dates inclusive, weekends excluded
pub fn business_days(start: NaiveDate, end: NaiveDate, half_day: bool) -> Result<Decimal, ValidationErrors> {
    if end < start {
        return Err(ValidationErrors::single("endDate", "Must be on or after startDate"));
    }
    if start.year() != end.year() {
        return Err(ValidationErrors::single(
            "endDate",
            "Leave cannot span calendar years; submit one request per year",
        ));
    }
    if half_day && start != end {
        return Err(ValidationErrors::single("halfDay", "Half-day leave must start and end on the same day"));
    }

    let weekdays = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count();
    if weekdays == 0 {
        return Err(ValidationErrors::single("startDate", "Leave period contains no business days"));
    }

    if half_day {
        Ok(Decimal::new(5, 1))
    } else {
        Ok(Decimal::from(weekdays as u64))
    }
}

/// `entitled + carriedOver - used - pending`
pub fn available(balance: &Document) -> Decimal {
    field_or_zero(&balance.body, "entitled") + field_or_zero(&balance.body, "carriedOver")
        - field_or_zero(&balance.body, "used")
        - field_or_zero(&balance.body, "pending")
}

pub fn balance_summary(balance: &Document) -> Value {
    json!({
        "_id": balance.id.as_str(),
        "employeeId": balance.get("employeeId"),
        "leaveType": balance.get("leaveType"),
        "year": balance.get("year"),
        "entitled": money::to_value(field_or_zero(&balance.body, "entitled")),
        "carriedOver": money::to_value(field_or_zero(&balance.body, "carriedOver")),
        "used": money::to_value(field_or_zero(&balance.body, "used")),
        "pending": money::to_value(field_or_zero(&balance.body, "pending")),
        "available": money::to_value(available(balance)),
    })
}

pub fn needs_balance(leave_type: &str) -> bool {
    leave_type != "unpaid"
}

pub async fn find_balance(
    store: &dyn DocumentStore,
    scope: &TenantScope,
    employee_id: &str,
    leave_type: &str,
    year: i32,
) -> Result<Option<Document>, StoreError> {
    let query = Query::new()
        .eq("employeeId", employee_id)
        .eq("leaveType", leave_type)
        .eq("year", year)
        .page(0, 1);
    Ok(store.find(LEAVE_BALANCES, scope, &query).await?.into_iter().next())
}

/// Shift a balance's pending and used counters, never below zero.
/// The write only lands if both counters still hold the values read here.
pub fn balance_update(balance: &Document, pending_delta: Decimal, used_delta: Decimal) -> BatchUpdate {
    let pending = (field_or_zero(&balance.body, "pending") + pending_delta).max(Decimal::ZERO);
    let used = (field_or_zero(&balance.body, "used") + used_delta).max(Decimal::ZERO);
    let update = BatchUpdate::new(
        LEAVE_BALANCES,
        balance.id.clone(),
        patch(json!({
            "pending": money::to_value(pending),
            "used": money::to_value(used),
        })),
    );
    ["pending", "used"].into_iter().fold(update, |update, field| match balance.get(field) {
        Some(value) => update.expecting(field, value.clone()),
        None => update.expecting_unset(field),
    })
}

/// Hold `days` against the balance. Re-reads and re-checks availability when
/// another writer moved the counters first.
pub async fn reserve_days(
    store: &dyn DocumentStore,
    scope: &TenantScope,
    request: &Document,
) -> WorkflowResult<()> {
    let leave_type = request.str_field("leaveType").unwrap_or_default();
    let (Some(employee_id), Some(start)) = (request.str_field("employeeId"), date_field(&request.body, "startDate"))
    else {
        return Ok(());
    };
    if !needs_balance(leave_type) {
        return Ok(());
    }
    let days = field_or_zero(&request.body, "days");

    let mut attempt = 1;
    loop {
        let Some(balance) = find_balance(store, scope, employee_id, leave_type, start.year()).await? else {
            return Ok(());
        };
        let available = available(&balance);
        if available < days {
            return Err(WorkflowError::Rejected(format!(
                "Insufficient {} leave balance: {} day(s) available, {} requested",
                leave_type, available, days
            )));
        }

        match store.apply_batch(scope, vec![balance_update(&balance, days, Decimal::ZERO)]).await {
            Ok(()) => {
                tracing::debug!(request = %request.id, balance = %balance.id, %days, "Leave days reserved");
                return Ok(());
            }
            Err(StoreError::Conflict(msg)) if attempt < RESERVE_ATTEMPTS => {
                tracing::debug!(request = %request.id, attempt, "Balance moved, retrying reservation: {}", msg);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

const RESERVE_ATTEMPTS: u32 = 5;

/// Approve, reject and cancel leave requests, keeping balances in step
pub struct LeaveService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LeaveService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn approve(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let request = load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await?;
        ensure_status(&request, "approve", &[PENDING])?;

        let employee = self.employee_of(&user.scope, &request).await?;
        if employee.str_field("userId") == Some(user.user_id.as_str()) {
            return Err(WorkflowError::Forbidden(
                "You cannot approve your own leave request".to_string(),
            ));
        }

        let days = field_or_zero(&request.body, "days");
        let mut batch = Vec::new();
        if let Some(balance) = self.balance_for(&user.scope, &request).await? {
            batch.push(balance_update(&balance, -days, days));
        }
        batch.push(
            BatchUpdate::new(
                LEAVE_REQUESTS,
                request.id.clone(),
                patch(json!({
                    "status": APPROVED,
                    "approvedBy": user.user_id.as_str(),
                    "approvedAt": now_rfc3339(),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .expecting("status", PENDING),
        );
        self.store.apply_batch(&user.scope, batch).await?;

        tracing::info!(request = %request.id, approver = %user.user_id, %days, "Leave approved");
        load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await
    }

    pub async fn reject(&self, user: &AuthUser, id: &ObjectId, reason: Option<String>) -> WorkflowResult<Document> {
        let request = load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await?;
        ensure_status(&request, "reject", &[PENDING])?;

        let days = field_or_zero(&request.body, "days");
        let mut batch = Vec::new();
        if let Some(balance) = self.balance_for(&user.scope, &request).await? {
            batch.push(balance_update(&balance, -days, Decimal::ZERO));
        }
        batch.push(
            BatchUpdate::new(
                LEAVE_REQUESTS,
                request.id.clone(),
                patch(json!({
                    "status": REJECTED,
                    "rejectedBy": user.user_id.as_str(),
                    "rejectedAt": now_rfc3339(),
                    "rejectionReason": reason,
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .expecting("status", PENDING),
        );
        self.store.apply_batch(&user.scope, batch).await?;

        tracing::info!(request = %request.id, "Leave rejected");
        load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await
    }

    /// The employee themselves or an approver may cancel
    pub async fn cancel(&self, user: &AuthUser, id: &ObjectId) -> WorkflowResult<Document> {
        let request = load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await?;
        ensure_status(&request, "cancel", &[PENDING, APPROVED])?;

        let employee = self.employee_of(&user.scope, &request).await?;
        let own_request = employee.str_field("userId") == Some(user.user_id.as_str());
        if !own_request && !user.has_role(APPROVER_ROLES) {
            return Err(WorkflowError::Forbidden(
                "Only the employee or an approver can cancel this request".to_string(),
            ));
        }

        let days = field_or_zero(&request.body, "days");
        let (pending_delta, used_delta) = if request.status() == APPROVED {
            let starts = date_field(&request.body, "startDate");
            if starts.map_or(true, |start| start <= Utc::now().date_naive()) {
                return Err(WorkflowError::Conflict(
                    "Leave that has already started cannot be cancelled".to_string(),
                ));
            }
            (Decimal::ZERO, -days)
        } else {
            (-days, Decimal::ZERO)
        };

        let mut batch = Vec::new();
        if let Some(balance) = self.balance_for(&user.scope, &request).await? {
            batch.push(balance_update(&balance, pending_delta, used_delta));
        }
        batch.push(
            BatchUpdate::new(
                LEAVE_REQUESTS,
                request.id.clone(),
                patch(json!({
                    "status": CANCELLED,
                    "cancelledBy": user.user_id.as_str(),
                    "cancelledAt": now_rfc3339(),
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .expecting("status", request.status()),
        );
        self.store.apply_batch(&user.scope, batch).await?;

        tracing::info!(request = %request.id, "Leave cancelled");
        load_in_scope(self.store, LEAVE_REQUESTS, &user.scope, id, "Leave request").await
    }

    async fn employee_of(&self, scope: &TenantScope, request: &Document) -> WorkflowResult<Document> {
        let employee_id = request
            .str_field("employeeId")
            .and_then(|raw| ObjectId::parse(raw).ok())
            .ok_or(WorkflowError::NotFound("Employee"))?;
        load_in_scope(self.store, EMPLOYEES, scope, &employee_id, "Employee").await
    }

    async fn balance_for(&self, scope: &TenantScope, request: &Document) -> WorkflowResult<Option<Document>> {
        let leave_type = request.str_field("leaveType").unwrap_or_default();
        if !needs_balance(leave_type) {
            return Ok(None);
        }
        let (Some(employee_id), Some(start)) = (request.str_field("employeeId"), date_field(&request.body, "startDate"))
        else {
            return Ok(None);
        };
        Ok(find_balance(self.store, scope, employee_id, leave_type, start.year()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::store::MemoryStore;
    use serde_json::Map;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn counts_weekdays_only() {
        // Friday 2024-03-01 through Tuesday 2024-03-05
        assert_eq!(business_days(date("2024-03-01"), date("2024-03-05"), false).unwrap(), Decimal::from(3));
        assert_eq!(business_days(date("2024-03-04"), date("2024-03-04"), true).unwrap(), Decimal::new(5, 1));
    }

    #[test]
    fn rejects_weekend_only_and_cross_year_periods() {
        let weekend = business_days(date("2024-03-02"), date("2024-03-03"), false).unwrap_err();
        assert!(weekend.get("startDate").is_some());

        let cross_year = business_days(date("2024-12-30"), date("2025-01-02"), false).unwrap_err();
        assert!(cross_year.get("endDate").is_some());

        let half = business_days(date("2024-03-04"), date("2024-03-05"), true).unwrap_err();
        assert!(half.get("halfDay").is_some());
    }

    async fn insert(store: &MemoryStore, user: &AuthUser, collection: &str, body: Value) -> Document {
        let body: Map<String, Value> = body.as_object().unwrap().clone();
        store
            .insert(collection, Document::new(&user.scope, &user.user_id, body))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn approval_moves_days_from_pending_to_used() {
        let store = MemoryStore::new();
        let hr = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Hr, 1));
        let employee = insert(&store, &hr, EMPLOYEES, json!({ "firstName": "Ada", "userId": ObjectId::new().as_str() })).await;
        let balance = insert(
            &store,
            &hr,
            LEAVE_BALANCES,
            json!({ "employeeId": employee.id.as_str(), "leaveType": "annual", "year": 2030, "entitled": 20, "used": 0, "pending": 3 }),
        )
        .await;
        let request = insert(
            &store,
            &hr,
            LEAVE_REQUESTS,
            json!({ "employeeId": employee.id.as_str(), "leaveType": "annual", "startDate": "2030-03-04", "endDate": "2030-03-06", "days": 3, "status": "pending" }),
        )
        .await;

        let service = LeaveService::new(&store);
        let approved = service.approve(&hr, &request.id).await.unwrap();
        assert_eq!(approved.status(), APPROVED);

        let balance = store.find_by_id(LEAVE_BALANCES, &hr.scope, &balance.id).await.unwrap().unwrap();
        assert_eq!(field_or_zero(&balance.body, "pending"), Decimal::ZERO);
        assert_eq!(field_or_zero(&balance.body, "used"), Decimal::from(3));
        assert_eq!(available(&balance), Decimal::from(17));

        // future leave can still be cancelled, returning the days
        let cancelled = service.cancel(&hr, &request.id).await.unwrap();
        assert_eq!(cancelled.status(), CANCELLED);
        let balance = store.find_by_id(LEAVE_BALANCES, &hr.scope, &balance.id).await.unwrap().unwrap();
        assert_eq!(available(&balance), Decimal::from(20));
    }

    #[tokio::test]
    async fn approver_cannot_approve_own_request() {
        let store = MemoryStore::new();
        let hr = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Hr, 1));
        let employee = insert(&store, &hr, EMPLOYEES, json!({ "firstName": "Self", "userId": hr.user_id.as_str() })).await;
        let request = insert(
            &store,
            &hr,
            LEAVE_REQUESTS,
            json!({ "employeeId": employee.id.as_str(), "leaveType": "unpaid", "startDate": "2030-03-04", "endDate": "2030-03-04", "days": 1, "status": "pending" }),
        )
        .await;

        let err = LeaveService::new(&store).approve(&hr, &request.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[tokio::test]
    async fn started_leave_cannot_be_cancelled() {
        let store = MemoryStore::new();
        let hr = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Hr, 1));
        let employee = insert(&store, &hr, EMPLOYEES, json!({ "firstName": "Ada", "userId": ObjectId::new().as_str() })).await;
        let request = insert(
            &store,
            &hr,
            LEAVE_REQUESTS,
            json!({ "employeeId": employee.id.as_str(), "leaveType": "unpaid", "startDate": "2020-03-02", "endDate": "2020-03-03", "days": 2, "status": "approved" }),
        )
        .await;

        let err = LeaveService::new(&store).cancel(&hr, &request.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[tokio::test]
    async fn balance_writes_from_a_stale_read_conflict() {
        let store = MemoryStore::new();
        let hr = AuthUser::from(Claims::new(ObjectId::new(), Some(ObjectId::new()), Role::Hr, 1));
        let balance = insert(
            &store,
            &hr,
            LEAVE_BALANCES,
            json!({ "employeeId": ObjectId::new().as_str(), "leaveType": "annual", "year": 2030, "entitled": 4, "used": 0, "pending": 0 }),
        )
        .await;

        let first = balance_update(&balance, Decimal::from(3), Decimal::ZERO);
        let second = balance_update(&balance, Decimal::from(3), Decimal::ZERO);
        store.apply_batch(&hr.scope, vec![first]).await.unwrap();
        let err = store.apply_batch(&hr.scope, vec![second]).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let balance = store.find_by_id(LEAVE_BALANCES, &hr.scope, &balance.id).await.unwrap().unwrap();
        assert_eq!(field_or_zero(&balance.body, "pending"), Decimal::from(3));
    }
}
