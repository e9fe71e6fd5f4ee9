use chrono::NaiveDate;
use serde_json::{json, Value};

use super::workflow::{ensure_status, WorkflowError, WorkflowResult};
use super::{load_in_scope, now_rfc3339, patch};
use crate::auth::Role;
use crate::middleware::AuthUser;
use crate::store::collections::PROBATIONS;
use crate::store::{Document, DocumentStore};
use crate::validation::fields::date_field;
use crate::validation::{ObjectId, ValidationErrors};

pub const ACTIVE: &str = "active";
pub const EXTENDED: &str = "extended";
pub const PASSED: &str = "passed";
pub const FAILED: &str = "failed";

pub const OUTCOMES: &[&str] = &[PASSED, FAILED];

pub const HR_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Hr];

pub struct ProbationService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProbationService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Push the end date out; every extension is kept in `extensions`
    pub async fn extend(
        &self,
        user: &AuthUser,
        id: &ObjectId,
        new_end: NaiveDate,
        reason: Option<String>,
    ) -> WorkflowResult<Document> {
        let probation = load_in_scope(self.store, PROBATIONS, &user.scope, id, "Probation").await?;
        ensure_status(&probation, "extend", &[ACTIVE, EXTENDED])?;

        let current_end = date_field(&probation.body, "endDate");
        if current_end.is_some_and(|end| new_end <= end) {
            return Err(ValidationErrors::single("newEndDate", "Must be after the current end date").into());
        }

        let mut extensions = match probation.get("extensions") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        extensions.push(json!({
            "previousEndDate": current_end.map(|d| d.to_string()),
            "newEndDate": new_end.to_string(),
            "reason": reason,
            "extendedBy": user.user_id.as_str(),
            "extendedAt": now_rfc3339(),
        }));

        let updated = self
            .store
            .update(
                PROBATIONS,
                &user.scope,
                id,
                patch(json!({
                    "status": EXTENDED,
                    "endDate": new_end.to_string(),
                    "extensions": extensions,
                    "updatedBy": user.user_id.as_str(),
                })),
            )
            .await?
            .ok_or(WorkflowError::NotFound("Probation"))?;

        tracing::info!(probation = %id, end = %new_end, "Probation extended");
        Ok(updated)
    }

    /// Record the final outcome; passed and failed are terminal
    pub async fn complete(
        &self,
        user: &AuthUser,
        id: &ObjectId,
        outcome: &str,
        notes: Option<String>,
    ) -> WorkflowResult<Document> {
        if !OUTCOMES.contains(&outcome) {
            return Err(ValidationErrors::single("outcome", "Must be one of: passed, failed").into());
        }

        let probation = load_in_scope(self.store, PROBATIONS, &user.scope, id, "Probation").await?;
        ensure_status(&probation, "complete", &[ACTIVE, EXTENDED])?;

        let mut changes = patch(json!({
            "status": outcome,
            "outcome": outcome,
            "completedBy": user.user_id.as_str(),
            "completedAt": now_rfc3339(),
            "updatedBy": user.user_id.as_str(),
        }));
        if let Some(notes) = notes {
            changes.insert("outcomeNotes".to_string(), Value::String(notes));
        }

        let updated = self
            .store
            .update(PROBATIONS, &user.scope, id, changes)
            .await?
            .ok_or(WorkflowError::NotFound("Probation"))?;

        tracing::info!(probation = %id, outcome, "Probation completed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};
    use crate::store::MemoryStore;
    use crate::tenant::TenantScope;

    async fn setup() -> (MemoryStore, AuthUser, Document) {
        let store = MemoryStore::new();
        let user = AuthUser::from(Claims::new(ObjectId::new(), None, Role::Owner, 1));
        let body = json!({ "startDate": "2024-01-01", "endDate": "2024-04-01", "status": "active" })
            .as_object()
            .unwrap()
            .clone();
        let doc = store
            .insert(PROBATIONS, Document::new(&user.scope, &user.user_id, body))
            .await
            .unwrap();
        assert!(matches!(user.scope, TenantScope::Solo(_)));
        (store, user, doc)
    }

    #[tokio::test]
    async fn extend_then_pass() {
        let (store, user, doc) = setup().await;
        let service = ProbationService::new(&store);

        let new_end = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let extended = service.extend(&user, &doc.id, new_end, Some("More time".into())).await.unwrap();
        assert_eq!(extended.status(), EXTENDED);
        assert_eq!(extended.str_field("endDate"), Some("2024-06-01"));
        assert_eq!(extended.get("extensions").and_then(Value::as_array).map(Vec::len), Some(1));

        let passed = service.complete(&user, &doc.id, "passed", None).await.unwrap();
        assert_eq!(passed.status(), PASSED);

        let err = service.complete(&user, &doc.id, "failed", None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn extension_must_move_end_date_forward() {
        let (store, user, doc) = setup().await;
        let earlier = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = ProbationService::new(&store)
            .extend(&user, &doc.id, earlier, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}
