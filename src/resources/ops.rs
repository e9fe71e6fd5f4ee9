// Generic tenant-scoped CRUD shared by every registered resource

use serde_json::{json, Map, Value};

use super::def::ResourceDef;
use super::list::ListParams;
use super::refs::check_references;
use crate::error::ApiError;
use crate::middleware::{AuthUser, Pagination};
use crate::observer::{ObserverContext, Operation};
use crate::state::AppState;
use crate::store::Document;
use crate::validation::{check_required, pick_allowed, validate_fields, ObjectId, ValidationErrors};

pub struct ResourceOps<'a> {
    state: &'a AppState,
    def: &'static ResourceDef,
}

impl<'a> ResourceOps<'a> {
    pub fn new(state: &'a AppState, def: &'static ResourceDef) -> Self {
        Self { state, def }
    }

    pub async fn list(&self, user: &AuthUser, params: ListParams) -> Result<(Vec<Document>, Pagination), ApiError> {
        let store = self.state.store.as_ref();
        let total = store.count(self.def.collection, &user.scope, &params.query.filter).await?;
        let docs = store.find(self.def.collection, &user.scope, &params.query).await?;
        Ok((docs, Pagination::new(params.page, params.limit, total)))
    }

    pub async fn get(&self, user: &AuthUser, id: &str) -> Result<Document, ApiError> {
        let id = ObjectId::parse(id)?;
        self.load(user, &id).await
    }

    pub async fn create(&self, user: &AuthUser, body: Map<String, Value>) -> Result<Document, ApiError> {
        user.require_role(self.def.write_roles, &format!("create {}", self.def.segment))?;

        let mut changes = self.pick(&body, &self.def.field_names());
        let mut errors = ValidationErrors::new();
        validate_fields(&mut changes, self.def.fields, &mut errors);
        check_required(&changes, self.def.required, &mut errors);
        self.check_refs(user, &changes, errors).await?;

        let store = self.state.store.as_ref();
        let mut ctx = ObserverContext::new(Operation::Create, self.def.collection, user, store, &self.state.config)
            .with_changes(changes);
        self.state.observers.run_before_write(&mut ctx).await?;

        let mut body = std::mem::take(&mut ctx.changes);
        body.insert("createdBy".to_string(), json!(user.user_id));
        body.insert("updatedBy".to_string(), json!(user.user_id));
        let doc = store
            .insert(self.def.collection, Document::new(&user.scope, &user.user_id, body))
            .await?;

        ctx.result = Some(doc.clone());
        if let Err(err) = self.state.observers.run_after_write(&mut ctx).await {
            // Roll back the insert
            store.delete(self.def.collection, &user.scope, &doc.id).await?;
            return Err(err.into());
        }

        tracing::info!(
            collection = self.def.collection,
            id = %doc.id,
            user = %user.user_id,
            elapsed = ?ctx.execution_time(),
            "Created {}",
            self.def.label
        );
        Ok(doc)
    }

    pub async fn update(&self, user: &AuthUser, id: &str, body: Map<String, Value>) -> Result<Document, ApiError> {
        user.require_role(self.def.write_roles, &format!("update {}", self.def.segment))?;
        let id = ObjectId::parse(id)?;
        let existing = self.load(user, &id).await?;

        let mut changes = self.pick(&body, self.def.updatable);
        if changes.is_empty() {
            return Err(ApiError::bad_request("No valid fields to update"));
        }

        let mut errors = ValidationErrors::new();
        validate_fields(&mut changes, self.def.fields, &mut errors);
        let cleared: Vec<&str> = self
            .def
            .required
            .iter()
            .copied()
            .filter(|field| changes.contains_key(*field))
            .collect();
        check_required(&changes, &cleared, &mut errors);
        self.check_refs(user, &changes, errors).await?;

        let store = self.state.store.as_ref();
        let mut ctx = ObserverContext::new(Operation::Update, self.def.collection, user, store, &self.state.config)
            .with_changes(changes)
            .with_existing(existing);
        self.state.observers.run_before_write(&mut ctx).await?;

        let mut patch = std::mem::take(&mut ctx.changes);
        patch.insert("updatedBy".to_string(), json!(user.user_id));
        let doc = store
            .update(self.def.collection, &user.scope, &id, patch)
            .await?
            .ok_or_else(|| self.not_found())?;

        ctx.result = Some(doc.clone());
        self.state.observers.run_after_write(&mut ctx).await?;

        tracing::info!(collection = self.def.collection, id = %doc.id, user = %user.user_id, "Updated {}", self.def.label);
        Ok(doc)
    }

    pub async fn delete(&self, user: &AuthUser, id: &str) -> Result<Value, ApiError> {
        if !self.def.allow_delete {
            return Err(ApiError::bad_request(format!("{} records cannot be deleted", self.def.label)));
        }
        user.require_role(self.def.write_roles, &format!("delete {}", self.def.segment))?;
        let id = ObjectId::parse(id)?;
        let existing = self.load(user, &id).await?;

        let store = self.state.store.as_ref();
        let mut ctx = ObserverContext::new(Operation::Delete, self.def.collection, user, store, &self.state.config)
            .with_existing(existing);
        self.state.observers.run_before_write(&mut ctx).await?;

        if !store.delete(self.def.collection, &user.scope, &id).await? {
            return Err(self.not_found());
        }
        self.state.observers.run_after_write(&mut ctx).await?;

        tracing::info!(collection = self.def.collection, id = %id, user = %user.user_id, "Deleted {}", self.def.label);
        Ok(json!({ "deleted": true, "_id": id }))
    }

    async fn load(&self, user: &AuthUser, id: &ObjectId) -> Result<Document, ApiError> {
        self.state
            .store
            .find_by_id(self.def.collection, &user.scope, id)
            .await?
            .ok_or_else(|| self.not_found())
    }

    fn pick(&self, body: &Map<String, Value>, allowed: &[&str]) -> Map<String, Value> {
        let (picked, dropped) = pick_allowed(body, allowed);
        if !dropped.is_empty() {
            tracing::debug!(collection = self.def.collection, ?dropped, "Ignoring fields outside the allow-list");
        }
        picked
    }

    async fn check_refs(
        &self,
        user: &AuthUser,
        changes: &Map<String, Value>,
        mut errors: ValidationErrors,
    ) -> Result<(), ApiError> {
        check_references(self.state.store.as_ref(), &user.scope, self.def, changes, &mut errors).await?;
        errors.into_result()?;
        Ok(())
    }

    fn not_found(&self) -> ApiError {
        ApiError::not_found(format!("{} not found", self.def.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};
    use crate::config::AppConfig;
    use crate::resources::registry::{ACCOUNTS_DEF, CLIENTS_DEF, EMPLOYEES_DEF, LEAVE_REQUESTS_DEF};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(AppConfig::development(), Arc::new(MemoryStore::new())).unwrap()
    }

    fn user(role: Role, firm: Option<&ObjectId>) -> AuthUser {
        AuthUser::from(Claims::new(ObjectId::new(), firm.cloned(), role, 1))
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn create_strips_system_fields_and_stamps_owner() {
        let state = state();
        let ops = ResourceOps::new(&state, &CLIENTS_DEF);
        let firm = ObjectId::new();
        let lawyer = user(Role::Lawyer, Some(&firm));
        let forged = ObjectId::new().to_string();

        let doc = ops
            .create(&lawyer, body(json!({ "name": "  Acme  ", "firmId": forged, "createdBy": forged, "isAdmin": true })))
            .await
            .unwrap();

        assert_eq!(doc.firm_id.as_ref(), Some(&firm));
        assert_eq!(doc.lawyer_id, lawyer.user_id);
        assert_eq!(doc.get("name"), Some(&json!("Acme")));
        assert_eq!(doc.get("createdBy"), Some(&json!(lawyer.user_id)));
        assert!(doc.get("isAdmin").is_none());
    }

    #[tokio::test]
    async fn other_firms_see_not_found() {
        let state = state();
        let ops = ResourceOps::new(&state, &CLIENTS_DEF);
        let alice = user(Role::Owner, Some(&ObjectId::new()));
        let mallory = user(Role::Owner, Some(&ObjectId::new()));

        let doc = ops.create(&alice, body(json!({ "name": "Acme" }))).await.unwrap();
        let id = doc.id.to_string();

        assert_eq!(ops.get(&mallory, &id).await.unwrap_err().status_code(), 404);
        let err = ops.update(&mallory, &id, body(json!({ "name": "Mine" }))).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(ops.delete(&mallory, &id).await.unwrap_err().status_code(), 404);
        assert!(ops.get(&alice, &id).await.is_ok());
    }

    #[tokio::test]
    async fn required_fields_and_write_roles_are_enforced() {
        let state = state();
        let ops = ResourceOps::new(&state, &ACCOUNTS_DEF);
        let firm = ObjectId::new();

        let err = ops.create(&user(Role::Staff, Some(&firm)), body(json!({ "name": "Ops", "type": "bank" }))).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = ops.create(&user(Role::Accountant, Some(&firm)), body(json!({ "name": "Ops" }))).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["field_errors"]["type"], json!("This field is required"));
    }

    #[tokio::test]
    async fn update_rejects_empty_patches_and_nulled_required_fields() {
        let state = state();
        let ops = ResourceOps::new(&state, &CLIENTS_DEF);
        let owner = user(Role::Owner, None);
        let id = ops.create(&owner, body(json!({ "name": "Acme" }))).await.unwrap().id.to_string();

        let err = ops.update(&owner, &id, body(json!({ "lawyerId": "x" }))).await.unwrap_err();
        assert_eq!(err.message(), "No valid fields to update");

        let err = ops.update(&owner, &id, body(json!({ "name": null }))).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let updated = ops.update(&owner, &id, body(json!({ "phone": "555" }))).await.unwrap();
        assert_eq!(updated.get("name"), Some(&json!("Acme")));
        assert_eq!(updated.get("phone"), Some(&json!("555")));
    }

    #[tokio::test]
    async fn employee_email_is_unique_per_tenant() {
        let state = state();
        let ops = ResourceOps::new(&state, &EMPLOYEES_DEF);
        let hr = user(Role::Hr, Some(&ObjectId::new()));
        let other_hr = user(Role::Hr, Some(&ObjectId::new()));
        let employee = json!({ "firstName": "Ada", "lastName": "Lovelace", "email": "ada@firm.test" });

        ops.create(&hr, body(employee.clone())).await.unwrap();
        let err = ops.create(&hr, body(json!({ "firstName": "A", "lastName": "L", "email": "ADA@firm.test" }))).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(ops.create(&other_hr, body(employee)).await.is_ok());
    }

    #[tokio::test]
    async fn leave_requests_cannot_be_deleted_generically() {
        let state = state();
        let ops = ResourceOps::new(&state, &LEAVE_REQUESTS_DEF);
        let owner = user(Role::Owner, None);
        let err = ops.delete(&owner, &ObjectId::new().to_string()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
