use serde_json::{Map, Value};
use std::time::Instant;

use crate::config::AppConfig;
use crate::middleware::AuthUser;
use crate::observer::traits::{ObserverRing, Operation};
use crate::store::{Document, DocumentStore};
use crate::tenant::TenantScope;

/// State that flows through the observer pipeline for one write
pub struct ObserverContext<'a> {
    pub operation: Operation,
    pub collection: &'a str,
    pub user: &'a AuthUser,
    pub store: &'a dyn DocumentStore,
    pub config: &'a AppConfig,

    /// Validated fields being written: the create body or the update patch
    pub changes: Map<String, Value>,

    /// Stored document for update and delete
    pub existing: Option<Document>,

    /// Document after the write, available to post-database observers
    pub result: Option<Document>,

    pub start_time: Instant,
    pub current_ring: Option<ObserverRing>,
}

impl<'a> ObserverContext<'a> {
    pub fn new(
        operation: Operation,
        collection: &'a str,
        user: &'a AuthUser,
        store: &'a dyn DocumentStore,
        config: &'a AppConfig,
    ) -> Self {
        Self {
            operation,
            collection,
            user,
            store,
            config,
            changes: Map::new(),
            existing: None,
            result: None,
            start_time: Instant::now(),
            current_ring: None,
        }
    }

    pub fn with_changes(mut self, changes: Map<String, Value>) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_existing(mut self, existing: Document) -> Self {
        self.existing = Some(existing);
        self
    }

    pub fn scope(&self) -> &'a TenantScope {
        &self.user.scope
    }

    /// Field value as it will be after the write
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.changes.get(field) {
            Some(value) => Some(value),
            None => self.existing.as_ref().and_then(|doc| doc.get(field)),
        }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.changes.insert(field.to_string(), value);
    }

    /// Set a field only when neither the write nor the stored document has it
    pub fn set_default(&mut self, field: &str, value: Value) {
        if self.get(field).map_or(true, Value::is_null) {
            self.set(field, value);
        }
    }

    /// Stored body overlaid with the incoming changes
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self
            .existing
            .as_ref()
            .map(|doc| doc.body.clone())
            .unwrap_or_default();
        for (key, value) in &self.changes {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Status of the stored document, empty on create
    pub fn existing_status(&self) -> &str {
        self.existing.as_ref().map(Document::status).unwrap_or("")
    }

    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
