pub mod collections;
pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::tenant::TenantScope;
use crate::validation::ObjectId;

pub use document::{Document, DocumentVecExt, SYSTEM_FIELDS};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{Query, SortDirection, SortSpec};

/// State a field must still have when a batch is applied
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Value(Value),
    /// Missing or null
    Unset,
}

impl Expected {
    pub fn holds(&self, actual: Option<&Value>) -> bool {
        match (self, actual) {
            (Expected::Unset, None | Some(Value::Null)) => true,
            (Expected::Unset, Some(_)) => false,
            (Expected::Value(Value::Number(want)), Some(Value::Number(got))) => want.as_f64() == got.as_f64(),
            (Expected::Value(want), Some(got)) => want == got,
            (Expected::Value(want), None) => want.is_null(),
        }
    }
}

/// One document patch inside an all-or-nothing batch
#[derive(Debug, Clone)]
pub struct BatchUpdate {
    pub collection: String,
    pub id: ObjectId,
    pub patch: Map<String, Value>,
    pub expect: Vec<(String, Expected)>,
}

impl BatchUpdate {
    pub fn new(collection: impl Into<String>, id: ObjectId, patch: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            id,
            patch,
            expect: Vec::new(),
        }
    }

    /// Fail the whole batch with `StoreError::Conflict` unless `field` still equals `value`
    pub fn expecting(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expect.push((field.into(), Expected::Value(value.into())));
        self
    }

    pub fn expecting_unset(mut self, field: impl Into<String>) -> Self {
        self.expect.push((field.into(), Expected::Unset));
        self
    }

    pub fn check(&self, body: &Map<String, Value>) -> Result<(), StoreError> {
        match self.expect.iter().find(|(field, expected)| !expected.holds(body.get(field))) {
            Some((field, _)) => Err(StoreError::Conflict(format!(
                "{} {} changed ({})",
                self.collection, self.id, field
            ))),
            None => Ok(()),
        }
    }
}

/// Tenant-scoped document persistence.
///
/// Every read and write takes the caller's scope; documents outside it behave
/// exactly like documents that do not exist.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    async fn find_by_id(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
    ) -> Result<Option<Document>, StoreError>;

    async fn find(&self, collection: &str, scope: &TenantScope, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn count(
        &self,
        collection: &str,
        scope: &TenantScope,
        filter: &Map<String, Value>,
    ) -> Result<u64, StoreError>;

    /// Shallow-merge `patch` into the document body
    async fn update(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, collection: &str, scope: &TenantScope, id: &ObjectId) -> Result<bool, StoreError>;

    /// Apply every patch or none of them. Fails with `Conflict` when any
    /// update's expectations do not hold at write time.
    async fn apply_batch(&self, scope: &TenantScope, batch: Vec<BatchUpdate>) -> Result<(), StoreError>;

    /// Next value of a per-tenant counter, starting at 1. Never hands out the same value twice.
    async fn next_sequence(&self, scope: &TenantScope, name: &str) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn name(&self) -> &'static str;
}
