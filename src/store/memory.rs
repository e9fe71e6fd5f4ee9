use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::query::{compare_documents, matches};
use super::{BatchUpdate, Document, DocumentStore, Query, StoreError};
use crate::tenant::TenantScope;
use crate::validation::ObjectId;

/// Process-local store used by tests and by local runs without DATABASE_URL
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    sequences: RwLock<HashMap<(String, String), u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| &d.id == id && scope.contains(d)))
            .cloned())
    }

    async fn find(&self, collection: &str, scope: &TenantScope, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| scope.contains(d) && matches(d, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !query.sort.is_empty() {
            docs.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        let skip = query.skip as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(
        &self,
        collection: &str,
        scope: &TenantScope,
        filter: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| scope.contains(d) && matches(d, filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn update(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| &d.id == id && scope.contains(d)));

        Ok(doc.map(|doc| {
            doc.apply_patch(patch);
            doc.updated_at = Utc::now();
            doc.clone()
        }))
    }

    async fn delete(&self, collection: &str, scope: &TenantScope, id: &ObjectId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| !(&d.id == id && scope.contains(d)));
        Ok(docs.len() < before)
    }

    async fn apply_batch(&self, scope: &TenantScope, batch: Vec<BatchUpdate>) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        // Check everything before touching anything so a failed batch leaves no trace
        for update in &batch {
            let current = collections
                .get(&update.collection)
                .and_then(|docs| docs.iter().find(|d| d.id == update.id && scope.contains(d)));
            match current {
                Some(doc) => update.check(&doc.body)?,
                None => return Err(StoreError::NotFound(format!("{} {}", update.collection, update.id))),
            }
        }

        let now = Utc::now();
        for update in batch {
            if let Some(doc) = collections
                .get_mut(&update.collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == update.id && scope.contains(d)))
            {
                doc.apply_patch(update.patch);
                doc.updated_at = now;
            }
        }
        Ok(())
    }

    async fn next_sequence(&self, scope: &TenantScope, name: &str) -> Result<u64, StoreError> {
        let mut sequences = self.sequences.write().await;
        let value = sequences.entry((scope.to_string(), name.to_string())).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
