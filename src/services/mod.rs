pub mod currency;
pub mod integration;
pub mod invoice;
pub mod leave;
pub mod matching;
pub mod probation;
pub mod reconciliation;
pub mod referral;
pub mod workflow;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::store::{Document, DocumentStore};
use crate::tenant::TenantScope;
use crate::validation::ObjectId;
use workflow::{WorkflowError, WorkflowResult};

pub use workflow::ensure_status;

/// Load a document the caller can see, or report it missing by name
pub(crate) async fn load_in_scope(
    store: &dyn DocumentStore,
    collection: &str,
    scope: &TenantScope,
    id: &ObjectId,
    label: &'static str,
) -> WorkflowResult<Document> {
    store
        .find_by_id(collection, scope, id)
        .await?
        .ok_or(WorkflowError::NotFound(label))
}

/// Unwrap a `json!` object literal into a patch map
pub(crate) fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
