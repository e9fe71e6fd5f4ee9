use serde_json::{Map, Value};

use super::def::ResourceDef;
use super::registry::is_stored_collection;
use crate::store::{DocumentStore, StoreError};
use crate::tenant::TenantScope;
use crate::validation::{FieldKind, ObjectId, ValidationErrors};

/// Every `Ref`/`RefList` value in `body` must name a document visible in `scope`.
/// Ids of collections owned elsewhere (users) were already format-checked.
pub async fn check_references(
    store: &dyn DocumentStore,
    scope: &TenantScope,
    def: &ResourceDef,
    body: &Map<String, Value>,
    errors: &mut ValidationErrors,
) -> Result<(), StoreError> {
    for field in def.fields {
        let (collection, values) = match (field.kind, body.get(field.name)) {
            (FieldKind::Ref(collection), Some(Value::String(id))) => (collection, vec![id.as_str()]),
            (FieldKind::RefList(collection), Some(Value::Array(items))) => {
                (collection, items.iter().filter_map(Value::as_str).collect())
            }
            _ => continue,
        };
        if !is_stored_collection(collection) {
            continue;
        }

        for raw in values {
            let Ok(id) = ObjectId::parse(raw) else {
                errors.add(field.name, "Invalid ID format");
                break;
            };
            if store.find_by_id(collection, scope, &id).await?.is_none() {
                tracing::debug!("{} references missing {} {}", def.segment, collection, id);
                errors.add(field.name, "Referenced record not found");
                break;
            }
        }
    }
    Ok(())
}
