use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::tenant::TenantScope;
use crate::validation::ObjectId;

/// Fields the store and handlers stamp; clients can never set them
pub const SYSTEM_FIELDS: &[&str] = &[
    "_id",
    "id",
    "firmId",
    "lawyerId",
    "createdBy",
    "updatedBy",
    "createdAt",
    "updatedAt",
];

/// A tenant-owned JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub firm_id: Option<ObjectId>,
    /// Creator inside a firm, owner for a solo practice
    pub lawyer_id: ObjectId,
    pub body: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(scope: &TenantScope, owner: &ObjectId, body: Map<String, Value>) -> Self {
        let now = Utc::now();
        let lawyer_id = match scope {
            TenantScope::Firm(_) => owner.clone(),
            TenantScope::Solo(lawyer) => lawyer.clone(),
        };

        Self {
            id: ObjectId::new(),
            firm_id: scope.firm_id().cloned(),
            lawyer_id,
            body,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }

    pub fn status(&self) -> &str {
        self.str_field("status").unwrap_or("")
    }

    /// Merge a patch into the body; `updated_at` is bumped by the store
    pub fn apply_patch(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.body.insert(key, value);
        }
    }

    /// Shape for API responses: identity and ownership first, then the body
    pub fn to_api(&self) -> Value {
        let mut out = Map::new();
        out.insert("_id".to_string(), Value::String(self.id.to_string()));
        if let Some(firm) = &self.firm_id {
            out.insert("firmId".to_string(), Value::String(firm.to_string()));
        }
        out.insert("lawyerId".to_string(), Value::String(self.lawyer_id.to_string()));
        for (key, value) in &self.body {
            out.insert(key.clone(), value.clone());
        }
        out.insert("createdAt".to_string(), Value::String(self.created_at.to_rfc3339()));
        out.insert("updatedAt".to_string(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(out)
    }
}

/// Convenience for turning query results into a JSON array
pub trait DocumentVecExt {
    fn to_api(&self) -> Value;
}

impl DocumentVecExt for Vec<Document> {
    fn to_api(&self) -> Value {
        Value::Array(self.iter().map(Document::to_api).collect())
    }
}
