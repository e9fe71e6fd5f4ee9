use serde::Serialize;

use crate::auth::Role;
use crate::validation::{FieldDef, FieldKind};

/// Static description of one tenant-scoped resource exposed under `/api/{segment}`
#[derive(Debug)]
pub struct ResourceDef {
    /// URL segment, e.g. `leave-requests`
    pub segment: &'static str,
    pub collection: &'static str,
    /// Singular name used in messages
    pub label: &'static str,
    /// Create allow-list with declared types
    pub fields: &'static [FieldDef],
    /// Update allow-list; every entry must also appear in `fields`
    pub updatable: &'static [&'static str],
    pub required: &'static [&'static str],
    pub filterable: &'static [&'static str],
    pub sortable: &'static [&'static str],
    /// Roles allowed to create, update and delete; empty admits every member
    pub write_roles: &'static [Role],
    pub allow_delete: bool,
}

impl ResourceDef {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }

    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            segment: self.segment,
            collection: self.collection,
            fields: self.field_names(),
            required: self.required.to_vec(),
            updatable: self.updatable.to_vec(),
            filterable: self.filterable.to_vec(),
            sortable: self.sortable.to_vec(),
            write_roles: self.write_roles.iter().map(Role::as_str).collect(),
            allow_delete: self.allow_delete,
        }
    }
}

/// Serializable view of a resource definition for the CLI and docs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub segment: &'static str,
    pub collection: &'static str,
    pub fields: Vec<&'static str>,
    pub required: Vec<&'static str>,
    pub updatable: Vec<&'static str>,
    pub filterable: Vec<&'static str>,
    pub sortable: Vec<&'static str>,
    pub write_roles: Vec<&'static str>,
    pub allow_delete: bool,
}
