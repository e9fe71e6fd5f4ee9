use serde::Serialize;

use crate::store::Document;
use crate::validation::ObjectId;

/// Ownership boundary applied to every store operation.
///
/// Firm members share every document of their firm. A solo lawyer only sees
/// documents they own that are not attached to any firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum TenantScope {
    Firm(ObjectId),
    Solo(ObjectId),
}

impl TenantScope {
    pub fn for_user(user_id: &ObjectId, firm_id: Option<&ObjectId>) -> Self {
        match firm_id {
            Some(firm) => TenantScope::Firm(firm.clone()),
            None => TenantScope::Solo(user_id.clone()),
        }
    }

    pub fn firm_id(&self) -> Option<&ObjectId> {
        match self {
            TenantScope::Firm(id) => Some(id),
            TenantScope::Solo(_) => None,
        }
    }

    pub fn contains(&self, doc: &Document) -> bool {
        match self {
            TenantScope::Firm(firm) => doc.firm_id.as_ref() == Some(firm),
            TenantScope::Solo(lawyer) => doc.firm_id.is_none() && &doc.lawyer_id == lawyer,
        }
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantScope::Firm(id) => write!(f, "firm:{}", id),
            TenantScope::Solo(id) => write!(f, "lawyer:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn firm_scope_sees_documents_of_any_firm_member() {
        let firm = ObjectId::new();
        let alice = ObjectId::new();
        let bob = ObjectId::new();
        let doc = Document::new(&TenantScope::for_user(&alice, Some(&firm)), &alice, Map::new());

        assert!(TenantScope::for_user(&bob, Some(&firm)).contains(&doc));
        assert!(!TenantScope::for_user(&bob, Some(&ObjectId::new())).contains(&doc));
    }

    #[test]
    fn solo_scope_never_sees_firm_documents() {
        let firm = ObjectId::new();
        let alice = ObjectId::new();
        let firm_doc = Document::new(&TenantScope::Firm(firm), &alice, Map::new());
        let solo_doc = Document::new(&TenantScope::Solo(alice.clone()), &alice, Map::new());

        let solo = TenantScope::for_user(&alice, None);
        assert!(!solo.contains(&firm_doc));
        assert!(solo.contains(&solo_doc));
        assert!(!TenantScope::Solo(ObjectId::new()).contains(&solo_doc));
    }
}
