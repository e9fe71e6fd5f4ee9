use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;

/// Observer rings, executed in ascending order around the store write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    InputValidation = 1, // Cross-field checks
    Business = 3,        // Uniqueness, status locks, domain rules
    Enrichment = 4,      // Computed fields, defaults
    PostDatabase = 6,    // Follow-up writes once the document exists
}

impl ObserverRing {
    pub const BEFORE_WRITE: [ObserverRing; 3] = [
        ObserverRing::InputValidation,
        ObserverRing::Business,
        ObserverRing::Enrichment,
    ];
}

/// Write operations the pipeline runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// A resource-specific rule hooked into generic create/update/delete
#[async_trait]
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    fn ring(&self) -> ObserverRing;

    fn applies_to_operation(&self, op: Operation) -> bool;

    fn applies_to_collection(&self, collection: &str) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }

    async fn execute(&self, ctx: &mut ObserverContext<'_>) -> Result<(), ObserverError>;
}
