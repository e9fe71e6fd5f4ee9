use thiserror::Error;

use crate::services::workflow::WorkflowError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Observer failures; each maps onto one HTTP outcome
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Observer {0} timed out")]
    Timeout(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ObserverError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ObserverError::Validation(ValidationErrors::single(field, message))
    }
}

impl From<WorkflowError> for ObserverError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(errors) => ObserverError::Validation(errors),
            WorkflowError::Store(e) => ObserverError::Store(e),
            WorkflowError::Conflict(msg) => ObserverError::Conflict(msg),
            WorkflowError::InvalidTransition { .. } => ObserverError::Conflict(err.to_string()),
            other => ObserverError::Rejected(other.to_string()),
        }
    }
}
