use thiserror::Error;

use super::currency::ConversionError;
use crate::store::{Document, StoreError};
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} when status is '{from}'")]
    InvalidTransition { action: &'static str, from: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Guard a state change: the document's current status must be one of `from`
pub fn ensure_status(doc: &Document, action: &'static str, from: &[&str]) -> WorkflowResult<()> {
    let current = doc.status();
    if from.contains(&current) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            action,
            from: current.to_string(),
        })
    }
}
