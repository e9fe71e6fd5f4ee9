use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A batch precondition no longer holds; the document changed underneath
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
