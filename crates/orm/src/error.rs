//! Error types for the active-record core.
//!
//! Backend failures keep their per-step identity (`DbError`) but are
//! collapsed into a single `OrmError::Backend` at the logic boundary.
//! A missing row is never an error; loads report it as `Ok(false)` and
//! selects as an empty result.

use thiserror::Error;

/// Result type alias for record operations.
pub type OrmResult<T> = Result<T, OrmError>;

/// Error taxonomy of the model/logic layer.
#[derive(Debug, Clone, Error)]
pub enum OrmError {
    /// An unknown field name was requested on a model.
    #[error("field '{field}' is not defined on model '{model}'")]
    FieldNotFound { model: String, field: String },

    /// A value could not be applied to a field.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A query definition could not be rendered.
    #[error("query error: {0}")]
    Query(String),

    /// Dependent-model navigation or cascade failed.
    #[error("relationship error: {0}")]
    Relationship(String),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The storage backend reported a failure.
    #[error(transparent)]
    Backend(#[from] DbError),
}

/// Failure steps a storage backend can report.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed to begin transaction: {0}")]
    BeginTxn(String),
    #[error("statement error: {0}")]
    Statement(String),
    #[error("bind error: {0}")]
    Bind(String),
    #[error("execute error: {0}")]
    Execute(String),
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("rollback failed: {0}")]
    Rollback(String),
    #[error("close failed: {0}")]
    Close(String),
}
