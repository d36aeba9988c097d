//! Error types for sql-check.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to parse schema: {0}")]
    SchemaParse(String),

    #[error("Failed to parse query: {0}")]
    QueryParse(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Ambiguous column '{0}' - exists in multiple tables")]
    AmbiguousColumn(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A construct the nullability/row-count analyzer does not model. Recoverable:
    /// callers degrade to the conservative (all-nullable) description and log a warning.
    #[error("Unsupported construct during inference: {0}")]
    UnsupportedConstruct(String),

    /// Something the analyzer was certain about turned out false. This should never
    /// happen against a query that already passed the probe step; if it does, it is
    /// a bug in the analyzer itself and must not be silently downgraded.
    #[error("Internal inference invariant violated: {0}")]
    Internal(String),
}

impl Error {
    /// Recoverable errors are logged and the caller falls back to the conservative,
    /// all-nullable description; fatal ones propagate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}
