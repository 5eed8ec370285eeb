//! Error types for rr-db

use rr_core::CoreError;
use thiserror::Error;

/// Database and session errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Transaction management error (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),

    /// Column value with no runtime representation (D005)
    #[error("[D005] Unsupported column type: {0}")]
    UnsupportedType(String),

    /// Parameter value that cannot be bound (D006)
    #[error("[D006] Unsupported parameter: {0}")]
    UnsupportedParam(String),

    /// Entity handle not known to this session (D007)
    #[error("[D007] Unknown entity handle {0}")]
    InvalidEntityKey(usize),

    /// Name is not a field or association of the entity (D008)
    #[error("[D008] '{field}' is not an association of entity '{entity}'")]
    InvalidField { entity: String, field: String },

    /// Inserts reference each other in a cycle (D009)
    #[error("[D009] Circular reference between pending inserts: {cycle}")]
    CircularDependency { cycle: String },

    /// Referenced entity has no identifier at flush time (D010)
    #[error("[D010] Referenced entity {0} has no identifier and is not scheduled for insert")]
    UnresolvedReference(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured variants for catalog errors,
        // so classification goes by message.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
