//! Error types for rr-schema

use thiserror::Error;

/// Schema snapshot errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// SC001: Snapshot file could not be read or parsed
    #[error("[SC001] Failed to parse schema snapshot: {message}")]
    Parse { message: String },

    /// SC002: Two tables share a name
    #[error("[SC002] Duplicate table: {name}")]
    DuplicateTable { name: String },

    /// SC003: Two columns of one table share a name
    #[error("[SC003] Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// SC004: A key or index refers to a column the table does not have
    #[error("[SC004] Table '{table}': {message}")]
    InvalidTable { table: String, message: String },

    /// SC005: Two sequences share a name
    #[error("[SC005] Duplicate sequence: {name}")]
    DuplicateSequence { name: String },

    /// SC006: Unknown target platform
    #[error("[SC006] Unknown platform '{name}' (expected 'duckdb' or 'generic')")]
    UnknownPlatform { name: String },

    /// IO error with file path context
    #[error("[SC001] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] rr_core::CoreError),
}

/// Result type alias for SchemaError
pub type SchemaResult<T> = Result<T, SchemaError>;
