//! Error types for rr-core

use thiserror::Error;

/// Core error type for restrepo
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration or metadata
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: IO error with file path context
    #[error("[C003] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C004: Two entity types registered under the same name
    #[error("[C004] Duplicate entity: {name}")]
    DuplicateEntity { name: String },

    /// C005: Entity metadata is internally inconsistent
    #[error("[C005] Invalid metadata for entity '{entity}': {message}")]
    InvalidMetadata { entity: String, message: String },

    /// C006: Entity type is not registered
    #[error("[C006] Unknown entity: {name}")]
    UnknownEntity { name: String },

    /// C007: A value could not be coerced to the declared field type
    #[error("[C007] Field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// C008: A name cannot be used as a SQL identifier
    #[error("[C008] Invalid identifier '{ident}'")]
    InvalidIdentifier { ident: String },

    /// C009: JSON input that has no value representation
    #[error("[C009] Unsupported JSON input: {message}")]
    UnsupportedJson { message: String },

    /// C010: Configuration parsed but is semantically invalid
    #[error("[C010] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// YAML parse error
    #[error("[C002] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
