//! Error types for rr-repository

use rr_core::CoreError;
use rr_db::DbError;
use rr_query::QueryError;
use thiserror::Error;

/// Repository errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Invalid repository declaration, detected at construction (R001)
    #[error("[R001] Invalid repository configuration for '{entity}': {message}")]
    Config { entity: String, message: String },

    /// Rejected input values (R002)
    #[error("[R002] {message}")]
    Validation { message: String },

    /// No entity with the given identifier (R003)
    #[error("[R003] No {entity} found with identifier: {id}")]
    NotFound { entity: String, id: String },

    /// Query translation error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Persistence error
    #[error(transparent)]
    Db(#[from] DbError),

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    pub(crate) fn config(entity: impl Into<String>, message: impl Into<String>) -> Self {
        RepositoryError::Config {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RepositoryError::Validation {
            message: message.into(),
        }
    }
}
