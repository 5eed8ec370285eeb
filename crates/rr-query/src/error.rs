//! Error types for rr-query

use rr_core::CoreError;
use thiserror::Error;

/// Criteria translation errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Q001: Operator keyword not recognised
    #[error("[Q001] Unsupported query criteria operator for '{field}': {op}")]
    UnsupportedOperator { field: String, op: String },

    /// Q002: Operator requires a value but none was given
    #[error("[Q002] Missing 'value' key in criteria for '{field}'")]
    MissingValue { field: String },

    /// Q003: Criteria or sort key does not name a field of the entity
    #[error("[Q003] Invalid field '{field}' for entity '{entity}'")]
    InvalidField { field: String, entity: String },

    /// Q004: Qualified field path with an alias nothing declares
    #[error("[Q004] Unknown alias '{alias}' in field path '{field}'")]
    UnknownAlias { alias: String, field: String },

    /// Q005: Sort direction other than ASC/DESC
    #[error("[Q005] Invalid sort direction '{direction}' for '{field}'")]
    InvalidSortDirection { field: String, direction: String },

    /// Q006: Entity reference without an identifier
    #[error("[Q006] Entity reference {reference} has no identifier")]
    UnresolvedReference { reference: String },

    /// Q007: Configured SQL fragment failed to parse
    #[error("[Q007] Invalid SQL fragment '{fragment}': {message}")]
    InvalidFragment { fragment: String, message: String },

    /// Q008: Value shape not usable with the operator
    #[error("[Q008] Invalid criterion for '{field}': {message}")]
    InvalidCriterion { field: String, message: String },

    /// Q009: Criteria input that is not a key/value object
    #[error("[Q009] Criteria must be an object, got {found}")]
    NotAnObject { found: String },

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for QueryError
pub type QueryResult<T> = Result<T, QueryError>;
