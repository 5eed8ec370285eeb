//! CLI command implementations

pub(crate) mod common;
pub(crate) mod query;
pub(crate) mod schema;
