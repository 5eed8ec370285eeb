//! rr-db - Persistence layer for restrepo
//!
//! This crate provides the [`Connection`] abstraction with its DuckDB
//! backend, and the [`Session`]: an identity map with lazy relations and a
//! unit of work that writes pending changes on [`Session::flush`].

pub mod commit_order;
pub mod duckdb;
pub mod error;
pub mod session;
pub mod traits;

pub use commit_order::CommitOrder;
pub use duckdb::DuckDbConnection;
pub use error::{DbError, DbResult};
pub use session::{FlushSummary, Session};
pub use traits::{with_transaction, Connection, Rows};
