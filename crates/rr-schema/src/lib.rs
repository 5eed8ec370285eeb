//! rr-schema - Schema snapshots and migrations for restrepo
//!
//! [`Schema`] snapshots are compared with [`compare`] into a [`SchemaDiff`],
//! which renders ordered migration SQL for a [`SchemaPlatform`]. The target
//! schema for a set of entities comes from [`Schema::from_metadata`].

pub mod builder;
pub mod comparator;
pub mod diff;
pub mod error;
pub mod migration;
pub mod platform;
pub mod schema;

pub use builder::id_sequence_name;
pub use comparator::{compare, Comparator};
pub use diff::{ColumnDiff, ColumnProperty, RenamedColumn, SchemaDiff, TableDiff, TableForeignKey};
pub use error::{SchemaError, SchemaResult};
pub use migration::{create_sql, update_sql};
pub use platform::{platform_for, DuckDbPlatform, GenericPlatform, SchemaPlatform};
pub use schema::{Column, ForeignKey, Index, Schema, Sequence, Table};
