//! rr-core - Core library for restrepo
//!
//! This crate provides the shared vocabulary used across all restrepo
//! components: runtime values, entity metadata, in-memory entity records,
//! the per-entity accessor tables, and the `restrepo.yml` configuration.

pub mod accessor;
pub mod config;
pub mod entity;
pub mod entity_name;
pub mod error;
pub mod metadata;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod value;

pub use accessor::{Accessor, AccessorTable};
pub use config::{
    Config, DatabaseConfig, ForeignCriterionRule, JoinClause, JoinKind, RepositoryConfig,
};
pub use entity::{Entity, EntityState, Relation};
pub use entity_name::EntityName;
pub use error::{CoreError, CoreResult};
pub use metadata::{
    AssociationDef, AssociationKind, ColumnSource, EntityMetadata, FieldDef, FieldType,
    MetadataRegistry,
};
pub use value::{EntityKey, EntityRef, IdentifierLookup, NoIdentities, Value};
