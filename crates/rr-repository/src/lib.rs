//! rr-repository - Generic repositories for restrepo
//!
//! A [`Repository`] gives CRUD access to one entity type over a shared
//! [`rr_db::Session`]. Its attribute lists are resolved into
//! [`AttributeMappings`] once at construction; writes go through the
//! [`EntityMutator`], which keeps both sides of bidirectional associations
//! in step, and reads go through the criteria translator and
//! [`QueryExecutor`]. [`CollectionService`] adds a stateful, owner-scoped
//! front for listing and editing one collection.

pub mod error;
pub mod executor;
pub mod hooks;
pub mod mapping;
pub mod mutator;
pub mod repository;
pub mod service;
pub mod values;

pub use error::{RepositoryError, RepositoryResult};
pub use executor::{Aggregate, QueryExecutor};
pub use hooks::{Hook, HookContext, HookPipeline, HookStage, WriteStage, WriteTracker};
pub use mapping::{AttributeMappings, ForeignMapping, InverseBinding, LocalMapping};
pub use mutator::{EntityMutator, MutationPlan};
pub use repository::Repository;
pub use service::CollectionService;
pub use values::{values_from_json, Values};
