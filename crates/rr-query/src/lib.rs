//! rr-query - Criteria translation for restrepo
//!
//! Turns loosely-typed criteria maps into parameterized query plans and
//! renders those plans as SQL.

pub mod criteria;
pub mod criterion;
pub mod error;
pub mod params;
pub mod plan;
pub mod render;
pub mod translator;
pub mod validate;

pub use criteria::{Criteria, CriterionInput};
pub use criterion::{CompareOp, Criterion};
pub use error::{QueryError, QueryResult};
pub use params::{Param, ParamType};
pub use plan::{Join, OrderBy, Predicate, QueryPlan, SortDirection, ROOT_ALIAS};
pub use render::{PlaceholderStyle, RenderedQuery};
pub use translator::{order_by_from_json, CriteriaTranslator, ResolvedField};
