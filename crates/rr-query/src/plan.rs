//! Structured queries before rendering.
//!
//! A [`QueryPlan`] is built by value: every builder step consumes the plan
//! and returns the extended one.

use crate::criterion::Criterion;
use crate::error::{QueryError, QueryResult};
use crate::params::Param;
use rr_core::sql_utils::quote_qualified;
use rr_core::{IdentifierLookup, JoinKind};
use std::fmt;

/// Alias of the root entity's table in every generated query.
pub const ROOT_ALIAS: &str = "e";

/// A joined table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub on: String,
}

impl Join {
    pub fn to_sql(&self) -> String {
        format!(
            "{} {} {} ON {}",
            self.kind.keyword(),
            quote_qualified(&self.table),
            self.alias,
            self.on
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `ASC`/`DESC` in any case.
    pub fn parse(field: &str, direction: &str) -> QueryResult<Self> {
        match direction.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidSortDirection {
                field: field.to_string(),
                direction: direction.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: String,
    pub direction: SortDirection,
}

/// One WHERE term over a resolved SQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Binary {
        expr: String,
        op: &'static str,
        param: Param,
    },
    Like {
        expr: String,
        negate: bool,
        param: Param,
    },
    InSet {
        expr: String,
        negate: bool,
        param: Param,
    },
    NullCheck {
        expr: String,
        negate: bool,
    },
    /// Always-true or always-false term (`IN` over an empty list)
    Constant(bool),
}

impl Predicate {
    /// Build the predicate for a criterion on `expr`, binding its value.
    pub fn from_criterion(
        expr: String,
        field: &str,
        criterion: &Criterion,
        lookup: &dyn IdentifierLookup,
    ) -> QueryResult<Self> {
        Ok(match criterion {
            Criterion::Equals(v) => Predicate::Binary {
                expr,
                op: "=",
                param: Param::wrap(field, v, lookup)?,
            },
            Criterion::NotEquals(v) => Predicate::Binary {
                expr,
                op: "<>",
                param: Param::wrap(field, v, lookup)?,
            },
            Criterion::Compare(op, v) => Predicate::Binary {
                expr,
                op: op.as_sql(),
                param: Param::wrap(field, v, lookup)?,
            },
            Criterion::Like { pattern, negate } => Predicate::Like {
                expr,
                negate: *negate,
                param: Param::wrap(field, &rr_core::Value::Text(pattern.clone()), lookup)?,
            },
            Criterion::InSet { values, negate } if values.is_empty() => {
                Predicate::Constant(*negate)
            }
            Criterion::InSet { values, negate } => Predicate::InSet {
                expr,
                negate: *negate,
                param: Param::wrap(field, &rr_core::Value::List(values.clone()), lookup)?,
            },
            Criterion::NullCheck { negate } => Predicate::NullCheck {
                expr,
                negate: *negate,
            },
        })
    }

    pub fn param(&self) -> Option<&Param> {
        match self {
            Predicate::Binary { param, .. }
            | Predicate::Like { param, .. }
            | Predicate::InSet { param, .. } => Some(param),
            Predicate::NullCheck { .. } | Predicate::Constant(_) => None,
        }
    }
}

/// A query over one root entity table
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    distinct: bool,
    select: Vec<String>,
    table: String,
    alias: String,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    group_by: Vec<String>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryPlan {
    /// Start a plan over `table` aliased as the root alias.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            distinct: false,
            select: Vec::new(),
            table: table.into(),
            alias: ROOT_ALIAS.to_string(),
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn select(mut self, expr: impl Into<String>) -> Self {
        let expr = expr.into();
        if !self.select.contains(&expr) {
            self.select.push(expr);
        }
        self
    }

    /// Replace the select list, keeping joins and predicates.
    pub fn with_select(mut self, exprs: Vec<String>) -> Self {
        self.select = exprs;
        self
    }

    /// Add a join unless one with the same alias exists.
    pub fn join(mut self, join: Join) -> Self {
        if self.joins.iter().any(|j| j.alias == join.alias) {
            log::debug!("Join alias '{}' already present, skipping", join.alias);
        } else {
            self.joins.push(join);
        }
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            expr: expr.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    /// Drop ordering and pagination, for aggregate queries.
    pub fn without_ordering(mut self) -> Self {
        self.order_by.clear();
        self.limit = None;
        self.offset = None;
        self
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn selects(&self) -> &[String] {
        &self.select
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn group_bys(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_bys(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Bound parameters in predicate order, before array expansion.
    pub fn params(&self) -> Vec<&Param> {
        self.predicates.iter().filter_map(Predicate::param).collect()
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
