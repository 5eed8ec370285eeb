//! SQL rendering of query plans.

use crate::params::Param;
use crate::plan::{Predicate, QueryPlan};
use rr_core::sql_utils::quote_qualified;
use std::fmt::Write;

/// How positional placeholders are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?1, ?2, ...`
    #[default]
    Numbered,
    /// `$1, $2, ...` as DuckDB prepared statements expect
    Dollar,
}

impl PlaceholderStyle {
    fn placeholder(&self, position: usize) -> String {
        match self {
            PlaceholderStyle::Numbered => format!("?{}", position),
            PlaceholderStyle::Dollar => format!("${}", position),
        }
    }
}

/// Final SQL text plus its scalar parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl QueryPlan {
    /// Render clauses in SELECT/FROM/JOIN/WHERE/GROUP BY/ORDER BY/LIMIT/OFFSET
    /// order. Array parameters expand to one placeholder per element.
    pub fn render(&self, style: PlaceholderStyle) -> RenderedQuery {
        let mut sql = String::from("SELECT ");
        let mut params: Vec<Param> = Vec::new();

        if self.is_distinct() {
            sql.push_str("DISTINCT ");
        }
        if self.selects().is_empty() {
            let _ = write!(sql, "{}.*", self.alias());
        } else {
            sql.push_str(&self.selects().join(", "));
        }

        let _ = write!(sql, " FROM {} {}", quote_qualified(self.table()), self.alias());

        for join in self.joins() {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates().is_empty() {
            let terms: Vec<String> = self
                .predicates()
                .iter()
                .map(|p| render_predicate(p, style, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&terms.join(" AND "));
        }

        if !self.group_bys().is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_bys().join(", "));
        }

        if !self.order_bys().is_empty() {
            let terms: Vec<String> = self
                .order_bys()
                .iter()
                .map(|o| format!("{} {}", o.expr, o.direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit_value() {
            let _ = write!(sql, " LIMIT {}", limit);
        }
        if let Some(offset) = self.offset_value() {
            let _ = write!(sql, " OFFSET {}", offset);
        }

        log::debug!("Rendered query: {} ({} params)", sql, params.len());
        RenderedQuery { sql, params }
    }
}

fn render_predicate(predicate: &Predicate, style: PlaceholderStyle, params: &mut Vec<Param>) -> String {
    match predicate {
        Predicate::Binary { expr, op, param } => {
            let placeholder = bind(param, style, params).join(", ");
            format!("{} {} {}", expr, op, placeholder)
        }
        Predicate::Like { expr, negate, param } => {
            let placeholder = bind(param, style, params).join(", ");
            let keyword = if *negate { "NOT LIKE" } else { "LIKE" };
            format!("{} {} {}", expr, keyword, placeholder)
        }
        Predicate::InSet { expr, negate, param } => {
            let placeholders = bind(param, style, params).join(", ");
            let keyword = if *negate { "NOT IN" } else { "IN" };
            format!("{} {} ({})", expr, keyword, placeholders)
        }
        Predicate::NullCheck { expr, negate } => {
            let keyword = if *negate { "IS NOT NULL" } else { "IS NULL" };
            format!("{} {}", expr, keyword)
        }
        Predicate::Constant(true) => "1 = 1".to_string(),
        Predicate::Constant(false) => "1 = 0".to_string(),
    }
}

/// Append the expanded parameter and return its placeholders.
fn bind(param: &Param, style: PlaceholderStyle, params: &mut Vec<Param>) -> Vec<String> {
    param
        .expand()
        .into_iter()
        .map(|p| {
            params.push(p);
            style.placeholder(params.len())
        })
        .collect()
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
