//! Validation of configured SQL fragments.
//!
//! Extra selects and join conditions come from repository configuration and
//! are spliced into generated SQL verbatim. Each one is parsed with the
//! DuckDB dialect inside a probe statement at repository construction.

use crate::error::{QueryError, QueryResult};
use rr_core::JoinClause;
use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

/// Check that `expr` is a single select-list expression.
pub fn validate_select(expr: &str) -> QueryResult<()> {
    let probe = format!("SELECT {} FROM probe_root e", expr);
    parse_probe(expr, &probe)
}

/// Check that a configured join parses as a join clause.
pub fn validate_join(join: &JoinClause) -> QueryResult<()> {
    let fragment = format!("{} {} {} ON {}", join.kind.keyword(), join.table, join.alias, join.on);
    let probe = format!("SELECT 1 FROM probe_root e {}", fragment);
    parse_probe(&fragment, &probe)
}

fn parse_probe(fragment: &str, probe: &str) -> QueryResult<()> {
    let invalid = |message: String| QueryError::InvalidFragment {
        fragment: fragment.to_string(),
        message,
    };

    let statements = Parser::parse_sql(&DuckDbDialect {}, probe).map_err(|e| invalid(e.to_string()))?;
    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [] => Err(invalid("fragment is empty".to_string())),
        [_] => Err(invalid("fragment is not part of a query".to_string())),
        _ => Err(invalid("fragment contains multiple statements".to_string())),
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
