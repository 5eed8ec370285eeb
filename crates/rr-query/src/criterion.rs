//! Tagged criterion variants and operator dispatch.

use crate::criteria::CriterionInput;
use crate::error::{QueryError, QueryResult};
use rr_core::Value;
use std::fmt;

/// Ordering comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single parsed filter term
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Equals(Value),
    NotEquals(Value),
    Compare(CompareOp, Value),
    Like { pattern: String, negate: bool },
    InSet { values: Vec<Value>, negate: bool },
    NullCheck { negate: bool },
}

impl Criterion {
    /// Interpret a raw input for `field`.
    ///
    /// `null` means `IS NULL`, a bare list means `IN`, any other plain value
    /// means equality. An operation without `op` is an `IN` over its value.
    pub fn parse(field: &str, input: CriterionInput) -> QueryResult<Self> {
        match input {
            CriterionInput::Value(Value::Null) => Ok(Criterion::NullCheck { negate: false }),
            CriterionInput::Value(Value::List(values)) => Ok(Criterion::InSet {
                values,
                negate: false,
            }),
            CriterionInput::Value(value) => Ok(Criterion::Equals(value)),
            CriterionInput::Operation { op: None, value } => {
                let value = require_value(field, value)?;
                Ok(Criterion::InSet {
                    values: into_list(value),
                    negate: false,
                })
            }
            CriterionInput::Operation {
                op: Some(op),
                value,
            } => Self::parse_operation(field, &op, value),
        }
    }

    /// Dispatch on an operator keyword. Keywords are case-insensitive and
    /// surrounding or repeated whitespace is ignored.
    pub fn parse_operation(field: &str, op: &str, value: Option<Value>) -> QueryResult<Self> {
        let keyword = op
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match keyword.as_str() {
            "IS NULL" => return Ok(Criterion::NullCheck { negate: false }),
            "IS NOT NULL" => return Ok(Criterion::NullCheck { negate: true }),
            "LIKE" | "NOT LIKE" | "IN" | "NOT IN" | "=" | "==" | "!=" | "<>" | "<" | ">"
            | "<=" | ">=" => {}
            _ => {
                return Err(QueryError::UnsupportedOperator {
                    field: field.to_string(),
                    op: op.to_string(),
                })
            }
        }

        let value = require_value(field, value)?;
        match keyword.as_str() {
            "LIKE" => Ok(Criterion::Like {
                pattern: like_pattern(field, value)?,
                negate: false,
            }),
            "NOT LIKE" => Ok(Criterion::Like {
                pattern: like_pattern(field, value)?,
                negate: true,
            }),
            "IN" => Ok(Criterion::InSet {
                values: into_list(value),
                negate: false,
            }),
            "NOT IN" => Ok(Criterion::InSet {
                values: into_list(value),
                negate: true,
            }),
            "=" | "==" => Ok(Criterion::Equals(scalar(field, value)?)),
            "!=" | "<>" => Ok(Criterion::NotEquals(scalar(field, value)?)),
            "<" => Ok(Criterion::Compare(CompareOp::Lt, scalar(field, value)?)),
            ">" => Ok(Criterion::Compare(CompareOp::Gt, scalar(field, value)?)),
            "<=" => Ok(Criterion::Compare(CompareOp::Le, scalar(field, value)?)),
            _ => Ok(Criterion::Compare(CompareOp::Ge, scalar(field, value)?)),
        }
    }

    /// Number of bound parameters this criterion needs before array
    /// expansion.
    pub fn param_count(&self) -> usize {
        match self {
            Criterion::NullCheck { .. } => 0,
            Criterion::InSet { values, .. } if values.is_empty() => 0,
            _ => 1,
        }
    }
}

fn require_value(field: &str, value: Option<Value>) -> QueryResult<Value> {
    match value {
        None | Some(Value::Null) => Err(QueryError::MissingValue {
            field: field.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::List(values) => values,
        other => vec![other],
    }
}

fn scalar(field: &str, value: Value) -> QueryResult<Value> {
    match value {
        Value::List(_) => Err(QueryError::InvalidCriterion {
            field: field.to_string(),
            message: "a list cannot be compared with a scalar operator".to_string(),
        }),
        other => Ok(other),
    }
}

/// `LIKE` patterns without a `%` wildcard match anywhere in the value.
fn like_pattern(field: &str, value: Value) -> QueryResult<String> {
    let text = match value {
        Value::Text(s) => s,
        Value::Int(_) | Value::Float(_) => value.to_string(),
        other => {
            return Err(QueryError::InvalidCriterion {
                field: field.to_string(),
                message: format!("LIKE needs a text pattern, got {}", other.type_name()),
            })
        }
    };
    if text.contains('%') {
        Ok(text)
    } else {
        Ok(format!("%{}%", text))
    }
}

#[cfg(test)]
#[path = "criterion_test.rs"]
mod tests;
