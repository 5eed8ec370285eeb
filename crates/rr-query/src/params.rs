//! Typed parameter bindings.

use crate::error::{QueryError, QueryResult};
use rr_core::{IdentifierLookup, Value};
use std::fmt;

/// Binding type inferred from a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Null,
    Text,
    Integer,
    Float,
    DateTime,
    IntArray,
    TextArray,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::Null => "null",
            ParamType::Text => "text",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::DateTime => "datetime",
            ParamType::IntArray => "int[]",
            ParamType::TextArray => "text[]",
        };
        f.write_str(s)
    }
}

/// A bound parameter: a plain value plus its binding type
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    pub param_type: ParamType,
}

impl Param {
    /// Wrap a criterion value for binding.
    ///
    /// Booleans bind as integers 0/1, entity references bind as their
    /// identifier, and lists are typed by their first element.
    pub fn wrap(field: &str, value: &Value, lookup: &dyn IdentifierLookup) -> QueryResult<Self> {
        match value {
            Value::List(items) => {
                let values = items
                    .iter()
                    .map(|item| Ok(Self::wrap_scalar(field, item, lookup)?.value))
                    .collect::<QueryResult<Vec<_>>>()?;
                let param_type = match values.first() {
                    Some(Value::Int(_)) => ParamType::IntArray,
                    _ => ParamType::TextArray,
                };
                Ok(Param {
                    value: Value::List(values),
                    param_type,
                })
            }
            other => Self::wrap_scalar(field, other, lookup),
        }
    }

    fn wrap_scalar(field: &str, value: &Value, lookup: &dyn IdentifierLookup) -> QueryResult<Self> {
        let (value, param_type) = match value {
            Value::Ref(entity) => {
                let id = lookup.identifier_of(entity).ok_or_else(|| {
                    QueryError::UnresolvedReference {
                        reference: entity.to_string(),
                    }
                })?;
                return Self::wrap_scalar(field, &id, lookup);
            }
            Value::Null => (Value::Null, ParamType::Null),
            Value::Bool(b) => (Value::Int(i64::from(*b)), ParamType::Integer),
            Value::Int(i) => (Value::Int(*i), ParamType::Integer),
            Value::Float(f) => (Value::Float(*f), ParamType::Float),
            Value::Text(s) => (Value::Text(s.clone()), ParamType::Text),
            Value::DateTime(dt) => (Value::DateTime(*dt), ParamType::DateTime),
            Value::List(_) => {
                return Err(QueryError::InvalidCriterion {
                    field: field.to_string(),
                    message: "nested lists are not supported".to_string(),
                })
            }
        };
        Ok(Param { value, param_type })
    }

    /// Scalar parameters after array expansion, in binding order.
    pub fn expand(&self) -> Vec<Param> {
        match (&self.value, self.param_type) {
            (Value::List(items), ParamType::IntArray | ParamType::TextArray) => items
                .iter()
                .map(|item| Param {
                    value: item.clone(),
                    param_type: scalar_type(item),
                })
                .collect(),
            _ => vec![self.clone()],
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.param_type, ParamType::IntArray | ParamType::TextArray)
    }
}

fn scalar_type(value: &Value) -> ParamType {
    match value {
        Value::Null => ParamType::Null,
        Value::Int(_) | Value::Bool(_) => ParamType::Integer,
        Value::Float(_) => ParamType::Float,
        Value::DateTime(_) => ParamType::DateTime,
        _ => ParamType::Text,
    }
}

#[cfg(test)]
#[path = "params_test.rs"]
mod tests;
