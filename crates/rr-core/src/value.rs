//! Runtime values flowing between criteria, entities and the database.

use crate::entity_name::EntityName;
use crate::error::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use std::fmt;

/// Text format used when a datetime is rendered or serialized.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle of an entity inside a session's identity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(pub usize);

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved reference to an entity held by a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity: EntityName,
    pub key: EntityKey,
}

impl EntityRef {
    pub fn new(entity: impl Into<EntityName>, key: EntityKey) -> Self {
        Self {
            entity: entity.into(),
            key,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.entity, self.key)
    }
}

/// Resolves entity references to their identifier value.
///
/// Implemented by the session; used wherever a reference has to become a
/// bindable parameter.
pub trait IdentifierLookup {
    /// Identifier of the referenced entity, or `None` if it has none yet.
    fn identifier_of(&self, entity: &EntityRef) -> Option<Value>;
}

/// Lookup that knows no entities. Every reference is unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentities;

impl IdentifierLookup for NoIdentities {
    fn identifier_of(&self, _entity: &EntityRef) -> Option<Value> {
        None
    }
}

/// A loosely-typed runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Ref(EntityRef),
}

impl Value {
    /// Convert a JSON value. Objects have no value representation.
    pub fn from_json(json: &serde_json::Value) -> CoreResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(CoreError::UnsupportedJson {
                        message: format!("number {} is out of range", n),
                    });
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<CoreResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(_) => {
                return Err(CoreError::UnsupportedJson {
                    message: "objects cannot be used as values".to_string(),
                })
            }
        })
    }

    /// Convert to JSON for display and CLI output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Ref(r) => serde_json::Value::String(r.to_string()),
        }
    }

    /// Whether this value counts as "empty": null, false, zero, `""`, `"0"`
    /// or an empty list. References are never empty.
    pub fn is_empty_like(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty() || s == "0",
            Value::DateTime(_) => false,
            Value::List(items) => items.is_empty(),
            Value::Ref(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Ref(_) => "entity reference",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Ref(r) => write!(f, "{}", r),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<EntityRef> for Value {
    fn from(v: EntityRef) -> Self {
        Value::Ref(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
