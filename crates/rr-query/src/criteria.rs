//! Ordered criteria maps as received from callers.

use crate::error::{QueryError, QueryResult};
use rr_core::Value;

/// Raw criterion as supplied by the caller, before operator dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionInput {
    /// A plain value: scalar, `null`, or a bare list
    Value(Value),
    /// An `{op, value}` object; `op` may be absent
    Operation {
        op: Option<String>,
        value: Option<Value>,
    },
}

impl CriterionInput {
    pub fn from_json(json: &serde_json::Value) -> QueryResult<Self> {
        match json {
            serde_json::Value::Object(map) => {
                let op = match map.get("op") {
                    None | Some(serde_json::Value::Null) => None,
                    Some(serde_json::Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                };
                let value = map.get("value").map(Value::from_json).transpose()?;
                Ok(CriterionInput::Operation { op, value })
            }
            other => Ok(CriterionInput::Value(Value::from_json(other)?)),
        }
    }
}

impl From<Value> for CriterionInput {
    fn from(v: Value) -> Self {
        CriterionInput::Value(v)
    }
}

/// Criteria keyed by field path, in caller order.
///
/// Keys are unique; inserting an existing key replaces its input in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, CriterionInput)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object, keeping key order.
    pub fn from_json(json: &serde_json::Value) -> QueryResult<Self> {
        let map = match json {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Ok(Self::new()),
            other => {
                return Err(QueryError::NotAnObject {
                    found: json_kind(other).to_string(),
                })
            }
        };
        let mut criteria = Self::new();
        for (key, value) in map {
            criteria.insert(key.clone(), CriterionInput::from_json(value)?);
        }
        Ok(criteria)
    }

    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| QueryError::NotAnObject {
                found: format!("invalid JSON ({})", e),
            })?;
        Self::from_json(&value)
    }

    /// Add a plain-value criterion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), CriterionInput::Value(value.into()));
        self
    }

    /// Add an operator criterion.
    pub fn with_op(mut self, key: impl Into<String>, op: &str, value: impl Into<Value>) -> Self {
        self.insert(
            key.into(),
            CriterionInput::Operation {
                op: Some(op.to_string()),
                value: Some(value.into()),
            },
        );
        self
    }

    /// Add an operator criterion that takes no value (`IS NULL`).
    pub fn with_unary(mut self, key: impl Into<String>, op: &str) -> Self {
        self.insert(
            key.into(),
            CriterionInput::Operation {
                op: Some(op.to_string()),
                value: None,
            },
        );
        self
    }

    pub fn insert(&mut self, key: String, input: CriterionInput) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = input,
            None => self.entries.push((key, input)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CriterionInput> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<CriterionInput> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Rename a key, keeping its position. An existing entry under the new
    /// name is replaced.
    pub fn rename(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let Some(pos) = self.entries.iter().position(|(k, _)| k == from) else {
            return;
        };
        if let Some(existing) = self.entries.iter().position(|(k, _)| k == to) {
            let input = self.entries.remove(pos).1;
            let target = if existing > pos { existing - 1 } else { existing };
            self.entries[target].1 = input;
            return;
        }
        self.entries[pos].0 = to.to_string();
    }

    /// Merge `other` into this map; keys in `other` win.
    pub fn merge(&mut self, other: Criteria) {
        for (key, input) in other.entries {
            self.insert(key, input);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CriterionInput)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Criteria {
    type Item = (String, CriterionInput);
    type IntoIter = std::vec::IntoIter<(String, CriterionInput)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "criteria_test.rs"]
mod tests;
