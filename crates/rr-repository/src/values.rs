//! Write payloads

use crate::error::{RepositoryError, RepositoryResult};
use rr_core::Value;
use std::collections::BTreeMap;

/// Attribute name to raw value, as handed to `create` / `update`
pub type Values = BTreeMap<String, Value>;

/// Build a payload from a JSON object. `null` is an empty payload.
pub fn values_from_json(json: &serde_json::Value) -> RepositoryResult<Values> {
    match json {
        serde_json::Value::Null => Ok(Values::new()),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), Value::from_json(value)?)))
            .collect(),
        other => Err(RepositoryError::validation(format!(
            "values must be a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "values_test.rs"]
mod tests;
