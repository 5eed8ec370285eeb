//! Shared serde default functions.

/// Serde default function that returns `true`.
pub fn default_true() -> bool {
    true
}

/// Default identifier field name for entities.
pub fn default_id_field() -> String {
    "id".to_string()
}
