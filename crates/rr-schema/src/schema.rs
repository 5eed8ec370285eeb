//! Schema snapshot types
//!
//! A [`Schema`] is a database structure described as data: tables with
//! their columns, primary key, indexes and foreign keys, plus sequences.
//! Snapshots are read from and written to YAML. Names compare
//! case-insensitively, as SQL identifiers do.

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

/// Normalize an identifier for comparison
pub(crate) fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn same_names(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// A complete database structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequences: Vec<Sequence>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a snapshot from a YAML file.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            SchemaError::Parse { message } => SchemaError::Parse {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parse and validate a snapshot from YAML text.
    pub fn from_yaml_str(yaml: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_yaml::from_str(yaml).map_err(|e| SchemaError::Parse {
            message: e.to_string(),
        })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn to_yaml_string(&self) -> SchemaResult<String> {
        serde_yaml::to_string(self).map_err(|e| SchemaError::Parse {
            message: e.to_string(),
        })
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequence(name).is_some()
    }

    /// Check name uniqueness and that every key refers to existing columns.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(fold(&table.name)) {
                return Err(SchemaError::DuplicateTable {
                    name: table.name.clone(),
                });
            }
            table.validate()?;
        }

        let mut seen = HashSet::new();
        for sequence in &self.sequences {
            if !seen.insert(fold(&sequence.name)) {
                return Err(SchemaError::DuplicateSequence {
                    name: sequence.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One table of a [`Schema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Table {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }

    /// Get a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    fn validate(&self) -> SchemaResult<()> {
        let invalid = |message: String| SchemaError::InvalidTable {
            table: self.name.clone(),
            message,
        };

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(fold(&column.name)) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        for column in &self.primary_key {
            if !self.has_column(column) {
                return Err(invalid(format!("primary key column '{}' does not exist", column)));
            }
        }
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(invalid(format!("index '{}' has no columns", index.name)));
            }
            if let Some(missing) = index.columns.iter().find(|c| !self.has_column(c)) {
                return Err(invalid(format!(
                    "index '{}' refers to unknown column '{}'",
                    index.name, missing
                )));
            }
        }
        for key in &self.foreign_keys {
            if key.columns.is_empty() || key.columns.len() != key.foreign_columns.len() {
                return Err(invalid(format!(
                    "foreign key '{}' must pair each local column with one foreign column",
                    key.name
                )));
            }
            if let Some(missing) = key.columns.iter().find(|c| !self.has_column(c)) {
                return Err(invalid(format!(
                    "foreign key '{}' refers to unknown column '{}'",
                    key.name, missing
                )));
            }
        }
        Ok(())
    }
}

/// A table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
    pub name: String,

    /// SQL type, e.g. `BIGINT` or `VARCHAR`
    #[serde(rename = "type", alias = "data_type")]
    pub column_type: String,

    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Default value as a SQL expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Column type normalized for comparison
    pub(crate) fn normalized_type(&self) -> String {
        self.column_type.trim().to_ascii_uppercase()
    }
}

/// A named index over one or more columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    pub name: String,

    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Same columns in the same order with the same uniqueness; the name
    /// is not part of the definition.
    pub fn same_definition(&self, other: &Index) -> bool {
        self.unique == other.unique && same_names(&self.columns, &other.columns)
    }
}

/// A foreign key declared on the table that holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKey {
    pub name: String,

    pub columns: Vec<String>,

    pub foreign_table: String,

    pub foreign_columns: Vec<String>,

    /// Referential action, e.g. `CASCADE` or `SET NULL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        foreign_table: impl Into<String>,
        foreign_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            foreign_table: foreign_table.into(),
            foreign_columns: foreign_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn references(&self, table: &str) -> bool {
        self.foreign_table.eq_ignore_ascii_case(table)
    }

    /// Same columns, target and referential action; the name is not part of
    /// the definition.
    pub fn same_definition(&self, other: &ForeignKey) -> bool {
        let action = |k: &ForeignKey| k.on_delete.as_deref().map(str::to_ascii_uppercase);
        same_names(&self.columns, &other.columns)
            && self.references(&other.foreign_table)
            && same_names(&self.foreign_columns, &other.foreign_columns)
            && action(self) == action(other)
    }
}

/// A database sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sequence {
    pub name: String,

    #[serde(default = "default_one")]
    pub start: i64,

    #[serde(default = "default_one")]
    pub increment: i64,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: 1,
            increment: 1,
        }
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn increment(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
