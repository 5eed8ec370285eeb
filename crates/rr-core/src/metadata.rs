//! Entity metadata: the mapping of entity types onto tables, columns and
//! associations.

use crate::entity_name::EntityName;
use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::{default_id_field, default_true};
use crate::sql_utils::is_valid_ident;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Datetime text formats accepted when coercing input, tried in order.
const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Declared type of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
    DateTime,
}

impl FieldType {
    /// Column type used for this field in generated DDL.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "BIGINT",
            FieldType::Float => "DOUBLE",
            FieldType::Text => "VARCHAR",
            FieldType::Boolean => "BOOLEAN",
            FieldType::DateTime => "TIMESTAMP",
        }
    }

    /// Coerce a loosely-typed input value to this type.
    ///
    /// `Null` passes through unchanged; nullability is checked by the caller.
    pub fn coerce(&self, field: &str, value: Value) -> CoreResult<Value> {
        let mismatch = |found: &Value| CoreError::TypeMismatch {
            field: field.to_string(),
            expected: self.to_string(),
            found: found.type_name().to_string(),
        };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),

            (FieldType::Integer, Value::Int(i)) => Ok(Value::Int(i)),
            (FieldType::Integer, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (FieldType::Integer, Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Int(f as i64)),
            (FieldType::Integer, Value::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => Err(mismatch(&Value::Text(s))),
            },

            (FieldType::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (FieldType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (FieldType::Float, Value::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) => Ok(Value::Float(f)),
                Err(_) => Err(mismatch(&Value::Text(s))),
            },

            (FieldType::Text, Value::Text(s)) => Ok(Value::Text(s)),
            (FieldType::Text, Value::Int(i)) => Ok(Value::Text(i.to_string())),
            (FieldType::Text, Value::Float(f)) => Ok(Value::Text(f.to_string())),

            (FieldType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (FieldType::Boolean, Value::Int(i)) if i == 0 || i == 1 => Ok(Value::Bool(i == 1)),
            (FieldType::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&Value::Text(s))),
            },

            (FieldType::DateTime, Value::DateTime(dt)) => Ok(Value::DateTime(dt)),
            (FieldType::DateTime, Value::Text(s)) => match parse_datetime(&s) {
                Some(dt) => Ok(Value::DateTime(dt)),
                None => Err(mismatch(&Value::Text(s))),
            },

            (_, other) => Err(mismatch(&other)),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
        };
        f.write_str(s)
    }
}

/// Parse datetime input in any of the accepted text formats.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    for format in DATETIME_INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A scalar field of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub nullable: bool,

    /// Value assigned by the database on insert (identity columns)
    #[serde(default)]
    pub generated: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            generated: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }
}

/// Kind of relationship between two entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    ManyToOne,
    OneToOne,
    OneToMany,
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssociationKind::ManyToOne => "many_to_one",
            AssociationKind::OneToOne => "one_to_one",
            AssociationKind::OneToMany => "one_to_many",
        };
        f.write_str(s)
    }
}

/// A relationship field of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationDef {
    pub name: String,

    pub kind: AssociationKind,

    pub target: EntityName,

    /// Foreign key column on the owning side; defaults to `<name>_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<String>,

    /// Field on the target type that points back (owning side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversed_by: Option<String>,

    /// Field on the target type that owns this relationship (inverse side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,

    #[serde(default = "default_true")]
    pub nullable: bool,
}

impl AssociationDef {
    pub fn new(name: impl Into<String>, kind: AssociationKind, target: impl Into<EntityName>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            join_column: None,
            inversed_by: None,
            mapped_by: None,
            nullable: true,
        }
    }

    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inversed_by = Some(field.into());
        self
    }

    pub fn mapped_by(mut self, field: impl Into<String>) -> Self {
        self.mapped_by = Some(field.into());
        self
    }

    /// Whether this side holds the foreign key column.
    pub fn is_owning(&self) -> bool {
        match self.kind {
            AssociationKind::ManyToOne => true,
            AssociationKind::OneToOne => self.mapped_by.is_none(),
            AssociationKind::OneToMany => false,
        }
    }

    /// Whether this side holds a collection of related entities.
    pub fn is_collection(&self) -> bool {
        self.kind == AssociationKind::OneToMany
    }

    /// Foreign key column, for owning sides only.
    pub fn join_column(&self) -> Option<String> {
        if !self.is_owning() {
            return None;
        }
        Some(
            self.join_column
                .clone()
                .unwrap_or_else(|| format!("{}_id", self.name)),
        )
    }

    /// Name of the field on the target type that mirrors this one.
    pub fn inverse_field(&self) -> Option<&str> {
        if self.is_owning() {
            self.inversed_by.as_deref()
        } else {
            self.mapped_by.as_deref()
        }
    }
}

/// Where a table column comes from
#[derive(Debug, Clone, Copy)]
pub enum ColumnSource<'a> {
    Field(&'a FieldDef),
    JoinColumn(&'a AssociationDef),
}

/// Metadata for one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityMetadata {
    pub name: EntityName,

    pub table: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    #[serde(default)]
    pub fields: Vec<FieldDef>,

    #[serde(default)]
    pub associations: Vec<AssociationDef>,
}

impl EntityMetadata {
    /// Create metadata with a generated integer `id` field.
    pub fn new(name: impl Into<EntityName>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_field: default_id_field(),
            fields: vec![FieldDef::new("id", FieldType::Integer).generated()],
            associations: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_association(mut self, association: AssociationDef) -> Self {
        self.associations.push(association);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDef> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// The identifier field definition.
    pub fn id_def(&self) -> Option<&FieldDef> {
        self.field(&self.id_field)
    }

    /// Whether the identifier is assigned by the database.
    pub fn id_is_generated(&self) -> bool {
        self.id_def().map(|f| f.generated).unwrap_or(false)
    }

    /// All table columns in declaration order: fields first, then the join
    /// columns of owning associations.
    pub fn columns(&self) -> Vec<(String, ColumnSource<'_>)> {
        let mut columns: Vec<(String, ColumnSource<'_>)> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), ColumnSource::Field(f)))
            .collect();
        for assoc in &self.associations {
            if let Some(column) = assoc.join_column() {
                columns.push((column, ColumnSource::JoinColumn(assoc)));
            }
        }
        columns
    }

    /// Column backing a field or owning association, if any.
    pub fn column_for(&self, name: &str) -> Option<String> {
        if self.field(name).is_some() {
            return Some(name.to_string());
        }
        self.association(name).and_then(|a| a.join_column())
    }

    /// Check internal consistency of this entity's metadata.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |message: String| CoreError::InvalidMetadata {
            entity: self.name.to_string(),
            message,
        };

        if !is_valid_ident(&self.table) {
            return Err(invalid(format!("table name '{}' is not a valid identifier", self.table)));
        }
        if self.id_def().is_none() {
            return Err(invalid(format!("identifier field '{}' is not declared", self.id_field)));
        }

        let mut seen = HashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.associations.iter().map(|a| a.name.as_str()));
        for name in names {
            if !is_valid_ident(name) {
                return Err(invalid(format!("'{}' is not a valid identifier", name)));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("'{}' is declared more than once", name)));
            }
        }

        let mut columns = HashSet::new();
        for (column, _) in self.columns() {
            if !is_valid_ident(&column) {
                return Err(invalid(format!("column '{}' is not a valid identifier", column)));
            }
            if !columns.insert(column.clone()) {
                return Err(invalid(format!("column '{}' is mapped more than once", column)));
            }
        }

        for assoc in &self.associations {
            if assoc.kind == AssociationKind::OneToMany && assoc.mapped_by.is_none() {
                return Err(invalid(format!(
                    "one_to_many association '{}' requires mapped_by",
                    assoc.name
                )));
            }
            if assoc.kind == AssociationKind::ManyToOne && assoc.mapped_by.is_some() {
                return Err(invalid(format!(
                    "many_to_one association '{}' cannot be mapped_by",
                    assoc.name
                )));
            }
            if assoc.inversed_by.is_some() && assoc.mapped_by.is_some() {
                return Err(invalid(format!(
                    "association '{}' cannot declare both inversed_by and mapped_by",
                    assoc.name
                )));
            }
        }

        Ok(())
    }
}

/// All known entity types, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entities: BTreeMap<EntityName, EntityMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity type after validating it.
    pub fn register(&mut self, metadata: EntityMetadata) -> CoreResult<()> {
        metadata.validate()?;
        if self.entities.contains_key(&metadata.name) {
            return Err(CoreError::DuplicateEntity {
                name: metadata.name.to_string(),
            });
        }
        log::debug!(
            "Registered entity '{}' on table '{}'",
            metadata.name,
            metadata.table
        );
        self.entities.insert(metadata.name.clone(), metadata);
        Ok(())
    }

    pub fn from_entities(entities: impl IntoIterator<Item = EntityMetadata>) -> CoreResult<Self> {
        let mut registry = Self::new();
        for metadata in entities {
            registry.register(metadata)?;
        }
        Ok(registry)
    }

    /// Parse a YAML list of entity definitions.
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let entities: Vec<EntityMetadata> = serde_yaml::from_str(yaml)?;
        Self::from_entities(entities)
    }

    pub fn get(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }

    /// Like [`get`](Self::get) but unknown names are an error.
    pub fn require(&self, name: &str) -> CoreResult<&EntityMetadata> {
        self.get(name).ok_or_else(|| CoreError::UnknownEntity {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityMetadata> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod tests;
