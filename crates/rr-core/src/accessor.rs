//! Statically registered accessors for entity fields and associations.
//!
//! Each entity type gets an [`AccessorTable`] built once from its metadata.
//! Repositories bind attribute names to these accessors at construction time
//! and never look fields up by name while handling a request.

use crate::entity::{Entity, Relation};
use crate::entity_name::EntityName;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntityMetadata, FieldType};
use crate::value::{EntityKey, Value};
use std::collections::BTreeMap;

/// Typed read/write access to one field or association
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Scalar {
        field: String,
        field_type: FieldType,
        nullable: bool,
    },
    Reference {
        field: String,
        target: EntityName,
        owning: bool,
    },
    Collection {
        field: String,
        target: EntityName,
    },
}

impl Accessor {
    pub fn field(&self) -> &str {
        match self {
            Accessor::Scalar { field, .. }
            | Accessor::Reference { field, .. }
            | Accessor::Collection { field, .. } => field,
        }
    }

    /// Target entity type for association accessors.
    pub fn target(&self) -> Option<&EntityName> {
        match self {
            Accessor::Scalar { .. } => None,
            Accessor::Reference { target, .. } | Accessor::Collection { target, .. } => {
                Some(target)
            }
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Accessor::Collection { .. })
    }

    /// Coerce an input value for a scalar accessor, enforcing nullability.
    pub fn coerce(&self, value: Value) -> CoreResult<Value> {
        match self {
            Accessor::Scalar {
                field,
                field_type,
                nullable,
            } => {
                let coerced = field_type.coerce(field, value)?;
                if coerced.is_null() && !nullable {
                    return Err(CoreError::TypeMismatch {
                        field: field.clone(),
                        expected: format!("non-null {}", field_type),
                        found: "null".to_string(),
                    });
                }
                Ok(coerced)
            }
            _ => Err(self.wrong_kind("scalar")),
        }
    }

    /// Write an already coerced scalar value.
    pub fn write(&self, entity: &mut Entity, value: Value) -> CoreResult<()> {
        match self {
            Accessor::Scalar { field, .. } => {
                entity.set(field, value);
                Ok(())
            }
            _ => Err(self.wrong_kind("scalar")),
        }
    }

    pub fn read<'e>(&self, entity: &'e Entity) -> Option<&'e Value> {
        entity.get(self.field())
    }

    /// Current single-valued target; `None` when the relation is unloaded.
    pub fn get_reference(&self, entity: &Entity) -> CoreResult<Option<Option<EntityKey>>> {
        match self {
            Accessor::Reference { field, .. } => Ok(entity.reference(field)),
            _ => Err(self.wrong_kind("reference")),
        }
    }

    pub fn set_reference(&self, entity: &mut Entity, target: Option<EntityKey>) -> CoreResult<()> {
        match self {
            Accessor::Reference { field, .. } => {
                entity.set_relation(field, Relation::One(target));
                Ok(())
            }
            _ => Err(self.wrong_kind("reference")),
        }
    }

    /// Add a member to a loaded collection. Adding an existing member is a no-op.
    pub fn add_to_collection(&self, entity: &mut Entity, member: EntityKey) -> CoreResult<()> {
        let mut members = self.loaded_members(entity)?;
        if !members.contains(&member) {
            members.push(member);
            entity.set_relation(self.field(), Relation::Many(members));
        }
        Ok(())
    }

    /// Remove a member from a loaded collection. Missing members are ignored.
    pub fn remove_from_collection(&self, entity: &mut Entity, member: EntityKey) -> CoreResult<()> {
        let mut members = self.loaded_members(entity)?;
        let before = members.len();
        members.retain(|k| *k != member);
        if members.len() != before {
            entity.set_relation(self.field(), Relation::Many(members));
        }
        Ok(())
    }

    fn loaded_members(&self, entity: &Entity) -> CoreResult<Vec<EntityKey>> {
        match self {
            Accessor::Collection { field, .. } => entity
                .collection(field)
                .map(<[EntityKey]>::to_vec)
                .ok_or_else(|| CoreError::InvalidMetadata {
                    entity: entity.name.to_string(),
                    message: format!("collection '{}' is not loaded", field),
                }),
            _ => Err(self.wrong_kind("collection")),
        }
    }

    fn wrong_kind(&self, expected: &str) -> CoreError {
        CoreError::InvalidMetadata {
            entity: self.target().map(|t| t.to_string()).unwrap_or_default(),
            message: format!("'{}' is not a {} accessor", self.field(), expected),
        }
    }
}

/// All accessors of one entity type, keyed by field name
#[derive(Debug, Clone)]
pub struct AccessorTable {
    entity: EntityName,
    accessors: BTreeMap<String, Accessor>,
}

impl AccessorTable {
    pub fn build(meta: &EntityMetadata) -> Self {
        let mut accessors = BTreeMap::new();
        for field in &meta.fields {
            accessors.insert(
                field.name.clone(),
                Accessor::Scalar {
                    field: field.name.clone(),
                    field_type: field.field_type,
                    nullable: field.nullable,
                },
            );
        }
        for assoc in &meta.associations {
            let accessor = if assoc.is_collection() {
                Accessor::Collection {
                    field: assoc.name.clone(),
                    target: assoc.target.clone(),
                }
            } else {
                Accessor::Reference {
                    field: assoc.name.clone(),
                    target: assoc.target.clone(),
                    owning: assoc.is_owning(),
                }
            };
            accessors.insert(assoc.name.clone(), accessor);
        }
        Self {
            entity: meta.name.clone(),
            accessors,
        }
    }

    pub fn entity(&self) -> &EntityName {
        &self.entity
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.values()
    }
}

/// Operation identifier for an attribute: underscores stripped, each word
/// capitalized (`first_name` -> `FirstName`).
pub fn operation_name(attribute: &str) -> String {
    attribute
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "accessor_test.rs"]
mod tests;
