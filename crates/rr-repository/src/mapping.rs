//! Attribute mapping resolution
//!
//! Turns the declarative attribute lists of a repository into bound
//! accessors once, at construction. Foreign attributes also carry the
//! bindings needed to keep the inverse side of their association in step.

use crate::error::{RepositoryError, RepositoryResult};
use rr_core::accessor::operation_name;
use rr_core::{Accessor, AccessorTable, AssociationKind, EntityName, MetadataRegistry};

/// A local (scalar) attribute bound to its accessor
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMapping {
    pub attribute: String,
    /// Setter operation, e.g. `setFirstName`
    pub operation: String,
    pub accessor: Accessor,
}

/// How the inverse side of a foreign attribute is maintained
#[derive(Debug, Clone, PartialEq)]
pub struct InverseBinding {
    /// Inverse field on the target type
    pub field: String,
    /// Accessor of the inverse field, on the target type
    pub accessor: Accessor,
    /// Getter for the current related entity, e.g. `getTeam`
    pub get_old: String,
    /// Operation detaching the old related entity, e.g. `getMembers`
    pub remove_old: String,
    /// Operation attaching the new related entity, e.g. `addUser`
    pub establish: String,
}

impl InverseBinding {
    pub fn is_collection(&self) -> bool {
        self.accessor.is_collection()
    }
}

/// A foreign (association) attribute bound to its accessor
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignMapping {
    pub attribute: String,
    /// Setter operation, e.g. `setTeam`
    pub operation: String,
    pub accessor: Accessor,
    pub target: EntityName,
    pub inverse: Option<InverseBinding>,
}

/// Resolved mappings for one attribute set (create or update)
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMappings {
    entity: EntityName,
    local: Vec<LocalMapping>,
    foreign: Vec<ForeignMapping>,
}

impl AttributeMappings {
    /// Resolve attribute lists against the metadata of `entity`.
    ///
    /// Fails when a local attribute is not a declared field, a foreign
    /// attribute is not an owning single-valued association, its target type
    /// is unknown, or its declared inverse field does not exist on the target.
    pub fn resolve(
        registry: &MetadataRegistry,
        entity: &str,
        local: &[String],
        foreign: &[String],
    ) -> RepositoryResult<Self> {
        let meta = registry.get(entity).ok_or_else(|| {
            RepositoryError::config(entity, format!("entity '{}' is not registered", entity))
        })?;
        let table = AccessorTable::build(meta);

        let mut local_mappings = Vec::with_capacity(local.len());
        for attribute in local {
            if local_mappings
                .iter()
                .any(|m: &LocalMapping| m.attribute == *attribute)
            {
                log::warn!("Local attribute '{}' of '{}' listed twice", attribute, entity);
                continue;
            }
            if meta.field(attribute).is_none() {
                let message = if meta.association(attribute).is_some() {
                    format!(
                        "local attribute '{}' is an association; list it as a foreign attribute",
                        attribute
                    )
                } else {
                    format!("local attribute '{}' does not exist", attribute)
                };
                return Err(RepositoryError::config(entity, message));
            }
            let accessor = table.get(attribute).cloned().ok_or_else(|| {
                RepositoryError::config(entity, format!("no accessor for '{}'", attribute))
            })?;
            local_mappings.push(LocalMapping {
                attribute: attribute.clone(),
                operation: format!("set{}", operation_name(attribute)),
                accessor,
            });
        }

        let mut foreign_mappings = Vec::with_capacity(foreign.len());
        for attribute in foreign {
            if foreign_mappings
                .iter()
                .any(|m: &ForeignMapping| m.attribute == *attribute)
            {
                log::warn!("Foreign attribute '{}' of '{}' listed twice", attribute, entity);
                continue;
            }
            let assoc = meta.association(attribute).ok_or_else(|| {
                RepositoryError::config(
                    entity,
                    format!("foreign attribute '{}' does not exist", attribute),
                )
            })?;
            if !assoc.is_owning() || assoc.is_collection() {
                return Err(RepositoryError::config(
                    entity,
                    format!(
                        "foreign attribute '{}' is a {} inverse side; only owning single-valued associations can be set",
                        attribute, assoc.kind
                    ),
                ));
            }
            let target_meta = registry.get(&assoc.target).ok_or_else(|| {
                RepositoryError::config(
                    entity,
                    format!(
                        "target entity '{}' of field '{}' does not exist",
                        assoc.target, attribute
                    ),
                )
            })?;
            let accessor = table.get(attribute).cloned().ok_or_else(|| {
                RepositoryError::config(entity, format!("no accessor for '{}'", attribute))
            })?;

            let inverse = match assoc.inversed_by.as_deref() {
                None => None,
                Some(inverse_field) => {
                    let target_assoc = target_meta.association(inverse_field).ok_or_else(|| {
                        RepositoryError::config(
                            entity,
                            format!(
                                "field '{}' of '{}' names inverse field '{}', which does not exist in '{}'",
                                attribute, entity, inverse_field, assoc.target
                            ),
                        )
                    })?;
                    let many = assoc.kind == AssociationKind::ManyToOne;
                    if many != target_assoc.is_collection() {
                        return Err(RepositoryError::config(
                            entity,
                            format!(
                                "inverse field '{}.{}' is {} but '{}' is {}",
                                assoc.target, inverse_field, target_assoc.kind, attribute, assoc.kind
                            ),
                        ));
                    }
                    let target_accessor = AccessorTable::build(target_meta)
                        .get(inverse_field)
                        .cloned()
                        .ok_or_else(|| {
                            RepositoryError::config(
                                entity,
                                format!("no accessor for '{}.{}'", assoc.target, inverse_field),
                            )
                        })?;
                    let (remove_old, establish) = if many {
                        (
                            format!("get{}", operation_name(inverse_field)),
                            format!("add{}", target_assoc.target.short_name()),
                        )
                    } else {
                        let setter = format!("set{}", operation_name(inverse_field));
                        (setter.clone(), setter)
                    };
                    Some(InverseBinding {
                        field: inverse_field.to_string(),
                        accessor: target_accessor,
                        get_old: format!("get{}", operation_name(attribute)),
                        remove_old,
                        establish,
                    })
                }
            };

            foreign_mappings.push(ForeignMapping {
                attribute: attribute.clone(),
                operation: format!("set{}", operation_name(attribute)),
                accessor,
                target: assoc.target.clone(),
                inverse,
            });
        }

        log::debug!(
            "Resolved {} local and {} foreign attribute(s) for '{}'",
            local_mappings.len(),
            foreign_mappings.len(),
            entity
        );
        Ok(Self {
            entity: meta.name.clone(),
            local: local_mappings,
            foreign: foreign_mappings,
        })
    }

    pub fn entity(&self) -> &EntityName {
        &self.entity
    }

    pub fn local(&self) -> &[LocalMapping] {
        &self.local
    }

    pub fn foreign(&self) -> &[ForeignMapping] {
        &self.foreign
    }

    pub fn local_mapping(&self, attribute: &str) -> Option<&LocalMapping> {
        self.local.iter().find(|m| m.attribute == attribute)
    }

    pub fn foreign_mapping(&self, attribute: &str) -> Option<&ForeignMapping> {
        self.foreign.iter().find(|m| m.attribute == attribute)
    }

    /// Every attribute name accepted by this mapping set
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.local
            .iter()
            .map(|m| m.attribute.as_str())
            .chain(self.foreign.iter().map(|m| m.attribute.as_str()))
    }
}

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;
