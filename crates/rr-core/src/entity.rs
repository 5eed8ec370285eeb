//! In-memory entity records held by a session.

use crate::entity_name::EntityName;
use crate::metadata::EntityMetadata;
use crate::value::{EntityKey, Value};
use std::collections::{BTreeMap, BTreeSet};

static NULL: Value = Value::Null;

/// Lifecycle state of an entity within a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Created in memory, not yet inserted
    New,
    /// Backed by a database row
    Managed,
    /// Scheduled for deletion on the next flush
    Removed,
}

/// Current value of an association on one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Not loaded from the database yet
    Unloaded,
    One(Option<EntityKey>),
    Many(Vec<EntityKey>),
}

/// One entity instance: scalar values plus association state
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: EntityName,
    pub id_field: String,
    pub state: EntityState,
    /// False for proxies whose row has not been read yet
    pub loaded: bool,
    dirty: BTreeSet<String>,
    values: BTreeMap<String, Value>,
    relations: BTreeMap<String, Relation>,
}

impl Entity {
    /// A fresh entity with every field null and empty associations.
    pub fn new(meta: &EntityMetadata) -> Self {
        let values = meta
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect();
        let relations = meta
            .associations
            .iter()
            .map(|a| {
                let relation = if a.is_collection() {
                    Relation::Many(Vec::new())
                } else {
                    Relation::One(None)
                };
                (a.name.clone(), relation)
            })
            .collect();
        Self {
            name: meta.name.clone(),
            id_field: meta.id_field.clone(),
            state: EntityState::New,
            loaded: true,
            dirty: BTreeSet::new(),
            values,
            relations,
        }
    }

    /// An unloaded placeholder for a managed row known only by identifier.
    pub fn proxy(meta: &EntityMetadata, id: Value) -> Self {
        let mut values = BTreeMap::new();
        values.insert(meta.id_field.clone(), id);
        let relations = meta
            .associations
            .iter()
            .map(|a| (a.name.clone(), Relation::Unloaded))
            .collect();
        Self {
            name: meta.name.clone(),
            id_field: meta.id_field.clone(),
            state: EntityState::Managed,
            loaded: false,
            dirty: BTreeSet::new(),
            values,
            relations,
        }
    }

    pub fn id(&self) -> &Value {
        self.values.get(&self.id_field).unwrap_or(&NULL)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a value and mark the field dirty.
    pub fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
        self.dirty.insert(field.to_string());
    }

    /// Set a value read from storage without marking it dirty.
    pub fn load_value(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Replace an association value and mark it dirty.
    pub fn set_relation(&mut self, name: &str, relation: Relation) {
        self.relations.insert(name.to_string(), relation);
        self.dirty.insert(name.to_string());
    }

    /// Replace an association value read from storage.
    pub fn load_relation(&mut self, name: &str, relation: Relation) {
        self.relations.insert(name.to_string(), relation);
    }

    /// Single-valued association target, `None` when unloaded or not single.
    pub fn reference(&self, name: &str) -> Option<Option<EntityKey>> {
        match self.relations.get(name) {
            Some(Relation::One(key)) => Some(*key),
            _ => None,
        }
    }

    /// Collection members, `None` when unloaded or not a collection.
    pub fn collection(&self, name: &str) -> Option<&[EntityKey]> {
        match self.relations.get(name) {
            Some(Relation::Many(keys)) => Some(keys),
            _ => None,
        }
    }

    pub fn is_relation_loaded(&self, name: &str) -> bool {
        !matches!(self.relations.get(name), Some(Relation::Unloaded) | None)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

#[cfg(test)]
#[path = "entity_test.rs"]
mod tests;
