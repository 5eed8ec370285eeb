//! Collection service
//!
//! A stateful front for a [`Repository`] serving one collection of
//! entities: fixed base criteria, an optional owning entity that scopes
//! every read and is forced into every write, allowed and renamed input
//! keys, and stored criteria, ordering and pagination for listing.

use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::Repository;
use crate::values::Values;
use rr_core::{EntityKey, EntityRef, Value};
use rr_query::Criteria;
use std::collections::BTreeMap;

pub struct CollectionService {
    repository: Repository,
    base_criteria: Criteria,
    /// Owning property and the entity it must point at
    owner: Option<(String, EntityRef)>,
    create_keys: Option<Vec<String>>,
    update_keys: Option<Vec<String>>,
    renamed_keys: BTreeMap<String, String>,
    criteria: Criteria,
    order_by: Vec<(String, String)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl CollectionService {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            base_criteria: Criteria::new(),
            owner: None,
            create_keys: None,
            update_keys: None,
            renamed_keys: BTreeMap::new(),
            criteria: Criteria::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Criteria applied to every read
    pub fn with_base_criteria(mut self, criteria: Criteria) -> Self {
        self.base_criteria = criteria;
        self
    }

    /// Scope the collection to entities whose `property` points at `owner`.
    pub fn with_owner(mut self, property: impl Into<String>, owner: EntityRef) -> Self {
        self.owner = Some((property.into(), owner));
        self
    }

    /// Input keys accepted by `create`. Without a list every key is passed on.
    pub fn with_create_keys(mut self, keys: Vec<String>) -> Self {
        self.create_keys = Some(keys);
        self
    }

    /// Input keys accepted by `update`; defaults to the create keys.
    pub fn with_update_keys(mut self, keys: Vec<String>) -> Self {
        self.update_keys = Some(keys);
        self
    }

    /// Input keys renamed before filtering, `from -> to`
    pub fn with_renamed_keys(mut self, renamed: BTreeMap<String, String>) -> Self {
        self.renamed_keys = renamed;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    // ── Stored listing state ───────────────────────────────────────────

    pub fn set_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
    }

    pub fn has_criteria(&self) -> bool {
        !self.criteria.is_empty()
    }

    pub fn set_order_by(&mut self, order_by: Vec<(String, String)>) {
        self.order_by = order_by;
    }

    /// Page size and start; the offset defaults to 0.
    pub fn set_pagination(&mut self, limit: u64, offset: Option<u64>) {
        self.limit = Some(limit);
        self.offset = Some(offset.unwrap_or(0));
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Entity with identifier `id` inside this collection
    pub fn get(&self, id: &Value) -> RepositoryResult<Option<EntityKey>> {
        let base = self.base();
        if base.is_empty() {
            self.repository.get(id, None)
        } else {
            self.repository.get(id, Some(base))
        }
    }

    /// Entities matching the stored criteria within this collection
    pub fn get_all(&self) -> RepositoryResult<Vec<EntityKey>> {
        self.repository
            .get_all(self.listing_criteria(), self.order_by.as_slice(), self.limit, self.offset)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        self.repository.count(self.listing_criteria())
    }

    // ── Writes ─────────────────────────────────────────────────────────

    pub fn create(&self, values: Values, flush: bool) -> RepositoryResult<EntityKey> {
        let values = self.prepare_values(values, self.create_keys.as_deref());
        let key = self.repository.create(values)?;
        if flush {
            self.repository.flush()?;
        }
        Ok(key)
    }

    /// Update the entity with identifier `id`; a missing entity is an error.
    pub fn update(&self, id: &Value, values: Values, flush: bool) -> RepositoryResult<EntityKey> {
        let key = self.get(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: self.repository.entity().to_string(),
            id: id.to_string(),
        })?;
        let keys = self.update_keys.as_deref().or(self.create_keys.as_deref());
        let values = self.prepare_values(values, keys);
        self.repository.update(key, values)?;
        if flush {
            self.repository.flush()?;
        }
        Ok(key)
    }

    /// Delete the entity with identifier `id`. Returns false when there is
    /// no such entity.
    pub fn delete(&self, id: &Value, flush: bool) -> RepositoryResult<bool> {
        let Some(key) = self.get(id)? else {
            log::debug!("delete: no {} with id {}", self.repository.entity(), id);
            return Ok(false);
        };
        self.repository.delete(key)?;
        if flush {
            self.repository.flush()?;
        }
        Ok(true)
    }

    fn base(&self) -> Criteria {
        let mut base = self.base_criteria.clone();
        if let Some((property, owner)) = &self.owner {
            base.insert(property.clone(), Value::Ref(owner.clone()).into());
        }
        base
    }

    /// Stored criteria with the base criteria on top
    fn listing_criteria(&self) -> Criteria {
        let mut criteria = self.criteria.clone();
        criteria.merge(self.base());
        criteria
    }

    /// Rename keys, drop the ones not allowed, then force the owner.
    fn prepare_values(&self, values: Values, allowed: Option<&[String]>) -> Values {
        let mut prepared: Values = values
            .into_iter()
            .map(|(key, value)| match self.renamed_keys.get(&key) {
                Some(renamed) => (renamed.clone(), value),
                None => (key, value),
            })
            .filter(|(key, _)| allowed.map_or(true, |keys| keys.contains(key)))
            .collect();
        if let Some((property, owner)) = &self.owner {
            prepared.insert(property.clone(), Value::Ref(owner.clone()));
        }
        prepared
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
