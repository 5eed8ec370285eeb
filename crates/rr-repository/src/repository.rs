//! Generic repository
//!
//! A [`Repository`] binds one entity type to a shared [`Session`]: reads go
//! through the criteria translator and query executor, writes run the hook
//! pipeline around the entity mutator and register the entity with the
//! session's unit of work. Nothing is written until [`Repository::flush`].

use crate::error::{RepositoryError, RepositoryResult};
use crate::executor::{Aggregate, QueryExecutor};
use crate::hooks::{HookContext, HookPipeline, HookStage, WriteStage, WriteTracker};
use crate::mapping::AttributeMappings;
use crate::mutator::EntityMutator;
use crate::values::Values;
use rr_core::{Config, EntityKey, EntityName, EntityState, RepositoryConfig, Value};
use rr_db::{FlushSummary, Session};
use rr_query::{CriteriaTranslator, Criteria, ROOT_ALIAS};
use std::rc::Rc;

/// CRUD access to one entity type
pub struct Repository {
    session: Rc<Session>,
    entity: EntityName,
    id_column: String,
    executor: QueryExecutor,
    create_mappings: AttributeMappings,
    update_mappings: AttributeMappings,
    hooks: HookPipeline,
}

impl Repository {
    /// Build a repository, resolving every attribute mapping and criteria
    /// rule up front. Configuration errors surface here, never per call.
    pub fn new(
        session: Rc<Session>,
        entity: &str,
        config: &RepositoryConfig,
    ) -> RepositoryResult<Self> {
        let registry = session.registry();
        let meta = registry.get(entity).ok_or_else(|| {
            RepositoryError::config(entity, format!("entity '{}' is not registered", entity))
        })?;

        let id_column = config
            .id_column
            .clone()
            .unwrap_or_else(|| meta.id_field.clone());
        if meta.column_for(&id_column).is_none() {
            return Err(RepositoryError::config(
                entity,
                format!("id column '{}' is not a field", id_column),
            ));
        }

        let update_mappings = AttributeMappings::resolve(
            registry,
            entity,
            &config.local_attributes,
            &config.foreign_attributes,
        )?;
        let create_mappings = AttributeMappings::resolve(
            registry,
            entity,
            config.create_local_attributes(),
            config.create_foreign_attributes(),
        )?;
        let translator = CriteriaTranslator::new(registry, entity, config)?;
        let entity = meta.name.clone();
        let executor = QueryExecutor::new(Rc::clone(&session), translator, &id_column)?;

        log::debug!("Repository for '{}' ready (id column '{}')", entity, id_column);
        Ok(Self {
            session,
            entity,
            id_column,
            executor,
            create_mappings,
            update_mappings,
            hooks: HookPipeline::new(),
        })
    }

    /// Build the repository declared for `entity` in `restrepo.yml`.
    pub fn from_config(
        session: Rc<Session>,
        config: &Config,
        entity: &str,
    ) -> RepositoryResult<Self> {
        Self::new(session, entity, &config.repository(entity))
    }

    pub fn entity(&self) -> &EntityName {
        &self.entity
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn create_mappings(&self) -> &AttributeMappings {
        &self.create_mappings
    }

    pub fn update_mappings(&self) -> &AttributeMappings {
        &self.update_mappings
    }

    pub fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    /// Register a hook for `stage`.
    pub fn on<F>(&mut self, stage: HookStage, hook: F)
    where
        F: Fn(&HookContext<'_>, &mut Values) -> RepositoryResult<()> + 'static,
    {
        self.hooks.register(stage, hook);
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Entity with identifier `id`, optionally constrained by `criteria`.
    pub fn get(&self, id: &Value, criteria: Option<Criteria>) -> RepositoryResult<Option<EntityKey>> {
        let by_primary_key = self
            .session
            .metadata(&self.entity)
            .map(|meta| meta.id_field == self.id_column)?;
        if criteria.is_none() && by_primary_key {
            return Ok(self.session.find(&self.entity, id)?);
        }

        let mut filter =
            Criteria::new().with(format!("{}.{}", ROOT_ALIAS, self.id_column), id.clone());
        filter.merge(criteria.unwrap_or_default());
        self.get_one_by(filter)
    }

    /// First entity matching `criteria`.
    pub fn get_one_by(&self, criteria: Criteria) -> RepositoryResult<Option<EntityKey>> {
        let plan = self
            .executor
            .select_plan::<&str, &str>(criteria, &[], Some(1), None)?;
        Ok(self.executor.fetch(&plan)?.into_iter().next())
    }

    /// Entities matching `criteria`, ordered by `(field, ASC|DESC)` terms.
    pub fn get_all<F, D>(
        &self,
        criteria: Criteria,
        order_by: &[(F, D)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> RepositoryResult<Vec<EntityKey>>
    where
        F: AsRef<str>,
        D: AsRef<str>,
    {
        let plan = self.executor.select_plan(criteria, order_by, limit, offset)?;
        self.executor.fetch(&plan)
    }

    pub fn count(&self, criteria: Criteria) -> RepositoryResult<i64> {
        self.executor.count(criteria)
    }

    pub fn min(&self, field: &str, criteria: Criteria) -> RepositoryResult<Value> {
        self.executor.aggregate(Aggregate::Min, field, criteria)
    }

    pub fn max(&self, field: &str, criteria: Criteria) -> RepositoryResult<Value> {
        self.executor.aggregate(Aggregate::Max, field, criteria)
    }

    pub fn get_distinct(&self, field: &str, criteria: Criteria) -> RepositoryResult<Vec<Value>> {
        self.executor.distinct_values(field, criteria)
    }

    // ── Writes ─────────────────────────────────────────────────────────

    /// Create an entity from `values` and queue it for insert.
    ///
    /// Only the declared create attributes are applied. On failure the new
    /// entity is discarded and related entities are left as they were.
    pub fn create(&self, values: Values) -> RepositoryResult<EntityKey> {
        let key = self.session.create(&self.entity)?;
        let mut tracker = WriteTracker::start("create", &self.entity);
        let result = self.write(
            key,
            values,
            &self.create_mappings,
            (HookStage::PreCreate, HookStage::PostCreate),
            &mut tracker,
        );
        if let Err(e) = result {
            self.session.remove(key)?;
            return Err(e);
        }
        self.session.persist(key)?;
        tracker.advance(WriteStage::QueuedForPersist);
        Ok(key)
    }

    /// Apply `values` to an existing entity. A failing hook or value leaves
    /// the entity and its related entities unchanged.
    pub fn update(&self, entity: EntityKey, values: Values) -> RepositoryResult<()> {
        self.check_entity(entity)?;
        if !self.session.initialize(entity)? {
            return Err(RepositoryError::NotFound {
                entity: self.entity.to_string(),
                id: self.session.id_of(entity)?.to_string(),
            });
        }
        let mut tracker = WriteTracker::start("update", &self.entity);
        self.write(
            entity,
            values,
            &self.update_mappings,
            (HookStage::PreUpdate, HookStage::PostUpdate),
            &mut tracker,
        )?;
        self.session.persist(entity)?;
        tracker.advance(WriteStage::QueuedForPersist);
        Ok(())
    }

    /// Queue an entity for deletion.
    pub fn delete(&self, entity: EntityKey) -> RepositoryResult<()> {
        self.check_entity(entity)?;
        let mut tracker = WriteTracker::start("delete", &self.entity);
        let mut values = Values::new();
        tracker.advance(WriteStage::PreHook);
        self.hooks
            .run(HookStage::PreDelete, &self.session, entity, &mut values)?;
        let was_managed = self.session.entity_state(entity)? == EntityState::Managed;
        self.session.remove(entity)?;
        tracker.advance(WriteStage::AttributesApplied);
        if let Err(e) = self
            .hooks
            .run(HookStage::PostDelete, &self.session, entity, &mut values)
        {
            if was_managed {
                self.session.persist(entity)?;
            }
            return Err(e);
        }
        tracker.advance(WriteStage::PostHook);
        tracker.advance(WriteStage::QueuedForPersist);
        Ok(())
    }

    /// Write every pending change of the shared session.
    pub fn flush(&self) -> RepositoryResult<FlushSummary> {
        Ok(self.session.flush()?)
    }

    /// Scalar fields and owning references of an entity as JSON. References
    /// are written as the related identifier.
    pub fn to_json(&self, entity: EntityKey) -> RepositoryResult<serde_json::Value> {
        self.check_entity(entity)?;
        let meta = self.session.metadata(&self.entity)?;
        let mut object = serde_json::Map::new();
        for field in &meta.fields {
            object.insert(
                field.name.clone(),
                self.session.value(entity, &field.name)?.to_json(),
            );
        }
        for assoc in meta.associations.iter().filter(|a| a.is_owning()) {
            let related = match self.session.reference_of(entity, &assoc.name)? {
                Some(target) => self.session.id_of(target)?.to_json(),
                None => serde_json::Value::Null,
            };
            object.insert(assoc.name.clone(), related);
        }
        Ok(serde_json::Value::Object(object))
    }

    fn write(
        &self,
        entity: EntityKey,
        mut values: Values,
        mappings: &AttributeMappings,
        (pre, post): (HookStage, HookStage),
        tracker: &mut WriteTracker,
    ) -> RepositoryResult<()> {
        tracker.advance(WriteStage::PreHook);
        self.hooks.run(pre, &self.session, entity, &mut values)?;

        let mutator = EntityMutator::new(&self.session);
        let plan = mutator.prepare(entity, &values, mappings)?;
        let checkpoint = mutator.checkpoint(&plan)?;
        let result = mutator.apply(plan).and_then(|()| {
            tracker.advance(WriteStage::AttributesApplied);
            self.hooks.run(post, &self.session, entity, &mut values)
        });
        if let Err(e) = result {
            mutator.rollback(checkpoint)?;
            return Err(e);
        }
        tracker.advance(WriteStage::PostHook);
        Ok(())
    }

    fn check_entity(&self, entity: EntityKey) -> RepositoryResult<()> {
        let actual = self.session.entity_name(entity)?;
        if actual != self.entity {
            return Err(RepositoryError::validation(format!(
                "{} is a {}, not a {}",
                entity, actual, self.entity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "repository_test.rs"]
mod tests;
