//! Entity mutation
//!
//! Applies a value payload to one entity through resolved attribute
//! mappings. Mutation runs in two phases: [`EntityMutator::prepare`] coerces
//! every value, dereferences foreign keys and loads the inverse collections
//! involved; [`EntityMutator::apply`] then touches the entities. A payload that
//! fails preparation leaves every entity unchanged. A [`Checkpoint`] taken
//! between the two phases restores the touched entities when a later step of
//! the write fails.

use crate::error::{RepositoryError, RepositoryResult};
use crate::mapping::{AttributeMappings, ForeignMapping, LocalMapping};
use crate::values::Values;
use rr_core::{CoreError, Entity, EntityKey, EntityState, Value};
use rr_db::{DbError, Session};

#[derive(Debug)]
enum Step<'m> {
    Local {
        mapping: &'m LocalMapping,
        value: Value,
    },
    Foreign {
        mapping: &'m ForeignMapping,
        old: Option<EntityKey>,
        new: Option<EntityKey>,
    },
}

/// Validated changes for one entity, ready to apply
#[derive(Debug)]
pub struct MutationPlan<'m> {
    entity: EntityKey,
    steps: Vec<Step<'m>>,
}

impl MutationPlan<'_> {
    pub fn entity(&self) -> EntityKey {
        self.entity
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The entity itself plus every related entity whose inverse side the
    /// plan rewrites.
    pub fn touched(&self) -> Vec<EntityKey> {
        let mut keys = vec![self.entity];
        for step in &self.steps {
            let Step::Foreign { mapping, old, new } = step else {
                continue;
            };
            if mapping.inverse.is_none() {
                continue;
            }
            for key in old.iter().chain(new.iter()) {
                if !keys.contains(key) {
                    keys.push(*key);
                }
            }
        }
        keys
    }
}

/// Entity records as they were before a plan was applied
#[derive(Debug)]
pub struct Checkpoint {
    entities: Vec<(EntityKey, Entity)>,
}

/// Applies value payloads to entities of a session
pub struct EntityMutator<'s> {
    session: &'s Session,
}

impl<'s> EntityMutator<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Validate `values` against `mappings` without modifying anything.
    ///
    /// Keys not named by a mapping are ignored.
    pub fn prepare<'m>(
        &self,
        entity: EntityKey,
        values: &Values,
        mappings: &'m AttributeMappings,
    ) -> RepositoryResult<MutationPlan<'m>> {
        let mut steps = Vec::new();

        for mapping in mappings.local() {
            let Some(raw) = values.get(&mapping.attribute) else {
                continue;
            };
            let value = mapping.accessor.coerce(raw.clone()).map_err(|e| {
                RepositoryError::validation(format!(
                    "Invalid value for '{}': {}",
                    mapping.attribute, e
                ))
            })?;
            steps.push(Step::Local { mapping, value });
        }

        for mapping in mappings.foreign() {
            let Some(raw) = values.get(&mapping.attribute) else {
                continue;
            };
            let new = self.resolve_foreign(mapping, raw)?;
            let old = self.session.reference_of(entity, &mapping.attribute)?;
            if let Some(inverse) = &mapping.inverse {
                for related in old.iter().chain(new.iter()) {
                    self.session.load_relation(*related, &inverse.field)?;
                }
            }
            steps.push(Step::Foreign { mapping, old, new });
        }

        for key in values.keys() {
            if mappings.attributes().all(|a| a != key) {
                log::debug!(
                    "Ignoring undeclared attribute '{}' for '{}'",
                    key,
                    mappings.entity()
                );
            }
        }

        Ok(MutationPlan { entity, steps })
    }

    /// Apply a prepared plan.
    pub fn apply(&self, plan: MutationPlan<'_>) -> RepositoryResult<()> {
        let key = plan.entity;
        for step in plan.steps {
            match step {
                Step::Local { mapping, value } => {
                    log::debug!("{}.{}", key, mapping.operation);
                    self.session
                        .with_entity_mut(key, |e| mapping.accessor.write(e, value))??;
                }
                Step::Foreign { mapping, old, new } => {
                    if let Some(inverse) = &mapping.inverse {
                        if let Some(old) = old {
                            log::debug!("{} detaches {} via {}", key, old, inverse.remove_old);
                            self.session.with_entity_mut(old, |e| {
                                if inverse.is_collection() {
                                    inverse.accessor.remove_from_collection(e, key)
                                } else {
                                    inverse.accessor.set_reference(e, None)
                                }
                            })??;
                        }
                        if let Some(new) = new {
                            log::debug!("{} attaches to {} via {}", key, new, inverse.establish);
                            self.session.with_entity_mut(new, |e| {
                                if inverse.is_collection() {
                                    inverse.accessor.add_to_collection(e, key)
                                } else {
                                    inverse.accessor.set_reference(e, Some(key))
                                }
                            })??;
                        }
                    }
                    self.session
                        .with_entity_mut(key, |e| mapping.accessor.set_reference(e, new))??;
                }
            }
        }
        Ok(())
    }

    /// Copy every entity `plan` will touch, dirty markers included.
    pub fn checkpoint(&self, plan: &MutationPlan<'_>) -> RepositoryResult<Checkpoint> {
        let entities = plan
            .touched()
            .into_iter()
            .map(|key| Ok((key, self.session.with_entity(key, Entity::clone)?)))
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Checkpoint { entities })
    }

    /// Put the entities recorded in `checkpoint` back as they were.
    pub fn rollback(&self, checkpoint: Checkpoint) -> RepositoryResult<()> {
        for (key, saved) in checkpoint.entities {
            log::debug!("Restoring {}", key);
            self.session.with_entity_mut(key, |e| *e = saved)?;
        }
        Ok(())
    }

    /// Prepare and apply in one call. An apply that fails part way is
    /// rolled back.
    pub fn mutate(
        &self,
        entity: EntityKey,
        values: &Values,
        mappings: &AttributeMappings,
    ) -> RepositoryResult<()> {
        let plan = self.prepare(entity, values, mappings)?;
        let checkpoint = self.checkpoint(&plan)?;
        if let Err(e) = self.apply(plan) {
            self.rollback(checkpoint)?;
            return Err(e);
        }
        Ok(())
    }

    /// The new related entity for a foreign attribute; `None` clears it.
    fn resolve_foreign(
        &self,
        mapping: &ForeignMapping,
        raw: &Value,
    ) -> RepositoryResult<Option<EntityKey>> {
        if raw.is_empty_like() {
            return Ok(None);
        }
        match raw {
            Value::Ref(reference) => {
                let actual = self.session.entity_name(reference.key)?;
                if actual != mapping.target {
                    return Err(RepositoryError::validation(format!(
                        "'{}' expects a {} reference, got {}",
                        mapping.attribute, mapping.target, actual
                    )));
                }
                if self.session.entity_state(reference.key)? == EntityState::Removed {
                    return Err(RepositoryError::validation(format!(
                        "'{}' references removed entity {}",
                        mapping.attribute, reference
                    )));
                }
                Ok(Some(reference.key))
            }
            Value::List(_) => Err(RepositoryError::validation(format!(
                "'{}' expects a single identifier, got a list",
                mapping.attribute
            ))),
            id => match self.session.find(&mapping.target, id) {
                Ok(Some(found)) => Ok(Some(found)),
                Ok(None) | Err(DbError::Core(CoreError::TypeMismatch { .. })) => {
                    Err(RepositoryError::validation(format!(
                        "Foreign-Key item for: {}:{} not found",
                        mapping.attribute, id
                    )))
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
#[path = "mutator_test.rs"]
mod tests;
