//! Session: identity map, lazy relations and unit of work
//!
//! A [`Session`] owns every entity loaded or created through it. Entities
//! are addressed by [`EntityKey`] handles; at most one handle exists per
//! `(entity type, identifier)` pair. Related entities that have not been read
//! yet are held as unloaded proxies and initialized on first access.
//! Changes are collected in memory and written by [`Session::flush`] inside a
//! single transaction.
//!
//! The session uses interior mutability and is meant to be shared through
//! `Rc` by the repositories of one unit of work. It is not thread-safe.

use crate::commit_order::CommitOrder;
use crate::error::{DbError, DbResult};
use crate::traits::{with_transaction, Connection};
use rr_core::sql_utils::quote_ident;
use rr_core::{
    ColumnSource, Entity, EntityKey, EntityMetadata, EntityName, EntityRef, EntityState,
    IdentifierLookup, MetadataRegistry, Relation, Value,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Counts of rows written by one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl FlushSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

#[derive(Debug, Default)]
struct SessionState {
    slots: Vec<Option<Entity>>,
    identity: HashMap<(EntityName, String), EntityKey>,
    inserts: Vec<EntityKey>,
    deletes: Vec<EntityKey>,
}

impl SessionState {
    fn get(&self, key: EntityKey) -> DbResult<&Entity> {
        self.slots
            .get(key.0)
            .and_then(Option::as_ref)
            .ok_or(DbError::InvalidEntityKey(key.0))
    }

    fn get_mut(&mut self, key: EntityKey) -> DbResult<&mut Entity> {
        self.slots
            .get_mut(key.0)
            .and_then(Option::as_mut)
            .ok_or(DbError::InvalidEntityKey(key.0))
    }

    fn alloc(&mut self, entity: Entity) -> EntityKey {
        self.slots.push(Some(entity));
        EntityKey(self.slots.len() - 1)
    }

    fn lookup(&self, entity: &EntityName, id: &Value) -> Option<EntityKey> {
        self.identity.get(&identity_key(entity, id)).copied()
    }

    fn keys_of<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = EntityKey> + 'a {
        self.slots.iter().enumerate().filter_map(move |(idx, slot)| {
            slot.as_ref()
                .filter(|e| e.name == entity)
                .map(|_| EntityKey(idx))
        })
    }
}

fn identity_key(entity: &EntityName, id: &Value) -> (EntityName, String) {
    (entity.clone(), id.to_string())
}

fn coerce_id(meta: &EntityMetadata, id: &Value) -> DbResult<Value> {
    match meta.id_def() {
        Some(def) => Ok(def.field_type.coerce(&def.name, id.clone())?),
        None => Ok(id.clone()),
    }
}

/// A value bound into a write, possibly the identifier of an entity
/// inserted earlier in the same flush
#[derive(Debug, Clone)]
enum Bound {
    Value(Value),
    PendingId(EntityKey),
}

#[derive(Debug)]
struct WriteOp {
    key: EntityKey,
    table: String,
    id_column: String,
    id: Value,
    columns: Vec<String>,
    values: Vec<Bound>,
}

#[derive(Debug, Default)]
struct FlushPlan {
    inserts: Vec<WriteOp>,
    updates: Vec<WriteOp>,
    deletes: Vec<WriteOp>,
    /// Dirty entities with nothing to write (collection-only changes)
    cleaned: Vec<EntityKey>,
}

impl FlushPlan {
    fn summary(&self) -> FlushSummary {
        FlushSummary {
            inserted: self.inserts.len(),
            updated: self.updates.len(),
            deleted: self.deletes.len(),
        }
    }
}

/// Identity map and unit of work over one connection
pub struct Session {
    conn: Box<dyn Connection>,
    registry: MetadataRegistry,
    state: RefCell<SessionState>,
}

impl Session {
    pub fn new(conn: Box<dyn Connection>, registry: MetadataRegistry) -> Self {
        Self {
            conn,
            registry,
            state: RefCell::new(SessionState::default()),
        }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn connection(&self) -> &dyn Connection {
        &*self.conn
    }

    /// Metadata of a registered entity type
    pub fn metadata(&self, entity: &str) -> DbResult<&EntityMetadata> {
        Ok(self.registry.require(entity)?)
    }

    /// Qualified select list of every column of `entity`, in the order
    /// [`Session::hydrate`] expects.
    pub fn select_list(&self, entity: &str, alias: &str) -> DbResult<Vec<String>> {
        let meta = self.metadata(entity)?;
        Ok(meta
            .columns()
            .into_iter()
            .map(|(column, _)| format!("{}.{}", alias, quote_ident(&column)))
            .collect())
    }

    // ── Identity map ───────────────────────────────────────────────────

    /// Find an entity by identifier, reading it from the database when it
    /// is not in the identity map. Entities removed in this session are not
    /// found.
    pub fn find(&self, entity: &str, id: &Value) -> DbResult<Option<EntityKey>> {
        let meta = self.metadata(entity)?;
        if id.is_null() {
            return Ok(None);
        }
        let id = coerce_id(meta, id)?;

        let known = self.state.borrow().lookup(&meta.name, &id);
        if let Some(key) = known {
            let found =
                self.initialize(key)? && self.entity_state(key)? != EntityState::Removed;
            return Ok(found.then_some(key));
        }

        match self.fetch_row(meta, &id)? {
            Some(row) => Ok(Some(self.hydrate(entity, &row)?)),
            None => Ok(None),
        }
    }

    /// Handle for `entity` with `id`, creating an unloaded proxy when the
    /// entity is not known yet. Does not touch the database.
    pub fn reference(&self, entity: &str, id: &Value) -> DbResult<EntityKey> {
        let meta = self.metadata(entity)?;
        let id = coerce_id(meta, id)?;
        let mut state = self.state.borrow_mut();
        if let Some(key) = state.lookup(&meta.name, &id) {
            return Ok(key);
        }
        let key = state.alloc(Entity::proxy(meta, id.clone()));
        state.identity.insert(identity_key(&meta.name, &id), key);
        Ok(key)
    }

    /// Turn a row selected with [`Session::select_list`] into an entity.
    ///
    /// A loaded entity already in the identity map wins over the row.
    /// Owning associations become proxies; collections stay unloaded.
    pub fn hydrate(&self, entity: &str, row: &[Value]) -> DbResult<EntityKey> {
        let meta = self.metadata(entity)?;
        let columns = meta.columns();
        if row.len() < columns.len() {
            return Err(DbError::ExecutionError(format!(
                "row for '{}' has {} columns, expected {}",
                entity,
                row.len(),
                columns.len()
            )));
        }

        let mut values = Vec::with_capacity(columns.len());
        let mut relations = Vec::new();
        for ((_, source), raw) in columns.iter().zip(row) {
            match source {
                ColumnSource::Field(def) => {
                    values.push((def.name.clone(), def.field_type.coerce(&def.name, raw.clone())?))
                }
                ColumnSource::JoinColumn(assoc) => {
                    let target = if raw.is_null() {
                        None
                    } else {
                        Some(self.reference(&assoc.target, raw)?)
                    };
                    relations.push((assoc.name.clone(), target));
                }
            }
        }

        let id = values
            .iter()
            .find(|(name, _)| *name == meta.id_field)
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        if id.is_null() {
            return Err(DbError::ExecutionError(format!(
                "row for '{}' has a null identifier",
                entity
            )));
        }

        let mut state = self.state.borrow_mut();
        let key = match state.lookup(&meta.name, &id) {
            Some(key) if state.get(key)?.loaded => return Ok(key),
            Some(key) => key,
            None => {
                let key = state.alloc(Entity::proxy(meta, id.clone()));
                state.identity.insert(identity_key(&meta.name, &id), key);
                key
            }
        };

        let record = state.get_mut(key)?;
        for (name, value) in values {
            record.load_value(&name, value);
        }
        for (name, target) in relations {
            record.load_relation(&name, Relation::One(target));
        }
        record.loaded = true;
        Ok(key)
    }

    /// Load a proxy's row. Returns false when the row does not exist.
    pub fn initialize(&self, key: EntityKey) -> DbResult<bool> {
        let (name, id) = {
            let state = self.state.borrow();
            let entity = state.get(key)?;
            if entity.loaded {
                return Ok(true);
            }
            (entity.name.clone(), entity.id().clone())
        };
        let meta = self.metadata(&name)?;
        match self.fetch_row(meta, &id)? {
            Some(row) => {
                self.hydrate(&name, &row)?;
                Ok(true)
            }
            None => {
                log::warn!("{} with id {} has no row", name, id);
                Ok(false)
            }
        }
    }

    fn fetch_row(&self, meta: &EntityMetadata, id: &Value) -> DbResult<Option<Vec<Value>>> {
        let sql = format!(
            "SELECT {} FROM {} e WHERE e.{} = $1",
            self.select_list(&meta.name, "e")?.join(", "),
            quote_ident(&meta.table),
            quote_ident(&meta.id_field)
        );
        let rows = self.conn.query_rows(&sql, std::slice::from_ref(id))?;
        Ok(rows.rows.into_iter().next())
    }

    // ── Entity access ──────────────────────────────────────────────────

    /// Read an entity. `f` must not call back into the session.
    pub fn with_entity<R>(&self, key: EntityKey, f: impl FnOnce(&Entity) -> R) -> DbResult<R> {
        let state = self.state.borrow();
        let entity = state.get(key)?;
        Ok(f(entity))
    }

    /// Modify an entity. `f` must not call back into the session.
    pub fn with_entity_mut<R>(
        &self,
        key: EntityKey,
        f: impl FnOnce(&mut Entity) -> R,
    ) -> DbResult<R> {
        let mut state = self.state.borrow_mut();
        let entity = state.get_mut(key)?;
        Ok(f(entity))
    }

    pub fn entity_name(&self, key: EntityKey) -> DbResult<EntityName> {
        self.with_entity(key, |e| e.name.clone())
    }

    pub fn entity_state(&self, key: EntityKey) -> DbResult<EntityState> {
        self.with_entity(key, |e| e.state)
    }

    pub fn entity_ref(&self, key: EntityKey) -> DbResult<EntityRef> {
        self.with_entity(key, |e| EntityRef::new(e.name.clone(), key))
    }

    /// Identifier of an entity; `Null` for entities not inserted yet
    pub fn id_of(&self, key: EntityKey) -> DbResult<Value> {
        self.with_entity(key, |e| e.id().clone())
    }

    /// Current value of a scalar field, initializing proxies first
    pub fn value(&self, key: EntityKey, field: &str) -> DbResult<Value> {
        self.initialize(key)?;
        self.with_entity(key, |e| e.get(field).cloned().unwrap_or_default())
    }

    /// Make sure an association of `key` is loaded.
    ///
    /// Inverse sides are resolved from the database rows pointing at the
    /// owner, merged with in-memory entities whose current reference points
    /// at it. In-memory state wins for entities already known.
    pub fn load_relation(&self, key: EntityKey, field: &str) -> DbResult<()> {
        let name = self.entity_name(key)?;
        let meta = self.metadata(&name)?;
        let assoc = meta
            .association(field)
            .ok_or_else(|| DbError::InvalidField {
                entity: name.to_string(),
                field: field.to_string(),
            })?;

        if self.with_entity(key, |e| e.is_relation_loaded(field))? {
            return Ok(());
        }
        self.initialize(key)?;
        if self.with_entity(key, |e| e.is_relation_loaded(field))? {
            return Ok(());
        }
        if assoc.is_owning() {
            // proxy without a row
            return self.with_entity_mut(key, |e| e.load_relation(field, Relation::One(None)));
        }

        let target = self.metadata(&assoc.target)?;
        let mapped_by = assoc.mapped_by.as_deref().unwrap_or_default();
        let join_column = target
            .association(mapped_by)
            .and_then(|a| a.join_column())
            .ok_or_else(|| DbError::InvalidField {
                entity: target.name.to_string(),
                field: mapped_by.to_string(),
            })?;

        let mut candidates = Vec::new();
        let owner_id = self.id_of(key)?;
        if !owner_id.is_null() {
            let sql = format!(
                "SELECT {} FROM {} t WHERE t.{} = $1",
                self.select_list(&target.name, "t")?.join(", "),
                quote_ident(&target.table),
                quote_ident(&join_column)
            );
            for row in self.conn.query_rows(&sql, &[owner_id])?.rows {
                candidates.push(self.hydrate(&target.name, &row)?);
            }
        }

        let members = {
            let state = self.state.borrow();
            let mut seen = HashSet::new();
            let members: Vec<EntityKey> = candidates
                .into_iter()
                .chain(state.keys_of(&target.name))
                .filter(|k| seen.insert(*k))
                .filter(|k| {
                    state.get(*k).is_ok_and(|e| {
                        e.state != EntityState::Removed && e.reference(mapped_by) == Some(Some(key))
                    })
                })
                .collect();
            members
        };

        let relation = if assoc.is_collection() {
            Relation::Many(members)
        } else {
            Relation::One(members.first().copied())
        };
        self.with_entity_mut(key, |e| e.load_relation(field, relation))
    }

    /// Target of a single-valued association, loading it if needed
    pub fn reference_of(&self, key: EntityKey, field: &str) -> DbResult<Option<EntityKey>> {
        self.load_relation(key, field)?;
        self.with_entity(key, |e| e.reference(field).flatten())
    }

    /// Members of a collection association, loading it if needed
    pub fn collection_of(&self, key: EntityKey, field: &str) -> DbResult<Vec<EntityKey>> {
        self.load_relation(key, field)?;
        self.with_entity(key, |e| e.collection(field).map(<[_]>::to_vec).unwrap_or_default())
    }

    // ── Unit of work ───────────────────────────────────────────────────

    /// Create a new, unscheduled entity
    pub fn create(&self, entity: &str) -> DbResult<EntityKey> {
        let meta = self.metadata(entity)?;
        Ok(self.state.borrow_mut().alloc(Entity::new(meta)))
    }

    /// Schedule a new entity for insert. Persisting a removed entity cancels
    /// its deletion; persisting a managed entity is a no-op.
    pub fn persist(&self, key: EntityKey) -> DbResult<()> {
        let mut state = self.state.borrow_mut();
        let current = state.get(key)?.state;
        match current {
            EntityState::New => {
                if !state.inserts.contains(&key) {
                    state.inserts.push(key);
                }
            }
            EntityState::Managed => {}
            EntityState::Removed => {
                state.deletes.retain(|k| *k != key);
                state.get_mut(key)?.state = EntityState::Managed;
            }
        }
        Ok(())
    }

    /// Schedule a managed entity for deletion. A new entity is only
    /// unscheduled.
    pub fn remove(&self, key: EntityKey) -> DbResult<()> {
        let mut state = self.state.borrow_mut();
        let current = state.get(key)?.state;
        match current {
            EntityState::New => {
                state.inserts.retain(|k| *k != key);
                state.get_mut(key)?.state = EntityState::Removed;
            }
            EntityState::Managed => {
                state.get_mut(key)?.state = EntityState::Removed;
                state.deletes.push(key);
            }
            EntityState::Removed => {}
        }
        Ok(())
    }

    /// Whether the next flush has anything to write
    pub fn has_pending_changes(&self) -> bool {
        let state = self.state.borrow();
        !state.inserts.is_empty()
            || !state.deletes.is_empty()
            || state
                .slots
                .iter()
                .flatten()
                .any(|e| e.state == EntityState::Managed && e.is_dirty())
    }

    /// Write all pending inserts, updates and deletes in one transaction.
    ///
    /// Inserts run first, ordered so referenced entities exist before the
    /// rows pointing at them, then updates of dirty managed entities, then
    /// deletes (referencing rows first).
    pub fn flush(&self) -> DbResult<FlushSummary> {
        let plan = self.plan_flush()?;
        let summary = plan.summary();
        if summary.is_empty() {
            self.apply_flush(&plan, HashMap::new())?;
            return Ok(summary);
        }

        let assigned = with_transaction(&*self.conn, || self.execute_flush(&plan))?;
        self.apply_flush(&plan, assigned)?;
        log::debug!(
            "flush: {} inserted, {} updated, {} deleted",
            summary.inserted,
            summary.updated,
            summary.deleted
        );
        Ok(summary)
    }

    /// Forget every entity. Outstanding keys become invalid.
    pub fn clear(&self) {
        *self.state.borrow_mut() = SessionState::default();
    }

    fn plan_flush(&self) -> DbResult<FlushPlan> {
        let state = self.state.borrow();
        let pending: HashSet<EntityKey> = state.inserts.iter().copied().collect();
        let mut plan = FlushPlan::default();

        let mut order = CommitOrder::new();
        for &key in &state.inserts {
            order.add_entity(key);
            let entity = state.get(key)?;
            for assoc in self.metadata(&entity.name)?.associations.iter() {
                if !assoc.is_owning() {
                    continue;
                }
                if let Some(Some(target)) = entity.reference(&assoc.name) {
                    if pending.contains(&target) {
                        order.add_dependency(key, target);
                    }
                }
            }
        }

        for key in order.order()? {
            let entity = state.get(key)?;
            let meta = self.metadata(&entity.name)?;
            let mut columns = Vec::new();
            let mut values = Vec::new();
            for field in &meta.fields {
                let value = entity.get(&field.name).cloned().unwrap_or_default();
                if field.generated && value.is_null() {
                    continue;
                }
                columns.push(field.name.clone());
                values.push(Bound::Value(value));
            }
            for assoc in &meta.associations {
                if let Some(column) = assoc.join_column() {
                    let target = entity.reference(&assoc.name).flatten();
                    columns.push(column);
                    values.push(bind_reference(&state, &pending, target)?);
                }
            }
            plan.inserts.push(WriteOp {
                key,
                table: meta.table.clone(),
                id_column: meta.id_field.clone(),
                id: Value::Null,
                columns,
                values,
            });
        }

        for (idx, slot) in state.slots.iter().enumerate() {
            let key = EntityKey(idx);
            let Some(entity) = slot else { continue };
            if entity.state != EntityState::Managed || !entity.is_dirty() {
                continue;
            }
            let meta = self.metadata(&entity.name)?;
            let mut columns = Vec::new();
            let mut values = Vec::new();
            for name in entity.dirty_fields() {
                if name == meta.id_field {
                    continue;
                }
                if meta.field(name).is_some() {
                    columns.push(name.to_string());
                    values.push(Bound::Value(entity.get(name).cloned().unwrap_or_default()));
                } else if let Some(column) = meta.association(name).and_then(|a| a.join_column()) {
                    let target = entity.reference(name).flatten();
                    columns.push(column);
                    values.push(bind_reference(&state, &pending, target)?);
                }
            }
            if columns.is_empty() {
                plan.cleaned.push(key);
                continue;
            }
            plan.updates.push(WriteOp {
                key,
                table: meta.table.clone(),
                id_column: meta.id_field.clone(),
                id: entity.id().clone(),
                columns,
                values,
            });
        }

        // Reverse dependency order: rows pointing at a deleted row go first.
        let deleted: HashSet<EntityKey> = state.deletes.iter().copied().collect();
        let mut delete_order = CommitOrder::new();
        for &key in &state.deletes {
            delete_order.add_entity(key);
            let entity = state.get(key)?;
            for assoc in self.metadata(&entity.name)?.associations.iter() {
                if let Some(Some(target)) = entity.reference(&assoc.name) {
                    if assoc.is_owning() && deleted.contains(&target) {
                        delete_order.add_dependency(key, target);
                    }
                }
            }
        }
        let mut delete_keys = delete_order.order()?;
        delete_keys.reverse();
        for key in delete_keys {
            let entity = state.get(key)?;
            let meta = self.metadata(&entity.name)?;
            plan.deletes.push(WriteOp {
                key,
                table: meta.table.clone(),
                id_column: meta.id_field.clone(),
                id: entity.id().clone(),
                columns: Vec::new(),
                values: Vec::new(),
            });
        }

        Ok(plan)
    }

    fn execute_flush(&self, plan: &FlushPlan) -> DbResult<HashMap<EntityKey, Value>> {
        let mut assigned: HashMap<EntityKey, Value> = HashMap::new();

        for op in &plan.inserts {
            let params = resolve_bound(&op.values, &assigned)?;
            let sql = if op.columns.is_empty() {
                format!(
                    "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                    quote_ident(&op.table),
                    quote_ident(&op.id_column)
                )
            } else {
                let columns: Vec<String> = op.columns.iter().map(|c| quote_ident(c)).collect();
                let placeholders: Vec<String> =
                    (1..=op.columns.len()).map(|i| format!("${i}")).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                    quote_ident(&op.table),
                    columns.join(", "),
                    placeholders.join(", "),
                    quote_ident(&op.id_column)
                )
            };
            let id = self.conn.query_scalar(&sql, &params)?;
            if id.is_null() {
                return Err(DbError::ExecutionError(format!(
                    "insert into '{}' returned no identifier",
                    op.table
                )));
            }
            assigned.insert(op.key, id);
        }

        for op in &plan.updates {
            let mut params = resolve_bound(&op.values, &assigned)?;
            let sets: Vec<String> = op
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{} = ${}", quote_ident(c), i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ${}",
                quote_ident(&op.table),
                sets.join(", "),
                quote_ident(&op.id_column),
                params.len() + 1
            );
            params.push(op.id.clone());
            self.conn.execute(&sql, &params)?;
        }

        for op in &plan.deletes {
            let sql = format!(
                "DELETE FROM {} WHERE {} = $1",
                quote_ident(&op.table),
                quote_ident(&op.id_column)
            );
            self.conn.execute(&sql, std::slice::from_ref(&op.id))?;
        }

        Ok(assigned)
    }

    fn apply_flush(&self, plan: &FlushPlan, assigned: HashMap<EntityKey, Value>) -> DbResult<()> {
        let mut state = self.state.borrow_mut();

        for op in &plan.inserts {
            let id = assigned.get(&op.key).cloned().unwrap_or_default();
            let entity = state.get_mut(op.key)?;
            let id_field = entity.id_field.clone();
            entity.load_value(&id_field, id.clone());
            entity.state = EntityState::Managed;
            entity.clear_dirty();
            let name = entity.name.clone();
            state.identity.insert(identity_key(&name, &id), op.key);
        }

        for key in plan.updates.iter().map(|op| op.key).chain(plan.cleaned.iter().copied()) {
            state.get_mut(key)?.clear_dirty();
        }

        let deleted: HashSet<EntityKey> = plan.deletes.iter().map(|op| op.key).collect();
        for op in &plan.deletes {
            let name = state.get(op.key)?.name.clone();
            state.identity.remove(&identity_key(&name, &op.id));
        }
        if !deleted.is_empty() {
            for entity in state.slots.iter_mut().flatten() {
                let Some(meta) = self.registry.get(&entity.name) else {
                    continue;
                };
                for assoc in meta.associations.iter().filter(|a| a.is_collection()) {
                    let remaining = entity.collection(&assoc.name).and_then(|members| {
                        members
                            .iter()
                            .any(|k| deleted.contains(k))
                            .then(|| {
                                members
                                    .iter()
                                    .copied()
                                    .filter(|k| !deleted.contains(k))
                                    .collect::<Vec<_>>()
                            })
                    });
                    if let Some(remaining) = remaining {
                        entity.load_relation(&assoc.name, Relation::Many(remaining));
                    }
                }
            }
        }

        state.inserts.clear();
        state.deletes.clear();
        Ok(())
    }
}

fn bind_reference(
    state: &SessionState,
    pending: &HashSet<EntityKey>,
    target: Option<EntityKey>,
) -> DbResult<Bound> {
    let Some(target) = target else {
        return Ok(Bound::Value(Value::Null));
    };
    if pending.contains(&target) {
        return Ok(Bound::PendingId(target));
    }
    let entity = state.get(target)?;
    let id = entity.id();
    if id.is_null() {
        return Err(DbError::UnresolvedReference(format!("{}{}", entity.name, target)));
    }
    Ok(Bound::Value(id.clone()))
}

fn resolve_bound(values: &[Bound], assigned: &HashMap<EntityKey, Value>) -> DbResult<Vec<Value>> {
    values
        .iter()
        .map(|bound| match bound {
            Bound::Value(value) => Ok(value.clone()),
            Bound::PendingId(key) => assigned
                .get(key)
                .cloned()
                .ok_or_else(|| DbError::UnresolvedReference(key.to_string())),
        })
        .collect()
}

impl IdentifierLookup for Session {
    fn identifier_of(&self, entity: &EntityRef) -> Option<Value> {
        let state = self.state.try_borrow().ok()?;
        let id = state.get(entity.key).ok()?.id().clone();
        (!id.is_null()).then_some(id)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
