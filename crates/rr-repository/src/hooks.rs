//! Write hooks and the write state machine

use crate::error::RepositoryResult;
use crate::values::Values;
use rr_core::{EntityKey, EntityName};
use rr_db::Session;
use std::fmt;

/// Point in a write at which hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    PreCreate,
    PostCreate,
    PreUpdate,
    PostUpdate,
    PreDelete,
    PostDelete,
}

impl HookStage {
    pub const ALL: [HookStage; 6] = [
        HookStage::PreCreate,
        HookStage::PostCreate,
        HookStage::PreUpdate,
        HookStage::PostUpdate,
        HookStage::PreDelete,
        HookStage::PostDelete,
    ];

    fn index(self) -> usize {
        match self {
            HookStage::PreCreate => 0,
            HookStage::PostCreate => 1,
            HookStage::PreUpdate => 2,
            HookStage::PostUpdate => 3,
            HookStage::PreDelete => 4,
            HookStage::PostDelete => 5,
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookStage::PreCreate => "pre-create",
            HookStage::PostCreate => "post-create",
            HookStage::PreUpdate => "pre-update",
            HookStage::PostUpdate => "post-update",
            HookStage::PreDelete => "pre-delete",
            HookStage::PostDelete => "post-delete",
        };
        f.write_str(s)
    }
}

/// What a hook sees of the write in progress
pub struct HookContext<'a> {
    pub session: &'a Session,
    pub entity: EntityKey,
    pub stage: HookStage,
}

/// A registered hook. Pre-hooks may rewrite the values before they are
/// applied; returning an error aborts the write.
pub type Hook = Box<dyn Fn(&HookContext<'_>, &mut Values) -> RepositoryResult<()>>;

/// Ordered hooks per stage
#[derive(Default)]
pub struct HookPipeline {
    stages: [Vec<Hook>; 6],
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to `stage`. Hooks run in registration order.
    pub fn register<F>(&mut self, stage: HookStage, hook: F)
    where
        F: Fn(&HookContext<'_>, &mut Values) -> RepositoryResult<()> + 'static,
    {
        self.stages[stage.index()].push(Box::new(hook));
    }

    /// Run every hook of `stage`, stopping at the first failure.
    pub fn run(
        &self,
        stage: HookStage,
        session: &Session,
        entity: EntityKey,
        values: &mut Values,
    ) -> RepositoryResult<()> {
        let hooks = &self.stages[stage.index()];
        if hooks.is_empty() {
            return Ok(());
        }
        log::debug!("Running {} {} hook(s) for {}", hooks.len(), stage, entity);
        let context = HookContext {
            session,
            entity,
            stage,
        };
        for hook in hooks {
            hook(&context, &mut *values)?;
        }
        Ok(())
    }

    pub fn count(&self, stage: HookStage) -> usize {
        self.stages[stage.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Vec::is_empty)
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for stage in HookStage::ALL {
            map.entry(&stage, &self.count(stage));
        }
        map.finish()
    }
}

/// Progress of one create, update or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriteStage {
    Requested,
    PreHook,
    AttributesApplied,
    PostHook,
    QueuedForPersist,
}

/// Tracks the stage of a single write and logs its transitions
#[derive(Debug)]
pub struct WriteTracker {
    operation: &'static str,
    entity: EntityName,
    stage: WriteStage,
}

impl WriteTracker {
    pub fn start(operation: &'static str, entity: &EntityName) -> Self {
        log::debug!("{} {}: {:?}", operation, entity, WriteStage::Requested);
        Self {
            operation,
            entity: entity.clone(),
            stage: WriteStage::Requested,
        }
    }

    /// Move forward to `next`. Stages only advance. For deletes
    /// `AttributesApplied` marks the removal.
    pub fn advance(&mut self, next: WriteStage) {
        if next <= self.stage {
            log::warn!(
                "{} {}: ignoring transition {:?} -> {:?}",
                self.operation,
                self.entity,
                self.stage,
                next
            );
            return;
        }
        log::debug!(
            "{} {}: {:?} -> {:?}",
            self.operation,
            self.entity,
            self.stage,
            next
        );
        self.stage = next;
    }

    pub fn stage(&self) -> WriteStage {
        self.stage
    }
}

#[cfg(test)]
#[path = "hooks_test.rs"]
mod tests;
