//! Deferred mutation queue.
//!
//! Named after the teacher's `TransactionOp`/`TransactionEngine`
//! (`ecsdb::transaction`), which queues Insert/Update/Delete ops for a
//! write-ahead log. This buffer has no durability concerns: it exists
//! purely so mutations raised while iterating a query (or while inside a
//! hook) can be applied safely afterward, via `World::flush`.

use std::any::Any;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::relation::RelationPayload;
use crate::world::World;

pub type SpawnCallback = Box<dyn FnOnce(&mut World, Entity)>;

pub(crate) enum Command {
    Spawn { entity: Entity, callback: Option<SpawnCallback> },
    Destroy(Entity),
    Add(Entity, ComponentId),
    Set(Entity, ComponentId, Rc<dyn Any>),
    Remove(Entity, ComponentId),
    Relate(Entity, ComponentId, Entity, RelationPayload),
    Unrelate(Entity, ComponentId, Entity),
}

/// Holds queued commands plus the re-entrancy guard that makes a nested
/// `flush()` call (e.g. from inside a spawn callback) a silent no-op.
#[derive(Default)]
pub(crate) struct CommandBuffer {
    queue: VecDeque<Command>,
    flushing: bool,
}

impl CommandBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn is_flushing(&self) -> bool {
        self.flushing
    }

    pub(crate) fn pop_front(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }

    pub(crate) fn begin_flush(&mut self) -> bool {
        if self.flushing {
            false
        } else {
            self.flushing = true;
            true
        }
    }

    pub(crate) fn end_flush(&mut self) {
        self.flushing = false;
    }
}
