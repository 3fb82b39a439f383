//! `World`: the single owning struct that wires together entities,
//! components, relations, deferred commands, change tracking, prefabs,
//! hooks and the scheduler.
//!
//! Shaped after the teacher's `Database` (`in_mem_db_core::database`),
//! which owns its tables behind a lock-guarded map and hands out guard
//! types from accessor methods. There's no need for interior mutability
//! here: the spec is explicitly single-threaded and cooperative (see
//! `config::WorldOptions`'s doc comment), so `World` just takes `&mut
//! self` directly instead of wrapping its collections in `RwLock`.

use std::any::Any;
use std::rc::Rc;

use tracing::{debug, debug_span, warn};

use crate::change::ChangeTracker;
use crate::command::{Command, CommandBuffer, SpawnCallback};
use crate::component::{ComponentId, ComponentRegistry, StoreKind};
use crate::config::WorldOptions;
use crate::entity::{Entity, EntityRegistry};
use crate::error::{Result, WorldError};
use crate::hooks::{AddHook, ChangeHook, HookHandle, HookRegistry, RemoveHook};
use crate::prefab::{Prefab, PrefabRegistry, PrefabValue};
use crate::query::{QueryBuilder, QueryCache};
use crate::relation::{RelationIndex, RelationPayload};
use crate::scheduler::{Phase, Scheduler, SystemAccess, SystemFn};
use crate::signature::Signature;
use crate::storage::{SparseStore, Store, TagStore};

pub struct World {
    options: WorldOptions,
    registry: EntityRegistry,
    components: ComponentRegistry,
    stores: Vec<Store>,
    hooks: HookRegistry,
    relations: RelationIndex,
    commands: CommandBuffer,
    changes: ChangeTracker,
    prefabs: PrefabRegistry,
    scheduler: Scheduler,
    query_cache: QueryCache,
    epoch: u64,
    deferred_mode: bool,
}

impl Default for World {
    fn default() -> Self {
        World::new(WorldOptions::default())
    }
}

impl World {
    pub fn new(options: WorldOptions) -> Self {
        debug!(track_changes = options.track_changes, debug = options.debug, "creating world");
        let mut changes = ChangeTracker::new();
        changes.set_enabled(options.track_changes);
        World {
            options,
            registry: EntityRegistry::new(),
            components: ComponentRegistry::new(),
            stores: Vec::new(),
            hooks: HookRegistry::new(),
            relations: RelationIndex::new(),
            commands: CommandBuffer::new(),
            changes,
            prefabs: PrefabRegistry::new(),
            scheduler: Scheduler::new(),
            query_cache: QueryCache::new(),
            epoch: 0,
            deferred_mode: false,
        }
    }

    // ---- component & tag registration ----------------------------------

    pub fn component<T: 'static>(&mut self) -> ComponentId {
        let id = self.components.register(StoreKind::Sparse, std::any::type_name::<T>());
        self.stores.push(Store::Value(SparseStore::new()));
        id
    }

    /// Registers a component under the `Dense` store kind. This crate's
    /// dense storage aliases sparse storage (see `component::StoreKind`);
    /// the distinction exists for callers who want to document access
    /// intent even though both behave identically today.
    pub fn component_dense<T: 'static>(&mut self) -> ComponentId {
        let id = self.components.register(StoreKind::Dense, std::any::type_name::<T>());
        self.stores.push(Store::Value(SparseStore::new()));
        id
    }

    pub fn tag(&mut self) -> ComponentId {
        let id = self.components.register(StoreKind::Tag, "tag");
        self.stores.push(Store::Tag(TagStore::new()));
        id
    }

    // ---- entity lifecycle -----------------------------------------------

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn spawn(&mut self) -> Entity {
        if self.deferred_mode {
            return self.defer_spawn(None);
        }
        let entity = self.registry.spawn();
        debug!(?entity, "spawned entity");
        entity
    }

    /// Reserves an entity id immediately and queues its activation. The
    /// id is usable right away (e.g. passed into further deferred calls)
    /// but `is_alive`/queries won't see it until `flush` runs the
    /// callback, after the matching `Spawn` record is consumed.
    pub fn defer_spawn(&mut self, callback: Option<SpawnCallback>) -> Entity {
        let entity = self.registry.reserve();
        self.commands.push(Command::Spawn { entity, callback });
        entity
    }

    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if self.deferred_mode {
            self.defer_destroy(entity);
            return Ok(());
        }
        self.destroy_immediate(entity)
    }

    pub fn defer_destroy(&mut self, entity: Entity) {
        self.commands.push(Command::Destroy(entity));
    }

    /// Destroying a dead entity is a no-op, per the spec's "direct
    /// mutators silently no-op on destroy" rule: only `set` fails on a
    /// dead entity.
    fn destroy_immediate(&mut self, entity: Entity) -> Result<()> {
        if !self.registry.is_alive(entity) {
            self.note_if_debug(&WorldError::UnknownEntity(entity));
            return Ok(());
        }
        let ids: Vec<ComponentId> = self.registry.signature(entity).unwrap().iter_ids().collect();
        for id in ids {
            self.remove_immediate(entity, id)?;
        }
        self.relations.remove_entity(entity);
        self.registry.destroy(entity);
        self.bump_epoch();
        debug!(?entity, "destroyed entity");
        Ok(())
    }

    // ---- components -------------------------------------------------------

    pub fn add(&mut self, entity: Entity, component: ComponentId) -> Result<()> {
        if self.deferred_mode {
            self.defer_add(entity, component);
            return Ok(());
        }
        self.add_immediate(entity, component)
    }

    pub fn defer_add(&mut self, entity: Entity, component: ComponentId) {
        self.commands.push(Command::Add(entity, component));
    }

    fn add_immediate(&mut self, entity: Entity, component: ComponentId) -> Result<()> {
        self.require_alive(entity)?;
        self.require_component(component)?;
        match self.components.kind_of(component).unwrap() {
            StoreKind::Tag => {}
            _ => {
                let err = WorldError::WrongKind(component);
                self.note_if_debug(&err);
                return Err(err);
            }
        }
        let newly = match &mut self.stores[component.index()] {
            Store::Tag(t) => t.insert(entity),
            Store::Value(_) => unreachable!("checked StoreKind::Tag above"),
        };
        if newly {
            self.registry.signature_mut(entity).unwrap().insert(component);
            self.changes.record_add(component, entity);
            self.bump_epoch();
            self.fire_on_add(component, entity, &());
        }
        Ok(())
    }

    pub fn set<T: 'static>(&mut self, entity: Entity, component: ComponentId, value: T) -> Result<()> {
        self.set_any(entity, component, Rc::new(value) as Rc<dyn Any>)
    }

    pub fn defer_set<T: 'static>(&mut self, entity: Entity, component: ComponentId, value: T) {
        self.commands.push(Command::Set(entity, component, Rc::new(value) as Rc<dyn Any>));
    }

    fn set_any(&mut self, entity: Entity, component: ComponentId, value: Rc<dyn Any>) -> Result<()> {
        if self.deferred_mode {
            self.commands.push(Command::Set(entity, component, value));
            return Ok(());
        }
        self.set_immediate(entity, component, value)
    }

    fn set_immediate(&mut self, entity: Entity, component: ComponentId, value: Rc<dyn Any>) -> Result<()> {
        self.require_alive(entity)?;
        self.require_component(component)?;
        match self.components.kind_of(component).unwrap() {
            StoreKind::Tag => {
                let err = WorldError::WrongKind(component);
                self.note_if_debug(&err);
                return Err(err);
            }
            _ => {}
        }
        let store = match &mut self.stores[component.index()] {
            Store::Value(s) => s,
            Store::Tag(_) => unreachable!("checked StoreKind above"),
        };
        let previous = store.insert(entity, value.clone());
        match previous {
            None => {
                self.registry.signature_mut(entity).unwrap().insert(component);
                self.changes.record_add(component, entity);
                self.bump_epoch();
                self.fire_on_add(component, entity, value.as_ref());
            }
            Some(old) => {
                self.changes.record_change(component, entity);
                self.fire_on_change(component, entity, old.as_ref(), value.as_ref());
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, entity: Entity, component: ComponentId) -> Result<()> {
        if self.deferred_mode {
            self.defer_remove(entity, component);
            return Ok(());
        }
        self.remove_immediate(entity, component)
    }

    pub fn defer_remove(&mut self, entity: Entity, component: ComponentId) {
        self.commands.push(Command::Remove(entity, component));
    }

    /// Removing a component the entity doesn't have, or removing from a
    /// dead entity, is a no-op, not an error: `has()`/`is_alive()` are
    /// the tolerant ways to check first, and a deferred `Remove` queued
    /// for a component or entity already gone by flush time should not
    /// blow up the whole flush.
    fn remove_immediate(&mut self, entity: Entity, component: ComponentId) -> Result<()> {
        if !self.registry.is_alive(entity) {
            self.note_if_debug(&WorldError::UnknownEntity(entity));
            return Ok(());
        }
        self.require_component(component)?;
        let removed = match &mut self.stores[component.index()] {
            Store::Value(s) => s.remove(entity),
            Store::Tag(t) => {
                if t.remove(entity) {
                    Some(Rc::new(()) as Rc<dyn Any>)
                } else {
                    None
                }
            }
        };
        if let Some(value) = removed {
            self.registry.signature_mut(entity).unwrap().remove(component);
            self.changes.record_remove(component, entity);
            self.bump_epoch();
            self.fire_on_remove(component, entity, value.as_ref());
        }
        Ok(())
    }

    pub fn get<T: 'static>(&self, entity: Entity, component: ComponentId) -> Option<&T> {
        match self.stores.get(component.index())? {
            Store::Value(s) => s.get(entity).and_then(|rc| rc.downcast_ref::<T>()),
            Store::Tag(_) => None,
        }
    }

    pub fn has(&self, entity: Entity, components: &[ComponentId]) -> bool {
        match self.registry.signature(entity) {
            Some(sig) => components.iter().all(|&c| sig.contains(c)),
            None => false,
        }
    }

    // ---- relations ----------------------------------------------------

    pub fn relate(
        &mut self,
        source: Entity,
        relation: ComponentId,
        target: Entity,
        payload: RelationPayload,
    ) -> Result<()> {
        if self.deferred_mode {
            self.commands.push(Command::Relate(source, relation, target, payload));
            return Ok(());
        }
        self.relate_immediate(source, relation, target, payload)
    }

    fn relate_immediate(
        &mut self,
        source: Entity,
        relation: ComponentId,
        target: Entity,
        payload: RelationPayload,
    ) -> Result<()> {
        self.require_alive(source)?;
        self.require_alive(target)?;
        self.require_component(relation)?;
        self.relations.relate(source, relation, target, payload);
        Ok(())
    }

    pub fn unrelate(&mut self, source: Entity, relation: ComponentId, target: Entity) -> Result<()> {
        if self.deferred_mode {
            self.commands.push(Command::Unrelate(source, relation, target));
            return Ok(());
        }
        self.relations.unrelate(source, relation, target);
        Ok(())
    }

    pub fn has_relation(&self, source: Entity, relation: ComponentId, target: Entity) -> bool {
        self.relations.has_relation(source, relation, target)
    }

    pub fn get_relation<T: 'static>(&self, source: Entity, relation: ComponentId, target: Entity) -> Option<&T> {
        self.relations
            .payload(source, relation, target)
            .and_then(|p| p.as_ref())
            .and_then(|rc| rc.downcast_ref::<T>())
    }

    pub fn targets(&self, source: Entity, relation: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.relations.targets(source, relation)
    }

    pub fn sources(&self, relation: ComponentId, target: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.relations.sources(relation, target)
    }

    // ---- prefabs --------------------------------------------------------

    pub fn register_prefab(&mut self, prefab: Prefab) {
        self.prefabs.register(prefab);
    }

    pub fn spawn_prefab(&mut self, name: &str) -> Result<Entity> {
        let entries = match self.prefabs.get(name) {
            Some(prefab) => prefab.entries.clone(),
            None => {
                let err = WorldError::UnknownPrefab(name.to_string());
                self.note_if_debug(&err);
                return Err(err);
            }
        };
        let entity = self.spawn();
        for (component, value) in entries {
            match value {
                PrefabValue::Value(v) => self.set_any(entity, component, v)?,
                PrefabValue::Tag => self.add(entity, component)?,
            }
        }
        Ok(entity)
    }

    // ---- hooks ----------------------------------------------------------

    pub fn on_add(&mut self, component: ComponentId, hook: AddHook) -> HookHandle {
        self.hooks.on_add(component, hook)
    }

    pub fn on_remove(&mut self, component: ComponentId, hook: RemoveHook) -> HookHandle {
        self.hooks.on_remove(component, hook)
    }

    pub fn on_change(&mut self, component: ComponentId, hook: ChangeHook) -> HookHandle {
        self.hooks.on_change(component, hook)
    }

    pub fn unsubscribe_hook(&mut self, handle: HookHandle) -> bool {
        self.hooks.unsubscribe(handle)
    }

    fn fire_on_add(&mut self, component: ComponentId, entity: Entity, value: &dyn Any) {
        let mut list = self.hooks.take_on_add(component);
        for (_, cb) in list.iter_mut() {
            cb(self, entity, value);
        }
        self.hooks.restore_on_add(component, list);
    }

    fn fire_on_remove(&mut self, component: ComponentId, entity: Entity, value: &dyn Any) {
        let mut list = self.hooks.take_on_remove(component);
        for (_, cb) in list.iter_mut() {
            cb(self, entity, value);
        }
        self.hooks.restore_on_remove(component, list);
    }

    fn fire_on_change(&mut self, component: ComponentId, entity: Entity, old: &dyn Any, new: &dyn Any) {
        let mut list = self.hooks.take_on_change(component);
        for (_, cb) in list.iter_mut() {
            cb(self, entity, old, new);
        }
        self.hooks.restore_on_change(component, list);
    }

    // ---- change tracking --------------------------------------------------

    pub fn added(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.changes.added(component)
    }

    pub fn removed(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.changes.removed(component)
    }

    pub fn changed(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.changes.changed(component)
    }

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn set_change_tracking_enabled(&mut self, enabled: bool) {
        self.options.track_changes = enabled;
        self.changes.set_enabled(enabled);
    }

    // ---- deferred commands ------------------------------------------------

    /// Toggles deferred mode: while on, `spawn`/`destroy`/`add`/`set`/
    /// `remove`/`relate`/`unrelate` all enqueue instead of applying, and
    /// reads observe the pre-flush state until `flush` runs.
    pub fn defer(&mut self, on: bool) {
        self.deferred_mode = on;
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred_mode
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Drains and applies every queued command. A `flush` called from
    /// within a spawn callback of an outer flush is a silent no-op.
    pub fn flush(&mut self) {
        if !self.commands.begin_flush() {
            debug!("flush: re-entrant call ignored");
            return;
        }
        let _span = debug_span!("flush").entered();
        while let Some(cmd) = self.commands.pop_front() {
            self.apply_command(cmd);
        }
        self.commands.end_flush();
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::Spawn { entity, callback } => {
                self.registry.activate(entity);
                debug!(?entity, "flushed spawn");
                if let Some(cb) = callback {
                    cb(self, entity);
                }
            }
            Command::Destroy(entity) => {
                if let Err(err) = self.destroy_immediate(entity) {
                    warn!(?err, "deferred destroy failed");
                }
            }
            Command::Add(entity, component) => {
                if let Err(err) = self.add_immediate(entity, component) {
                    warn!(?err, "deferred add failed");
                }
            }
            Command::Set(entity, component, value) => {
                if let Err(err) = self.set_immediate(entity, component, value) {
                    warn!(?err, "deferred set failed");
                }
            }
            Command::Remove(entity, component) => {
                if let Err(err) = self.remove_immediate(entity, component) {
                    warn!(?err, "deferred remove failed");
                }
            }
            Command::Relate(source, relation, target, payload) => {
                if let Err(err) = self.relate_immediate(source, relation, target, payload) {
                    warn!(?err, "deferred relate failed");
                }
            }
            Command::Unrelate(source, relation, target) => {
                self.relations.unrelate(source, relation, target);
            }
        }
    }

    // ---- queries ------------------------------------------------------

    pub fn query(&mut self, fetch: &[ComponentId]) -> QueryBuilder<'_> {
        QueryBuilder::new(self, fetch.to_vec())
    }

    /// Clones out the `Rc` handle for `entity`'s `component` value, if
    /// present, tagging tag-kind components distinctly from absence.
    /// Used by `query::QueryBuilder::iter` to build a snapshot detached
    /// from `World`'s borrow.
    pub(crate) fn fetch_cloned(&self, entity: Entity, component: ComponentId) -> Option<crate::query::Fetched> {
        match self.stores.get(component.index())? {
            Store::Value(s) => s.get(entity).cloned().map(crate::query::Fetched::Value),
            Store::Tag(t) => t.contains(entity).then_some(crate::query::Fetched::Tag),
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn query_cache(&self) -> &QueryCache {
        &self.query_cache
    }

    pub(crate) fn query_cache_mut(&mut self) -> &mut QueryCache {
        &mut self.query_cache
    }

    pub(crate) fn entity_signature(&self, entity: Entity) -> Option<&Signature> {
        self.registry.signature(entity)
    }

    pub(crate) fn alive_entities_snapshot(&self) -> Vec<Entity> {
        self.registry.alive_entities().collect()
    }

    pub(crate) fn store_len(&self, component: ComponentId) -> Option<usize> {
        self.stores.get(component.index()).map(|s| s.len())
    }

    pub(crate) fn store_entities_snapshot(&self, component: ComponentId) -> Vec<Entity> {
        self.stores
            .get(component.index())
            .map(|s| s.entities().collect())
            .unwrap_or_default()
    }

    // ---- scheduler ------------------------------------------------------

    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        access: SystemAccess,
        func: SystemFn,
    ) -> Result<()> {
        let name = name.into();
        if self.scheduler.contains(&name) {
            let err = WorldError::DuplicateSystem(name);
            self.note_if_debug(&err);
            return Err(err);
        }
        self.scheduler.add(name, phase, access, func);
        Ok(())
    }

    pub fn remove_system(&mut self, name: &str) -> Result<()> {
        if self.scheduler.remove(name) {
            Ok(())
        } else {
            let err = WorldError::UnknownSystem(name.to_string());
            self.note_if_debug(&err);
            Err(err)
        }
    }

    pub fn enable_system(&mut self, name: &str) -> Result<()> {
        if self.scheduler.set_enabled(name, true) {
            Ok(())
        } else {
            let err = WorldError::UnknownSystem(name.to_string());
            self.note_if_debug(&err);
            Err(err)
        }
    }

    pub fn disable_system(&mut self, name: &str) -> Result<()> {
        if self.scheduler.set_enabled(name, false) {
            Ok(())
        } else {
            let err = WorldError::UnknownSystem(name.to_string());
            self.note_if_debug(&err);
            Err(err)
        }
    }

    /// Runs every enabled system registered for `phase`, in registration
    /// order, passing `dt` to each. Does not flush commands or clear
    /// changes on its own; call it directly (rather than through `step`)
    /// only when composing a custom schedule.
    pub fn run_phase(&mut self, phase: Phase, dt: f32) {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        scheduler.run_phase(phase, self, dt);
        self.scheduler = scheduler;
    }

    /// Runs every phase once in fixed order, flushing pending commands
    /// before each phase starts.
    pub fn run_systems(&mut self, dt: f32) {
        for phase in Phase::ORDER {
            self.flush();
            self.run_phase(phase, dt);
        }
    }

    /// One full scheduler tick: runs every phase (flushing before each),
    /// flushes whatever the last phase queued, then — if `track_changes`
    /// is enabled — clears this frame's change sets.
    pub fn step(&mut self, dt: f32) {
        self.run_systems(dt);
        self.flush();
        if self.options.track_changes {
            self.changes.clear();
        }
        debug!(epoch = self.epoch, "scheduler step complete");
    }

    // ---- internal helpers ------------------------------------------------

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn require_alive(&self, entity: Entity) -> Result<()> {
        if self.registry.is_alive(entity) {
            Ok(())
        } else {
            let err = WorldError::UnknownEntity(entity);
            self.note_if_debug(&err);
            Err(err)
        }
    }

    fn require_component(&self, component: ComponentId) -> Result<()> {
        if self.components.is_registered(component) {
            Ok(())
        } else {
            let err = WorldError::UnknownComponent(component);
            self.note_if_debug(&err);
            Err(err)
        }
    }

    /// Emits a `tracing::warn!` for an undefined-behavior boundary (a
    /// silent no-op or a rejected operation) when `options.debug` is on.
    fn note_if_debug(&self, err: &WorldError) {
        if self.options.debug {
            warn!(%err, "undefined-behavior boundary");
        }
    }
}
