//! Per-frame added/removed/changed entity tracking.
//!
//! Named after the teacher's `Change` log (`in_mem_db_core::transaction::
//! change`), which records byte-level Create/Update/Delete entries; here
//! the unit of change is a whole (entity, component) membership event
//! instead of a byte range, and entries are cleared once per scheduler
//! step rather than kept as a durable log.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::component::ComponentId;
use crate::entity::Entity;

#[derive(Default)]
struct PerComponent {
    added: HashSet<Entity>,
    removed: HashSet<Entity>,
    changed: HashSet<Entity>,
}

/// Tracks which entities gained, lost, or changed each component since
/// the last call to `clear`.
#[derive(Default)]
pub struct ChangeTracker {
    enabled: bool,
    by_component: HashMap<ComponentId, PerComponent>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        ChangeTracker { enabled: false, by_component: HashMap::new() }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records that `entity` gained `component` this frame. If the same
    /// entity had `component` removed earlier this frame, the cancel
    /// rule applies: the net effect is neither added nor removed.
    pub fn record_add(&mut self, component: ComponentId, entity: Entity) {
        if !self.enabled {
            return;
        }
        let slot = self.by_component.entry(component).or_default();
        if slot.removed.remove(&entity) {
            // add-then-remove-then-add nets to a plain add; only cancel
            // the removed flag, still mark added since it's a fresh gain.
        }
        slot.added.insert(entity);
    }

    /// Records that `entity` lost `component` this frame. If `entity`
    /// was added this same frame, the pair cancels to neither.
    pub fn record_remove(&mut self, component: ComponentId, entity: Entity) {
        if !self.enabled {
            return;
        }
        let slot = self.by_component.entry(component).or_default();
        if slot.added.remove(&entity) {
            slot.changed.remove(&entity);
            return;
        }
        slot.changed.remove(&entity);
        slot.removed.insert(entity);
    }

    /// Records that `entity`'s existing `component` value was overwritten.
    /// A component that was also added this frame stays categorized as
    /// added, not changed.
    pub fn record_change(&mut self, component: ComponentId, entity: Entity) {
        if !self.enabled {
            return;
        }
        let slot = self.by_component.entry(component).or_default();
        if slot.added.contains(&entity) {
            return;
        }
        slot.changed.insert(entity);
    }

    pub fn added(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.by_component.get(&component).into_iter().flat_map(|s| s.added.iter().copied())
    }

    pub fn removed(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.by_component.get(&component).into_iter().flat_map(|s| s.removed.iter().copied())
    }

    pub fn changed(&self, component: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.by_component.get(&component).into_iter().flat_map(|s| s.changed.iter().copied())
    }

    /// Clears every component's change sets. Called at the end of each
    /// scheduler step.
    pub fn clear(&mut self) {
        self.by_component.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRegistry;

    fn entity() -> Entity {
        EntityRegistry::new().spawn()
    }

    #[test]
    fn add_then_remove_same_frame_cancels_to_neither() {
        let mut tracker = ChangeTracker::new();
        tracker.set_enabled(true);
        let c = ComponentId::from_raw(0);
        let e = entity();
        tracker.record_add(c, e);
        tracker.record_remove(c, e);
        assert_eq!(tracker.added(c).count(), 0);
        assert_eq!(tracker.removed(c).count(), 0);
    }

    #[test]
    fn set_on_a_component_added_this_frame_stays_added_not_changed() {
        let mut tracker = ChangeTracker::new();
        tracker.set_enabled(true);
        let c = ComponentId::from_raw(0);
        let e = entity();
        tracker.record_add(c, e);
        tracker.record_change(c, e);
        assert_eq!(tracker.added(c).collect::<Vec<_>>(), vec![e]);
        assert_eq!(tracker.changed(c).count(), 0);
    }

    #[test]
    fn clear_resets_all_sets() {
        let mut tracker = ChangeTracker::new();
        tracker.set_enabled(true);
        let c = ComponentId::from_raw(0);
        let e = entity();
        tracker.record_add(c, e);
        tracker.clear();
        assert_eq!(tracker.added(c).count(), 0);
    }

    #[test]
    fn disabled_by_default_records_nothing() {
        let mut tracker = ChangeTracker::new();
        let c = ComponentId::from_raw(0);
        let e = entity();
        tracker.record_add(c, e);
        assert_eq!(tracker.added(c).count(), 0);
    }
}
