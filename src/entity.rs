//! Entity identifiers and the registry that allocates, reserves and
//! recycles them.
//!
//! Mirrors the index+generation recycling scheme used by the teacher's
//! `EntityRegistry` (see `ecsdb::entity::registry`), but keeps a per-entity
//! [`Signature`] alongside the slot instead of a separate archetype map,
//! and adds an explicit `Reserved` state so a deferred spawn's id can be
//! handed out before the entity becomes visible to queries.

use crate::signature::Signature;

/// A stable handle to a logical entity: a slot index plus a generation
/// counter that invalidates stale handles once the slot is recycled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SlotState {
    Free,
    Reserved,
    Alive,
}

struct Slot {
    generation: u32,
    state: SlotState,
    signature: Signature,
}

/// Owns every entity slot in a world: allocation, recycling, liveness and
/// each entity's component [`Signature`].
#[derive(Default)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a slot without making it visible to queries yet. Used by
    /// the deferred command buffer so a spawn's id can be referenced by
    /// later commands in the same batch before the spawn is applied.
    pub fn reserve(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = SlotState::Reserved;
            slot.signature = Signature::new();
            Entity {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Reserved,
                signature: Signature::new(),
            });
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Promotes a reserved entity to alive. Returns `false` if `entity`
    /// is not the slot's current reservation (stale handle, or already
    /// activated).
    pub fn activate(&mut self, entity: Entity) -> bool {
        match self.slots.get_mut(entity.index as usize) {
            Some(slot) if slot.generation == entity.generation && slot.state == SlotState::Reserved => {
                slot.state = SlotState::Alive;
                true
            }
            _ => false,
        }
    }

    /// Reserves and immediately activates a new entity.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.reserve();
        self.activate(entity);
        entity
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        matches!(
            self.slots.get(entity.index as usize),
            Some(slot) if slot.generation == entity.generation && slot.state == SlotState::Alive
        )
    }

    /// Retires an entity's slot, bumping its generation so any held
    /// handle becomes stale, and queues the index for reuse. Returns
    /// `false` if the entity was already dead.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        slot.signature = Signature::new();
        self.free_list.push(entity.index);
        true
    }

    pub fn signature(&self, entity: Entity) -> Option<&Signature> {
        if self.is_alive(entity) {
            Some(&self.slots[entity.index as usize].signature)
        } else {
            None
        }
    }

    pub fn signature_mut(&mut self, entity: Entity) -> Option<&mut Signature> {
        if self.is_alive(entity) {
            Some(&mut self.slots[entity.index as usize].signature)
        } else {
            None
        }
    }

    pub fn alive_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            (slot.state == SlotState::Alive).then_some(Entity {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state == SlotState::Alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_then_destroy_recycles_index_with_new_generation() {
        let mut reg = EntityRegistry::new();
        let e1 = reg.spawn();
        assert!(reg.is_alive(e1));
        assert!(reg.destroy(e1));
        assert!(!reg.is_alive(e1));

        let e2 = reg.spawn();
        assert_eq!(e1.index(), e2.index());
        assert_ne!(e1.generation(), e2.generation());
        assert!(reg.is_alive(e2));
        assert!(!reg.is_alive(e1));
    }

    #[test]
    fn reserve_is_not_alive_until_activated() {
        let mut reg = EntityRegistry::new();
        let e = reg.reserve();
        assert!(!reg.is_alive(e));
        assert!(reg.activate(e));
        assert!(reg.is_alive(e));
    }

    #[test]
    fn destroying_twice_is_a_no_op_on_the_second_call() {
        let mut reg = EntityRegistry::new();
        let e = reg.spawn();
        assert!(reg.destroy(e));
        assert!(!reg.destroy(e));
    }

    #[test]
    fn alive_entities_excludes_reserved_and_destroyed() {
        let mut reg = EntityRegistry::new();
        let alive = reg.spawn();
        let reserved = reg.reserve();
        let destroyed = reg.spawn();
        reg.destroy(destroyed);

        let seen: Vec<_> = reg.alive_entities().collect();
        assert_eq!(seen, vec![alive]);
        assert!(!seen.contains(&reserved));
    }
}
