//! Type-erased value storage, shared by sparse and dense component kinds.
//!
//! Adapted from the teacher's `SparseSet<T>` (`ecsdb::storage::sparse`),
//! which keyed a dense `Vec<T>` by a side index map. Since this crate's
//! components are opaque payloads rather than a single static `T`, values
//! are kept behind `Rc<dyn Any>` directly in the entity-keyed map: an
//! owned clone of the `Rc` can be taken out independently of any borrow
//! of the store, which is what lets hook callbacks receive `&mut World`
//! while still holding a reference to the component value that triggered
//! them (see `world::World::fire_on_change`).

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::entity::Entity;

#[derive(Default)]
pub struct SparseStore {
    values: HashMap<Entity, Rc<dyn Any>>,
}

impl SparseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the value for `entity`, returning the
    /// previous value if there was one.
    pub fn insert(&mut self, entity: Entity, value: Rc<dyn Any>) -> Option<Rc<dyn Any>> {
        self.values.insert(entity, value)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<Rc<dyn Any>> {
        self.values.remove(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&Rc<dyn Any>> {
        self.values.get(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.values.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.values.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_at(index: u32) -> Entity {
        // Entity has no public constructor outside the crate; tests live
        // in-crate so this reaches the private fields via a registry.
        let mut reg = crate::entity::EntityRegistry::new();
        let mut last = reg.spawn();
        for _ in 0..index {
            last = reg.spawn();
        }
        last
    }

    #[test]
    fn insert_get_remove_round_trip() {
        let mut store = SparseStore::new();
        let e = entity_at(0);
        assert!(store.insert(e, Rc::new(7_i32)).is_none());
        assert!(store.contains(e));
        assert_eq!(*store.get(e).unwrap().downcast_ref::<i32>().unwrap(), 7);

        let removed = store.remove(e).unwrap();
        assert_eq!(*removed.downcast_ref::<i32>().unwrap(), 7);
        assert!(!store.contains(e));
    }

    #[test]
    fn overwrite_returns_previous_value() {
        let mut store = SparseStore::new();
        let e = entity_at(0);
        store.insert(e, Rc::new(1_i32));
        let prev = store.insert(e, Rc::new(2_i32));
        assert_eq!(*prev.unwrap().downcast_ref::<i32>().unwrap(), 1);
        assert_eq!(*store.get(e).unwrap().downcast_ref::<i32>().unwrap(), 2);
    }
}
