pub mod sparse;
pub mod tag;

pub use sparse::SparseStore;
pub use tag::TagStore;

use crate::entity::Entity;

/// A single component kind's backing storage. `Value` serves both the
/// `Sparse` and `Dense` `StoreKind`s (see `component::StoreKind`); `Tag`
/// components carry no payload.
pub enum Store {
    Value(SparseStore),
    Tag(TagStore),
}

impl Store {
    pub fn len(&self) -> usize {
        match self {
            Store::Value(s) => s.len(),
            Store::Tag(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, entity: Entity) -> bool {
        match self {
            Store::Value(s) => s.contains(entity),
            Store::Tag(s) => s.contains(entity),
        }
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        match self {
            Store::Value(s) => s.remove(entity).is_some(),
            Store::Tag(s) => s.remove(entity),
        }
    }

    pub fn entities(&self) -> Box<dyn Iterator<Item = Entity> + '_> {
        match self {
            Store::Value(s) => Box::new(s.entities()),
            Store::Tag(s) => Box::new(s.entities()),
        }
    }
}
