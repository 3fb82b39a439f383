//! Component ids and the registry that tracks what storage kind each one
//! uses.
//!
//! Grounded in the teacher's `Component` trait (`ecsdb::component`), but
//! where the teacher assigns a `TABLE_ID` per static Rust type with a
//! fixed byte layout, this registry hands out ids dynamically at
//! registration time and stores values behind `Rc<dyn Any>` (see
//! `storage::sparse`) since the spec's components are opaque payloads,
//! not schema-known byte records.

/// Opaque handle identifying a registered component or tag kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ComponentId(u32);

impl ComponentId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        ComponentId(raw)
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// How a component's values are stored.
///
/// `Sparse` and `Dense` behave identically in this implementation (both
/// back onto `storage::sparse::SparseStore`); the distinction is kept so
/// callers can document access-pattern intent, matching the spec's
/// note that dense storage may alias sparse storage when no packed
/// array representation is implemented.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StoreKind {
    Sparse,
    Dense,
    Tag,
}

struct ComponentDescriptor {
    kind: StoreKind,
    type_name: &'static str,
}

#[derive(Default)]
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: StoreKind, type_name: &'static str) -> ComponentId {
        let id = ComponentId::from_raw(self.descriptors.len() as u32);
        self.descriptors.push(ComponentDescriptor { kind, type_name });
        id
    }

    pub fn kind_of(&self, id: ComponentId) -> Option<StoreKind> {
        self.descriptors.get(id.index()).map(|d| d.kind)
    }

    pub fn type_name_of(&self, id: ComponentId) -> Option<&'static str> {
        self.descriptors.get(id.index()).map(|d| d.type_name)
    }

    pub fn is_registered(&self, id: ComponentId) -> bool {
        id.index() < self.descriptors.len()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_assigns_increasing_ids_and_remembers_kind() {
        let mut reg = ComponentRegistry::new();
        let a = reg.register(StoreKind::Sparse, "Position");
        let b = reg.register(StoreKind::Tag, "Dead");
        assert_ne!(a, b);
        assert_eq!(reg.kind_of(a), Some(StoreKind::Sparse));
        assert_eq!(reg.kind_of(b), Some(StoreKind::Tag));
        assert_eq!(reg.type_name_of(a), Some("Position"));
    }

    #[test]
    fn unregistered_id_reports_no_kind() {
        let reg = ComponentRegistry::new();
        assert_eq!(reg.kind_of(ComponentId::from_raw(0)), None);
    }
}
