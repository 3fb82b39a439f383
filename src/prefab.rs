//! Named, ordered templates of component values, instantiated via spawn.

use std::any::Any;
use std::rc::Rc;

use crate::component::ComponentId;

/// A single slot in a prefab template: either a value-bearing component
/// or a tag (payload-free) component.
#[derive(Clone)]
pub enum PrefabValue {
    Value(Rc<dyn Any>),
    Tag,
}

/// An ordered template of (component, value) pairs. Built with
/// [`PrefabBuilder`] and instantiated through `World::spawn_prefab`.
#[derive(Clone)]
pub struct Prefab {
    pub(crate) name: String,
    pub(crate) entries: Vec<(ComponentId, PrefabValue)>,
}

impl Prefab {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Fluent builder for a [`Prefab`]; component order is preserved and
/// replayed in the same order on every instantiation.
pub struct PrefabBuilder {
    name: String,
    entries: Vec<(ComponentId, PrefabValue)>,
}

impl PrefabBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        PrefabBuilder { name: name.into(), entries: Vec::new() }
    }

    pub fn with_value(mut self, component: ComponentId, value: Rc<dyn Any>) -> Self {
        self.entries.push((component, PrefabValue::Value(value)));
        self
    }

    pub fn with_tag(mut self, component: ComponentId) -> Self {
        self.entries.push((component, PrefabValue::Tag));
        self
    }

    pub fn build(self) -> Prefab {
        Prefab { name: self.name, entries: self.entries }
    }
}

/// Stores prefabs by name for later instantiation.
#[derive(Default)]
pub struct PrefabRegistry {
    prefabs: std::collections::HashMap<String, Prefab>,
}

impl PrefabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prefab: Prefab) {
        self.prefabs.insert(prefab.name.clone(), prefab);
    }

    pub fn get(&self, name: &str) -> Option<&Prefab> {
        self.prefabs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_insertion_order() {
        let c0 = ComponentId::from_raw(0);
        let c1 = ComponentId::from_raw(1);
        let prefab = PrefabBuilder::new("goblin").with_value(c0, Rc::new(10_i32)).with_tag(c1).build();
        assert_eq!(prefab.name(), "goblin");
        assert_eq!(prefab.entries.len(), 2);
        assert_eq!(prefab.entries[0].0, c0);
        assert_eq!(prefab.entries[1].0, c1);
    }

    #[test]
    fn registry_looks_up_by_name() {
        let mut registry = PrefabRegistry::new();
        registry.register(PrefabBuilder::new("goblin").build());
        assert!(registry.get("goblin").is_some());
        assert!(registry.get("dragon").is_none());
    }
}
