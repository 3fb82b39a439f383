//! Directed (source, relation, target, payload) triples with forward and
//! reverse indices.
//!
//! Grounded in the teacher's dual-index `ArchetypeRegistry`
//! (`ecsdb::entity::archetype`), which keeps `archetype_entities` and
//! `entity_archetype` in sync on every mutation; the same
//! keep-two-maps-consistent discipline is used here for `forward`/
//! `reverse`, plus two small auxiliary indices (`outgoing`/`incoming`)
//! so `remove_entity` doesn't need a full scan to find every triple that
//! references a destroyed entity.
//!
//! Payloads are `Rc<dyn Any>` rather than `Box<dyn Any>` so the same
//! value can be referenced from both the forward and reverse index
//! without requiring `Clone` on arbitrary component types.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::component::ComponentId;
use crate::entity::Entity;

pub type RelationPayload = Option<Rc<dyn Any>>;

#[derive(Default)]
pub struct RelationIndex {
    forward: HashMap<(Entity, ComponentId), Vec<(Entity, RelationPayload)>>,
    reverse: HashMap<(ComponentId, Entity), Vec<(Entity, RelationPayload)>>,
    outgoing: HashMap<Entity, Vec<ComponentId>>,
    incoming: HashMap<Entity, Vec<ComponentId>>,
}

impl RelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the triple, or overwrites the payload in place if it
    /// already existed.
    pub fn relate(&mut self, source: Entity, relation: ComponentId, target: Entity, payload: RelationPayload) {
        let fwd = self.forward.entry((source, relation)).or_insert_with(|| {
            let list = self.outgoing.entry(source).or_default();
            if !list.contains(&relation) {
                list.push(relation);
            }
            Vec::new()
        });
        if let Some(slot) = fwd.iter_mut().find(|(t, _)| *t == target) {
            slot.1 = payload.clone();
        } else {
            fwd.push((target, payload.clone()));
        }

        let rev = self.reverse.entry((relation, target)).or_insert_with(|| {
            let list = self.incoming.entry(target).or_default();
            if !list.contains(&relation) {
                list.push(relation);
            }
            Vec::new()
        });
        if let Some(slot) = rev.iter_mut().find(|(s, _)| *s == source) {
            slot.1 = payload;
        } else {
            rev.push((source, payload));
        }
    }

    pub fn unrelate(&mut self, source: Entity, relation: ComponentId, target: Entity) -> bool {
        let mut removed = false;
        if let Some(list) = self.forward.get_mut(&(source, relation)) {
            let before = list.len();
            list.retain(|(t, _)| *t != target);
            removed |= list.len() != before;
            if list.is_empty() {
                self.forward.remove(&(source, relation));
                if let Some(outgoing) = self.outgoing.get_mut(&source) {
                    outgoing.retain(|r| *r != relation);
                }
            }
        }
        if let Some(list) = self.reverse.get_mut(&(relation, target)) {
            let before = list.len();
            list.retain(|(s, _)| *s != source);
            removed |= list.len() != before;
            if list.is_empty() {
                self.reverse.remove(&(relation, target));
                if let Some(incoming) = self.incoming.get_mut(&target) {
                    incoming.retain(|r| *r != relation);
                }
            }
        }
        removed
    }

    pub fn has_relation(&self, source: Entity, relation: ComponentId, target: Entity) -> bool {
        self.forward
            .get(&(source, relation))
            .map(|v| v.iter().any(|(t, _)| *t == target))
            .unwrap_or(false)
    }

    pub fn payload(&self, source: Entity, relation: ComponentId, target: Entity) -> Option<&RelationPayload> {
        self.forward
            .get(&(source, relation))
            .and_then(|v| v.iter().find(|(t, _)| *t == target))
            .map(|(_, p)| p)
    }

    /// All targets `source` is related to via `relation`, insertion order.
    pub fn targets(&self, source: Entity, relation: ComponentId) -> impl Iterator<Item = Entity> + '_ {
        self.forward
            .get(&(source, relation))
            .into_iter()
            .flat_map(|v| v.iter().map(|(t, _)| *t))
    }

    /// All sources related to `target` via `relation`, insertion order.
    pub fn sources(&self, relation: ComponentId, target: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.reverse
            .get(&(relation, target))
            .into_iter()
            .flat_map(|v| v.iter().map(|(s, _)| *s))
    }

    /// Removes every triple where `entity` appears as source or target.
    /// Called when an entity is destroyed.
    pub fn remove_entity(&mut self, entity: Entity) {
        if let Some(relations) = self.outgoing.remove(&entity) {
            for relation in relations {
                if let Some(targets) = self.forward.remove(&(entity, relation)) {
                    for (target, _) in targets {
                        if let Some(rev) = self.reverse.get_mut(&(relation, target)) {
                            rev.retain(|(s, _)| *s != entity);
                            if rev.is_empty() {
                                self.reverse.remove(&(relation, target));
                                if let Some(list) = self.incoming.get_mut(&target) {
                                    list.retain(|r| *r != relation);
                                }
                            }
                        }
                    }
                }
            }
        }
        if let Some(relations) = self.incoming.remove(&entity) {
            for relation in relations {
                if let Some(sources) = self.reverse.remove(&(relation, entity)) {
                    for (source, _) in sources {
                        if let Some(fwd) = self.forward.get_mut(&(source, relation)) {
                            fwd.retain(|(t, _)| *t != entity);
                            if fwd.is_empty() {
                                self.forward.remove(&(source, relation));
                                if let Some(list) = self.outgoing.get_mut(&source) {
                                    list.retain(|r| *r != relation);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRegistry;

    fn two_entities() -> (Entity, Entity) {
        let mut reg = EntityRegistry::new();
        (reg.spawn(), reg.spawn())
    }

    #[test]
    fn relate_is_visible_from_both_indices() {
        let (a, b) = two_entities();
        let mut index = RelationIndex::new();
        let likes = ComponentId::from_raw(0);
        index.relate(a, likes, b, None);
        assert!(index.has_relation(a, likes, b));
        assert_eq!(index.targets(a, likes).collect::<Vec<_>>(), vec![b]);
        assert_eq!(index.sources(likes, b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn unrelate_clears_both_indices() {
        let (a, b) = two_entities();
        let mut index = RelationIndex::new();
        let likes = ComponentId::from_raw(0);
        index.relate(a, likes, b, None);
        assert!(index.unrelate(a, likes, b));
        assert!(!index.has_relation(a, likes, b));
        assert_eq!(index.targets(a, likes).count(), 0);
        assert_eq!(index.sources(likes, b).count(), 0);
    }

    #[test]
    fn destroying_source_or_target_drops_its_triples() {
        let (a, b) = two_entities();
        let mut index = RelationIndex::new();
        let likes = ComponentId::from_raw(0);
        index.relate(a, likes, b, None);
        index.remove_entity(a);
        assert!(!index.has_relation(a, likes, b));
        assert_eq!(index.sources(likes, b).count(), 0);
    }

    #[test]
    fn relate_twice_overwrites_payload_without_duplicating_target() {
        let (a, b) = two_entities();
        let mut index = RelationIndex::new();
        let likes = ComponentId::from_raw(0);
        index.relate(a, likes, b, Some(Rc::new(1_i32)));
        index.relate(a, likes, b, Some(Rc::new(2_i32)));
        assert_eq!(index.targets(a, likes).count(), 1);
        let payload = index.payload(a, likes, b).unwrap().as_ref().unwrap();
        assert_eq!(*payload.downcast_ref::<i32>().unwrap(), 2);
    }
}
