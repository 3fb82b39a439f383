//! Cached queries over fetch/with/without component patterns.
//!
//! There's no direct teacher analogue for a query cache; the epoch/
//! snapshot design follows the spec directly. The smallvec-backed value
//! tuple is borrowed from `bevy_cobweb`'s use of `smallvec` for small
//! inline id lists, since a typical fetch list is a handful of
//! components.
//!
//! `.iter()` materializes the whole match list — entities and fetched
//! values alike — up front into an owned `Vec`, rather than holding a
//! live borrow of `World` across iteration. Fetched values are cloned
//! `Rc<dyn Any>` handles rather than borrowed references, which is what
//! lets a caller mutate the world (spawn, destroy, defer a command) from
//! inside the same loop that's iterating a query's results: the snapshot
//! it's iterating no longer has a care in the world about `World`'s
//! borrow state.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::signature::Signature;
use crate::world::World;

#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct QueryPatternKey {
    fetch: Vec<ComponentId>,
    with: Vec<ComponentId>,
    without: Vec<ComponentId>,
}

impl QueryPatternKey {
    fn new(fetch: &[ComponentId], with: &[ComponentId], without: &[ComponentId]) -> Self {
        let mut fetch = fetch.to_vec();
        let mut with = with.to_vec();
        let mut without = without.to_vec();
        fetch.sort_unstable();
        with.sort_unstable();
        without.sort_unstable();
        QueryPatternKey { fetch, with, without }
    }
}

pub(crate) struct CacheEntry {
    pub(crate) entities: Vec<Entity>,
    pub(crate) epoch: u64,
}

#[derive(Default)]
pub(crate) struct QueryCache {
    entries: HashMap<QueryPatternKey, CacheEntry>,
}

impl QueryCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// One fetched component slot: present with a value, present as a tag
/// (no payload), or absent (only possible for `.with()`-only slots,
/// never for fetched ones, since the signature match guarantees
/// presence at snapshot time).
pub enum Fetched {
    Value(Rc<dyn Any>),
    Tag,
}

impl Fetched {
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Fetched::Value(v) => v.downcast_ref::<T>(),
            Fetched::Tag => None,
        }
    }
}

/// A fetch-list-driven query, built fluently with `.with()`/`.without()`
/// and executed with `.iter()`.
pub struct QueryBuilder<'w> {
    world: &'w mut World,
    fetch: Vec<ComponentId>,
    with: Vec<ComponentId>,
    without: Vec<ComponentId>,
}

impl<'w> QueryBuilder<'w> {
    pub(crate) fn new(world: &'w mut World, fetch: Vec<ComponentId>) -> Self {
        QueryBuilder { world, fetch, with: Vec::new(), without: Vec::new() }
    }

    /// Additional components an entity must have, without fetching
    /// their values.
    pub fn with(mut self, ids: &[ComponentId]) -> Self {
        self.with.extend_from_slice(ids);
        self
    }

    /// Components an entity must NOT have.
    pub fn without(mut self, ids: &[ComponentId]) -> Self {
        self.without.extend_from_slice(ids);
        self
    }

    /// Resolves the query now (rebuilding the cache entry if the world's
    /// epoch has moved past it) and returns an owned, detached snapshot
    /// of matches.
    pub fn iter(self) -> QueryIter {
        let QueryBuilder { world, fetch, with, without } = self;
        let key = QueryPatternKey::new(&fetch, &with, &without);

        let mut required_ids: Vec<ComponentId> = fetch.clone();
        required_ids.extend_from_slice(&with);
        let required = Signature::from_ids(&required_ids);
        let forbidden = Signature::from_ids(&without);

        let entities = world.resolve_query(key, &required_ids, &required, &forbidden);
        let rows: Vec<(Entity, SmallVec<[Option<Fetched>; 4]>)> = entities
            .into_iter()
            .map(|e| {
                let values: SmallVec<[Option<Fetched>; 4]> =
                    fetch.iter().map(|&c| world.fetch_cloned(e, c)).collect();
                (e, values)
            })
            .collect();
        QueryIter { rows: rows.into_iter() }
    }
}

/// An owned snapshot of a query's matches, independent of `World`'s
/// borrow; safe to hold across calls that mutate the world.
pub struct QueryIter {
    rows: std::vec::IntoIter<(Entity, SmallVec<[Option<Fetched>; 4]>)>,
}

impl Iterator for QueryIter {
    type Item = (Entity, SmallVec<[Option<Fetched>; 4]>);

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl World {
    pub(crate) fn resolve_query(
        &mut self,
        key: QueryPatternKey,
        required_ids: &[ComponentId],
        required: &Signature,
        forbidden: &Signature,
    ) -> Vec<Entity> {
        if let Some(entry) = self.query_cache().entries.get(&key) {
            if entry.epoch == self.epoch() {
                return entry.entities.clone();
            }
        }

        let candidates = self.candidate_entities(required_ids);
        let entities: Vec<Entity> = candidates
            .into_iter()
            .filter(|&e| self.matches_pattern(e, required, forbidden))
            .collect();

        let epoch = self.epoch();
        self.query_cache_mut().entries.insert(key, CacheEntry { entities: entities.clone(), epoch });
        entities
    }

    fn matches_pattern(&self, entity: Entity, required: &Signature, forbidden: &Signature) -> bool {
        match self.entity_signature(entity) {
            Some(sig) => sig.is_superset_of(required) && sig.is_disjoint_from(forbidden),
            None => false,
        }
    }

    /// Picks the smallest store among `required_ids` to iterate (a rare-
    /// component-first advisory), falling back to every alive entity
    /// when the pattern has no required components.
    fn candidate_entities(&self, required_ids: &[ComponentId]) -> Vec<Entity> {
        if required_ids.is_empty() {
            return self.alive_entities_snapshot();
        }
        let smallest = required_ids
            .iter()
            .filter_map(|&id| self.store_len(id).map(|len| (len, id)))
            .min_by_key(|(len, _)| *len);

        match smallest {
            Some((_, id)) => self.store_entities_snapshot(id),
            None => self.alive_entities_snapshot(),
        }
    }
}
