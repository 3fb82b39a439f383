//! A growable component-membership bitset.
//!
//! The teacher's `ArchetypeMask` (`ecsdb::entity::archetype`) is a fixed
//! `u64`, capping a world at 64 component kinds. The spec requires an
//! unbounded `ComponentId` space, so this wraps `fixedbitset::FixedBitSet`
//! instead and grows on demand as new component ids are set.

use fixedbitset::FixedBitSet;

use crate::component::ComponentId;

#[derive(Clone, Debug, Default)]
pub struct Signature(FixedBitSet);

impl Signature {
    pub fn new() -> Self {
        Signature(FixedBitSet::with_capacity(0))
    }

    fn ensure_capacity(&mut self, bits: usize) {
        if self.0.len() < bits {
            self.0.grow(bits);
        }
    }

    pub fn insert(&mut self, id: ComponentId) {
        let bit = id.index();
        self.ensure_capacity(bit + 1);
        self.0.set(bit, true);
    }

    pub fn remove(&mut self, id: ComponentId) {
        let bit = id.index();
        if bit < self.0.len() {
            self.0.set(bit, false);
        }
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        let bit = id.index();
        bit < self.0.len() && self.0.contains(bit)
    }

    /// True if every bit set in `required` is also set in `self`.
    pub fn is_superset_of(&self, required: &Signature) -> bool {
        required.0.ones().all(|bit| bit < self.0.len() && self.0.contains(bit))
    }

    /// True if no bit set in `forbidden` is set in `self`.
    pub fn is_disjoint_from(&self, forbidden: &Signature) -> bool {
        forbidden.0.ones().all(|bit| !(bit < self.0.len() && self.0.contains(bit)))
    }

    pub fn from_ids(ids: &[ComponentId]) -> Self {
        let mut sig = Signature::new();
        for &id in ids {
            sig.insert(id);
        }
        sig
    }

    /// Every component id currently set, in ascending order.
    pub fn iter_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.0.ones().map(|bit| ComponentId::from_raw(bit as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(n: u32) -> ComponentId {
        ComponentId::from_raw(n)
    }

    #[test]
    fn grows_lazily_as_higher_bits_are_set() {
        let mut sig = Signature::new();
        assert!(!sig.contains(cid(40)));
        sig.insert(cid(40));
        assert!(sig.contains(cid(40)));
        assert!(!sig.contains(cid(0)));
    }

    #[test]
    fn superset_and_disjoint_checks() {
        let has = Signature::from_ids(&[cid(1), cid(2), cid(5)]);
        let required = Signature::from_ids(&[cid(1), cid(2)]);
        let forbidden = Signature::from_ids(&[cid(9)]);
        assert!(has.is_superset_of(&required));
        assert!(has.is_disjoint_from(&forbidden));

        let missing = Signature::from_ids(&[cid(1), cid(9)]);
        assert!(!has.is_superset_of(&missing));
        let overlapping_forbidden = Signature::from_ids(&[cid(5)]);
        assert!(!has.is_disjoint_from(&overlapping_forbidden));
    }

    #[test]
    fn remove_clears_a_previously_set_bit() {
        let mut sig = Signature::new();
        sig.insert(cid(3));
        sig.remove(cid(3));
        assert!(!sig.contains(cid(3)));
    }
}
