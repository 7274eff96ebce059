//! Slot change masks.

use std::collections::BTreeSet;

use loadout::{SlotIndex, Version};

/// The set of slots changed over a version range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeltaMask {
    /// Exclusive lower bound: changes after this version.
    pub start_version: Version,
    /// Inclusive upper bound.
    pub end_version: Version,
    pub slots: BTreeSet<SlotIndex>,
}

impl DeltaMask {
    /// Creates an empty mask covering `(start, end]`.
    #[must_use]
    pub const fn new(start_version: Version, end_version: Version) -> Self {
        Self {
            start_version,
            end_version,
            slots: BTreeSet::new(),
        }
    }

    /// Creates a mask for the single version `version`.
    #[must_use]
    pub fn for_version(version: Version, slots: impl IntoIterator<Item = SlotIndex>) -> Self {
        Self {
            start_version: Version::new(version.raw().saturating_sub(1)),
            end_version: version,
            slots: slots.into_iter().collect(),
        }
    }

    /// Adds a slot; returns `true` if it was not already present.
    pub fn add_slot(&mut self, slot: SlotIndex) -> bool {
        self.slots.insert(slot)
    }

    #[must_use]
    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.slots.contains(&slot)
    }

    /// Unions another mask into this one and widens the version range.
    pub fn merge(&mut self, other: &Self) {
        if self.slots.is_empty() && self.start_version == self.end_version {
            self.start_version = other.start_version;
        } else {
            self.start_version = self.start_version.min(other.start_version);
        }
        self.end_version = self.end_version.max(other.end_version);
        self.slots.extend(other.slots.iter().copied());
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.slots.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Empties the mask and collapses its range onto `end_version`.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.start_version = self.end_version;
    }

    pub fn iter(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.slots.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(raw: &[u16]) -> Vec<SlotIndex> {
        raw.iter().copied().map(SlotIndex::new).collect()
    }

    #[test]
    fn add_and_contains() {
        let mut mask = DeltaMask::new(Version::new(1), Version::new(2));
        assert!(!mask.has_changes());
        assert!(mask.add_slot(SlotIndex::new(3)));
        assert!(!mask.add_slot(SlotIndex::new(3)));
        assert!(mask.contains(SlotIndex::new(3)));
        assert_eq!(mask.len(), 1);
    }

    #[test]
    fn merge_unions_slots_and_range() {
        let mut a = DeltaMask::for_version(Version::new(5), slots(&[0, 2]));
        let b = DeltaMask::for_version(Version::new(7), slots(&[2, 4]));
        a.merge(&b);
        assert_eq!(a.start_version, Version::new(4));
        assert_eq!(a.end_version, Version::new(7));
        assert_eq!(a.iter().collect::<Vec<_>>(), slots(&[0, 2, 4]));
    }

    #[test]
    fn merge_into_empty_adopts_range() {
        let mut acc = DeltaMask::new(Version::new(9), Version::new(9));
        acc.merge(&DeltaMask::for_version(Version::new(12), slots(&[1])));
        assert_eq!(acc.start_version, Version::new(11));
        assert_eq!(acc.end_version, Version::new(12));
    }

    #[test]
    fn clear_collapses_range() {
        let mut mask = DeltaMask::for_version(Version::new(3), slots(&[1]));
        mask.clear();
        assert!(mask.is_empty());
        assert_eq!(mask.start_version, mask.end_version);
    }
}
