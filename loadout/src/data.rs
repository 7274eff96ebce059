//! The replicated equipment payload.

use crate::ids::{SlotIndex, Version};
use crate::item::ItemInstance;

/// One slot in a replicated payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotEntry {
    pub slot: SlotIndex,
    /// `None` means the slot was cleared.
    pub item: Option<ItemInstance>,
}

impl SlotEntry {
    #[must_use]
    pub const fn occupied(slot: SlotIndex, item: ItemInstance) -> Self {
        Self {
            slot,
            item: Some(item),
        }
    }

    #[must_use]
    pub const fn cleared(slot: SlotIndex) -> Self {
        Self { slot, item: None }
    }
}

/// Whether a payload replaces all state or patches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncKind {
    /// Replace the receiver's state; slots not listed are empty.
    #[default]
    Full,
    /// Overwrite only the listed slots; valid on top of `base` or later.
    Delta { base: Version },
}

/// Equipment state as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicatedEquipmentData {
    pub kind: SyncKind,
    /// Entries ordered by slot index.
    pub slots: Vec<SlotEntry>,
    pub active_weapon_slot: Option<SlotIndex>,
    pub state_tag: String,
    pub version: Version,
    pub timestamp: f32,
}

impl ReplicatedEquipmentData {
    /// Creates an empty full snapshot.
    #[must_use]
    pub const fn full(version: Version, timestamp: f32) -> Self {
        Self {
            kind: SyncKind::Full,
            slots: Vec::new(),
            active_weapon_slot: None,
            state_tag: String::new(),
            version,
            timestamp,
        }
    }

    /// Creates an empty delta on top of `base`.
    #[must_use]
    pub const fn delta(base: Version, version: Version, timestamp: f32) -> Self {
        Self {
            kind: SyncKind::Delta { base },
            slots: Vec::new(),
            active_weapon_slot: None,
            state_tag: String::new(),
            version,
            timestamp,
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self.kind, SyncKind::Full)
    }

    /// Returns `true` for a delta that carries no slot changes.
    #[must_use]
    pub fn is_empty_delta(&self) -> bool {
        !self.is_full() && self.slots.is_empty()
    }

    #[must_use]
    pub fn entry(&self, slot: SlotIndex) -> Option<&SlotEntry> {
        self.slots.iter().find(|entry| entry.slot == slot)
    }
}

/// Prepares a payload for replication.
///
/// Removes client-local runtime properties from every item and, for full
/// snapshots, drops trailing empty entries (absence already means empty).
/// Cleared entries in a delta carry meaning and are kept.
pub fn strip_transient_properties(data: &mut ReplicatedEquipmentData) {
    let mut stripped = 0;
    for item in data.slots.iter_mut().filter_map(|entry| entry.item.as_mut()) {
        stripped += item.strip_transient();
    }

    if data.is_full() {
        while data.slots.last().is_some_and(|entry| entry.item.is_none()) {
            data.slots.pop();
        }
    }

    if stripped > 0 {
        log::trace!("stripped {stripped} transient properties from {}", data.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::props;

    fn item_with_transients() -> ItemInstance {
        ItemInstance::new("Rifle_AK")
            .with_property(props::AMMO, 30.0)
            .with_property(props::LOCAL_COOLDOWN, 1.0)
    }

    #[test]
    fn constructors_set_kind() {
        let full = ReplicatedEquipmentData::full(Version::new(4), 1.0);
        assert!(full.is_full());
        let delta = ReplicatedEquipmentData::delta(Version::new(2), Version::new(4), 1.0);
        assert_eq!(
            delta.kind,
            SyncKind::Delta {
                base: Version::new(2)
            }
        );
        assert!(delta.is_empty_delta());
    }

    #[test]
    fn strip_removes_transients_and_trailing_empties_in_full() {
        let mut data = ReplicatedEquipmentData::full(Version::new(1), 0.0);
        data.slots.push(SlotEntry::occupied(
            SlotIndex::new(0),
            item_with_transients(),
        ));
        data.slots.push(SlotEntry::cleared(SlotIndex::new(1)));
        data.slots.push(SlotEntry::cleared(SlotIndex::new(2)));

        strip_transient_properties(&mut data);

        assert_eq!(data.slots.len(), 1);
        let item = data.slots[0].item.as_ref().unwrap();
        assert_eq!(item.property(props::LOCAL_COOLDOWN), None);
        assert_eq!(item.property(props::AMMO), Some(30.0));
    }

    #[test]
    fn strip_keeps_cleared_entries_in_delta() {
        let mut data = ReplicatedEquipmentData::delta(Version::new(1), Version::new(2), 0.0);
        data.slots.push(SlotEntry::cleared(SlotIndex::new(3)));

        strip_transient_properties(&mut data);

        assert_eq!(data.slots, vec![SlotEntry::cleared(SlotIndex::new(3))]);
    }

    #[test]
    fn entry_lookup() {
        let mut data = ReplicatedEquipmentData::full(Version::new(1), 0.0);
        data.slots
            .push(SlotEntry::occupied(SlotIndex::new(5), ItemInstance::new("Medkit")));
        assert!(data.entry(SlotIndex::new(5)).is_some());
        assert!(data.entry(SlotIndex::new(4)).is_none());
    }
}
