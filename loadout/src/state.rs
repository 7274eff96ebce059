//! Materialized equipment state on the receiving side.

use crate::data::{ReplicatedEquipmentData, SyncKind};
use crate::error::{LoadoutError, LoadoutResult};
use crate::ids::{SlotIndex, Version};
use crate::item::ItemInstance;

/// Outcome of applying a payload to an [`EquipmentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The payload is older than the local state and was ignored.
    Stale,
}

/// A fixed-size slot table with the active weapon, state tag and version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipmentState {
    slots: Vec<Option<ItemInstance>>,
    pub active_weapon_slot: Option<SlotIndex>,
    pub state_tag: String,
    pub version: Version,
}

impl EquipmentState {
    /// Creates an empty state with `slot_count` slots at version zero.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            active_weapon_slot: None,
            state_tag: String::new(),
            version: Version::ZERO,
        }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn slot(&self, slot: SlotIndex) -> Option<&ItemInstance> {
        self.slots.get(slot.as_usize()).and_then(Option::as_ref)
    }

    /// Sets a slot directly (authoritative side bookkeeping and tests).
    pub fn set_slot(
        &mut self,
        slot: SlotIndex,
        item: Option<ItemInstance>,
    ) -> LoadoutResult<()> {
        let slot_count = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot.as_usize())
            .ok_or(LoadoutError::SlotOutOfRange { slot, slot_count })?;
        *entry = item;
        Ok(())
    }

    /// Iterates over occupied slots in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (SlotIndex, &ItemInstance)> {
        self.slots.iter().enumerate().filter_map(|(index, item)| {
            item.as_ref()
                .map(|item| (SlotIndex::new(index as u16), item))
        })
    }

    /// Applies a full snapshot or a delta.
    ///
    /// A full snapshot replaces every slot; a delta overwrites only the slots
    /// it lists. Payloads older than the local version are ignored. The state
    /// is validated before any slot is touched, so an error leaves it intact.
    pub fn apply(&mut self, data: &ReplicatedEquipmentData) -> LoadoutResult<ApplyOutcome> {
        let stale = match data.kind {
            SyncKind::Full => data.version < self.version,
            SyncKind::Delta { .. } => data.version <= self.version,
        };
        if stale {
            log::debug!(
                "ignoring stale payload {} (local {})",
                data.version,
                self.version
            );
            return Ok(ApplyOutcome::Stale);
        }

        if let SyncKind::Delta { base } = data.kind {
            if base > self.version {
                return Err(LoadoutError::MissingBase {
                    base,
                    have: self.version,
                });
            }
        }

        let slot_count = self.slots.len();
        if let Some(entry) = data
            .slots
            .iter()
            .find(|entry| entry.slot.as_usize() >= slot_count)
        {
            return Err(LoadoutError::SlotOutOfRange {
                slot: entry.slot,
                slot_count,
            });
        }

        if data.is_full() {
            self.slots.iter_mut().for_each(|slot| *slot = None);
        }
        for entry in &data.slots {
            self.slots[entry.slot.as_usize()] = entry.item.clone();
        }
        self.active_weapon_slot = data.active_weapon_slot;
        self.state_tag.clone_from(&data.state_tag);
        self.version = data.version;
        Ok(ApplyOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SlotEntry;

    fn full_with(version: u32, entries: &[(u16, &str)]) -> ReplicatedEquipmentData {
        let mut data = ReplicatedEquipmentData::full(Version::new(version), 0.0);
        for (slot, id) in entries {
            data.slots.push(SlotEntry::occupied(
                SlotIndex::new(*slot),
                ItemInstance::new(*id),
            ));
        }
        data
    }

    #[test]
    fn full_snapshot_replaces_everything() {
        let mut state = EquipmentState::new(4);
        state.apply(&full_with(1, &[(0, "Rifle_AK"), (2, "Medkit")])).unwrap();
        state.apply(&full_with(2, &[(1, "Pistol")])).unwrap();

        assert!(state.slot(SlotIndex::new(0)).is_none());
        assert!(state.slot(SlotIndex::new(2)).is_none());
        assert_eq!(
            state.slot(SlotIndex::new(1)).unwrap().item_id.as_str(),
            "Pistol"
        );
        assert_eq!(state.version, Version::new(2));
    }

    #[test]
    fn full_snapshot_is_idempotent() {
        let snapshot = full_with(3, &[(0, "Rifle_AK")]);
        let mut state = EquipmentState::new(4);
        state.apply(&snapshot).unwrap();
        let once = state.clone();
        assert_eq!(state.apply(&snapshot).unwrap(), ApplyOutcome::Applied);
        assert_eq!(state, once);
    }

    #[test]
    fn delta_patches_listed_slots() {
        let mut state = EquipmentState::new(4);
        state.apply(&full_with(1, &[(0, "Rifle_AK"), (1, "Medkit")])).unwrap();

        let mut delta = ReplicatedEquipmentData::delta(Version::new(1), Version::new(2), 0.0);
        delta.slots.push(SlotEntry::cleared(SlotIndex::new(1)));
        delta.slots.push(SlotEntry::occupied(
            SlotIndex::new(3),
            ItemInstance::new("Grenade"),
        ));
        state.apply(&delta).unwrap();

        assert!(state.slot(SlotIndex::new(0)).is_some());
        assert!(state.slot(SlotIndex::new(1)).is_none());
        assert!(state.slot(SlotIndex::new(3)).is_some());
        assert_eq!(state.occupied().count(), 2);
    }

    #[test]
    fn stale_delta_is_ignored() {
        let mut state = EquipmentState::new(2);
        state.apply(&full_with(5, &[(0, "Rifle_AK")])).unwrap();
        let mut delta = ReplicatedEquipmentData::delta(Version::new(3), Version::new(4), 0.0);
        delta.slots.push(SlotEntry::cleared(SlotIndex::new(0)));
        assert_eq!(state.apply(&delta).unwrap(), ApplyOutcome::Stale);
        assert!(state.slot(SlotIndex::new(0)).is_some());
    }

    #[test]
    fn delta_ahead_of_base_is_rejected() {
        let mut state = EquipmentState::new(2);
        let delta = ReplicatedEquipmentData::delta(Version::new(3), Version::new(4), 0.0);
        let err = state.apply(&delta).unwrap_err();
        assert_eq!(
            err,
            LoadoutError::MissingBase {
                base: Version::new(3),
                have: Version::ZERO
            }
        );
    }

    #[test]
    fn out_of_range_slot_leaves_state_intact() {
        let mut state = EquipmentState::new(2);
        state.apply(&full_with(1, &[(0, "Rifle_AK")])).unwrap();
        let before = state.clone();
        let err = state.apply(&full_with(2, &[(9, "Pistol")])).unwrap_err();
        assert!(matches!(err, LoadoutError::SlotOutOfRange { .. }));
        assert_eq!(state, before);
    }
}
