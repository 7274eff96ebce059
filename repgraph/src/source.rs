//! Collaborator traits for the authoritative and receiving sides.

use loadout::{EquipmentState, ItemInstance, ReplicatedEquipmentData, SlotIndex};

use crate::events::ReplicationEvent;

/// The authoritative owner of equipment state.
///
/// The coordinator is a pure function of what this reports; it never invents
/// state.
pub trait EquipmentSource {
    fn slot_count(&self) -> usize;

    fn slot_item(&self, slot: SlotIndex) -> Option<ItemInstance>;

    fn active_weapon_slot(&self) -> Option<SlotIndex>;

    fn equipment_state_tag(&self) -> String;

    /// Weapon slots get a replication priority boost.
    fn is_weapon_slot(&self, _slot: SlotIndex) -> bool {
        false
    }
}

/// The receiving side of replicated equipment state.
pub trait EquipmentSink {
    fn slot_count(&self) -> usize;

    fn set_slot_item(&mut self, slot: SlotIndex, item: Option<ItemInstance>);

    fn set_active_weapon_slot(&mut self, slot: Option<SlotIndex>);

    fn set_equipment_state_tag(&mut self, tag: &str);

    /// Called once a payload has been applied.
    fn on_replication_event(&mut self, _event: ReplicationEvent) {}
}

/// Pushes decoded data into a sink.
///
/// A full snapshot clears every slot it does not list; a delta touches only
/// the listed slots. Entries beyond the sink's slot count are skipped.
/// Reports [`ReplicationEvent::StateApplied`] to the sink and returns the
/// number of slots written.
pub fn apply_replicated_data<K: EquipmentSink + ?Sized>(
    sink: &mut K,
    data: &ReplicatedEquipmentData,
) -> usize {
    let slot_count = sink.slot_count();
    if data.is_full() {
        for index in 0..slot_count {
            let slot = SlotIndex::new(index as u16);
            if data.entry(slot).is_none() {
                sink.set_slot_item(slot, None);
            }
        }
    }

    let mut written = 0;
    for entry in &data.slots {
        if entry.slot.as_usize() >= slot_count {
            log::warn!(
                "skipping replicated slot {} (sink has {slot_count} slots)",
                entry.slot
            );
            continue;
        }
        sink.set_slot_item(entry.slot, entry.item.clone());
        written += 1;
    }
    sink.set_active_weapon_slot(data.active_weapon_slot);
    sink.set_equipment_state_tag(&data.state_tag);
    sink.on_replication_event(ReplicationEvent::StateApplied {
        version: data.version,
        slots_written: written,
    });
    written
}

impl EquipmentSource for EquipmentState {
    fn slot_count(&self) -> usize {
        EquipmentState::slot_count(self)
    }

    fn slot_item(&self, slot: SlotIndex) -> Option<ItemInstance> {
        self.slot(slot).cloned()
    }

    fn active_weapon_slot(&self) -> Option<SlotIndex> {
        self.active_weapon_slot
    }

    fn equipment_state_tag(&self) -> String {
        self.state_tag.clone()
    }
}

impl EquipmentSink for EquipmentState {
    fn slot_count(&self) -> usize {
        EquipmentState::slot_count(self)
    }

    fn set_slot_item(&mut self, slot: SlotIndex, item: Option<ItemInstance>) {
        if let Err(err) = self.set_slot(slot, item) {
            log::warn!("dropping replicated slot: {err}");
        }
    }

    fn set_active_weapon_slot(&mut self, slot: Option<SlotIndex>) {
        self.active_weapon_slot = slot;
    }

    fn set_equipment_state_tag(&mut self, tag: &str) {
        tag.clone_into(&mut self.state_tag);
    }
}

impl<T: EquipmentSource + ?Sized> EquipmentSource for parking_lot::RwLock<T> {
    fn slot_count(&self) -> usize {
        self.read().slot_count()
    }

    fn slot_item(&self, slot: SlotIndex) -> Option<ItemInstance> {
        self.read().slot_item(slot)
    }

    fn active_weapon_slot(&self) -> Option<SlotIndex> {
        self.read().active_weapon_slot()
    }

    fn equipment_state_tag(&self) -> String {
        self.read().equipment_state_tag()
    }

    fn is_weapon_slot(&self, slot: SlotIndex) -> bool {
        self.read().is_weapon_slot(slot)
    }
}
