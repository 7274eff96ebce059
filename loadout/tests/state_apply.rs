use loadout::{
    item_id_hash16, ApplyOutcome, EquipmentState, ItemInstance, NameTable, ReplicatedEquipmentData,
    SlotEntry, SlotIndex, Version,
};
use proptest::prelude::*;

const SLOTS: u16 = 6;

fn entry() -> impl Strategy<Value = SlotEntry> {
    (0..SLOTS, proptest::option::of(1u32..50)).prop_map(|(slot, quantity)| SlotEntry {
        slot: SlotIndex::new(slot),
        item: quantity.map(|q| ItemInstance::new("ammo_box").with_quantity(q)),
    })
}

proptest! {
    #[test]
    fn delta_touches_only_listed_slots(
        base in prop::collection::vec(entry(), 0..6),
        changes in prop::collection::vec(entry(), 0..6),
    ) {
        let mut full = ReplicatedEquipmentData::full(Version::new(1), 0.0);
        full.slots = base;
        let mut state = EquipmentState::new(usize::from(SLOTS));
        state.apply(&full).unwrap();
        let before = state.clone();

        let mut delta = ReplicatedEquipmentData::delta(Version::new(1), Version::new(2), 0.1);
        delta.slots = changes.clone();
        prop_assert_eq!(state.apply(&delta).unwrap(), ApplyOutcome::Applied);

        for index in 0..SLOTS {
            let slot = SlotIndex::new(index);
            match changes.iter().rev().find(|entry| entry.slot == slot) {
                Some(entry) => {
                    prop_assert_eq!(state.slot(slot), entry.item.as_ref());
                }
                None => {
                    prop_assert_eq!(state.slot(slot), before.slot(slot));
                }
            }
        }
    }

    #[test]
    fn stale_payloads_leave_state_unchanged(changes in prop::collection::vec(entry(), 1..6)) {
        let mut state = EquipmentState::new(usize::from(SLOTS));
        state.apply(&ReplicatedEquipmentData::full(Version::new(10), 0.0)).unwrap();
        let before = state.clone();

        let mut old_delta = ReplicatedEquipmentData::delta(Version::new(8), Version::new(9), 0.0);
        old_delta.slots = changes.clone();
        let mut old_full = ReplicatedEquipmentData::full(Version::new(9), 0.0);
        old_full.slots = changes;

        prop_assert_eq!(state.apply(&old_delta).unwrap(), ApplyOutcome::Stale);
        prop_assert_eq!(state.apply(&old_full).unwrap(), ApplyOutcome::Stale);
        prop_assert_eq!(state, before);
    }
}

#[test]
fn name_table_resolves_registered_items() {
    let mut names = NameTable::with_standard_properties();
    let hash = names.register_item("Rifle_AK").unwrap();
    assert_eq!(hash, item_id_hash16("Rifle_AK"));
    assert_eq!(names.item_name(hash), Some("Rifle_AK"));
    assert_eq!(names.register_item("Rifle_AK").unwrap(), hash);
    assert_eq!(names.item_count(), 1);
}
