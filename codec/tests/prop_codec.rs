use std::collections::BTreeMap;

use codec::{decode_packed, encode_packed, CodecConfig, CodecLimits, PayloadCodec};
use loadout::{
    instance_hash32, InstanceId, ItemId, ItemInstance, NameTable, ReplicatedEquipmentData,
    SlotEntry, SlotIndex, SyncKind, Version,
};
use proptest::prelude::*;

const ITEM_NAMES: [&str; 6] = [
    "Rifle_AK",
    "Rifle_M4",
    "Pistol_Glock",
    "Grenade_Frag",
    "Medkit",
    "Armor_Vest",
];
const PROPERTY_KEYS: [&str; 4] = ["Durability", "Ammo", "CooldownEnd", "Charges"];

fn item_strategy(max_quantity: u32, max_value: f32) -> impl Strategy<Value = ItemInstance> {
    (
        0..ITEM_NAMES.len(),
        0..=max_quantity,
        any::<[u8; 16]>(),
        -1i32..64,
        any::<bool>(),
        proptest::collection::btree_map(0..PROPERTY_KEYS.len(), -max_value..max_value, 0..4),
    )
        .prop_map(|(name, quantity, instance, anchor, rotated, props)| ItemInstance {
            item_id: ItemId::new(ITEM_NAMES[name]),
            quantity,
            instance_id: InstanceId::from_bytes(instance),
            anchor_index: anchor,
            rotated,
            last_used_time: 0.0,
            properties: props
                .into_iter()
                .map(|(key, value)| (PROPERTY_KEYS[key].to_owned(), value))
                .collect::<BTreeMap<_, _>>(),
        })
}

fn data_strategy(
    max_slot: u16,
    max_quantity: u32,
    max_value: f32,
) -> impl Strategy<Value = ReplicatedEquipmentData> {
    (
        proptest::collection::btree_map(
            0..max_slot,
            proptest::option::weighted(0.8, item_strategy(max_quantity, max_value)),
            0..12,
        ),
        proptest::option::of(0..max_slot),
        1u32..10_000,
        any::<bool>(),
        0.0f32..1000.0,
    )
        .prop_map(|(slots, active, version, delta, timestamp)| ReplicatedEquipmentData {
            kind: if delta {
                SyncKind::Delta {
                    base: Version::new(version - 1),
                }
            } else {
                SyncKind::Full
            },
            slots: slots
                .into_iter()
                .map(|(slot, item)| SlotEntry {
                    slot: SlotIndex::new(slot),
                    item,
                })
                .collect(),
            active_weapon_slot: active.map(SlotIndex::new),
            state_tag: "Equipment.State.Idle".into(),
            version: Version::new(version),
            timestamp,
        })
}

fn names() -> NameTable {
    let mut names = NameTable::with_standard_properties();
    for name in ITEM_NAMES {
        names.register_item(name).unwrap();
    }
    names
}

proptest! {
    #[test]
    fn full_codec_roundtrips_exactly(
        data in data_strategy(u16::MAX, u32::MAX, 1.0e6),
        signed in any::<bool>(),
        compress in any::<bool>(),
    ) {
        let mut codec = PayloadCodec::new(CodecConfig::default());
        codec.set_compression_enabled(compress);
        let codec = if signed { codec.with_signing_key(b"prop".to_vec()) } else { codec };
        let bytes = codec.encode_to_bytes(&data).unwrap();
        prop_assert_eq!(codec.decode_from_bytes(&bytes).unwrap(), data);
    }

    #[test]
    fn packed_codec_is_exact_for_counts_and_close_for_properties(
        data in data_strategy(256, 255, 327.0),
    ) {
        let names = names();
        let bytes = encode_packed(&data, &CodecLimits::default()).unwrap();
        let decoded = decode_packed(&bytes, &names, &CodecLimits::default()).unwrap();

        prop_assert_eq!(decoded.version, data.version);
        prop_assert_eq!(decoded.active_weapon_slot, data.active_weapon_slot);
        prop_assert_eq!(decoded.slots.len(), data.slots.len());
        for (packed, original) in decoded.slots.iter().zip(&data.slots) {
            prop_assert_eq!(packed.slot, original.slot);
            match (&packed.item, &original.item) {
                (None, None) => {}
                (Some(packed), Some(original)) => {
                    prop_assert_eq!(u32::from(packed.quantity), original.quantity);
                    prop_assert_eq!(packed.item_id.as_ref(), Some(&original.item_id));
                    prop_assert_eq!(packed.instance_hash, instance_hash32(&original.instance_id));
                    for (key, value) in &original.properties {
                        let got = packed.property(key).unwrap();
                        prop_assert!((got - value).abs() <= 0.01, "{key}: {got} vs {value}");
                    }
                }
                _ => prop_assert!(false, "slot presence changed"),
            }
        }
    }

    #[test]
    fn decoders_never_panic_on_garbage(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let codec = PayloadCodec::new(CodecConfig::for_testing());
        let _ = codec.decode_from_bytes(&data);
        let _ = decode_packed(&data, &NameTable::new(), &CodecLimits::for_testing());
    }
}
