use std::sync::Arc;

use codec::{CodecConfig, PayloadCodec};
use loadout::{ApplyOutcome, EquipmentState, ItemInstance, SlotIndex, SyncKind, Version};
use parking_lot::RwLock;
use proptest::prelude::*;
use repgraph::{
    apply_replicated_data, ReplicationConfig, ReplicationCoordinator, Vec3, ViewerContext,
    ViewerId,
};

const SLOTS: usize = 6;
const VIEWER: ViewerId = ViewerId(7);

fn server() -> ReplicationCoordinator<RwLock<EquipmentState>> {
    ReplicationCoordinator::new(
        Arc::new(RwLock::new(EquipmentState::new(SLOTS))),
        ReplicationConfig::for_testing(),
        Some(b"flow-key".to_vec()),
    )
}

fn client_codec() -> PayloadCodec {
    PayloadCodec::new(CodecConfig::for_testing()).with_signing_key(b"flow-key".to_vec())
}

fn set(server: &ReplicationCoordinator<RwLock<EquipmentState>>, slot: u16, item: Option<ItemInstance>) {
    server
        .source()
        .write()
        .set_slot(SlotIndex::new(slot), item)
        .unwrap();
    server.mark_dirty(SlotIndex::new(slot), false);
}

fn assert_mirrors(server: &ReplicationCoordinator<RwLock<EquipmentState>>, client: &EquipmentState) {
    let authoritative = server.source().read();
    for index in 0..SLOTS {
        let slot = SlotIndex::new(index as u16);
        assert_eq!(client.slot(slot), authoritative.slot(slot), "slot {index}");
    }
    assert_eq!(client.active_weapon_slot, authoritative.active_weapon_slot);
}

#[test]
fn concurrent_mark_dirty_on_disjoint_slots() {
    const THREADS: u16 = 4;
    const MARKS_PER_THREAD: u32 = 8;

    let config = ReplicationConfig {
        max_deltas_before_full: 64,
        history_capacity: 64,
        ..ReplicationConfig::for_testing()
    };
    let server = ReplicationCoordinator::new(
        Arc::new(RwLock::new(EquipmentState::new(8))),
        config,
        None,
    );
    server.mark_dirty(SlotIndex::new(7), false);
    let base = server.current_version();

    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let server = &server;
            scope.spawn(move || {
                for _ in 0..MARKS_PER_THREAD {
                    server.mark_dirty(SlotIndex::new(thread), false);
                }
            });
        }
    });

    assert_eq!(
        server.current_version(),
        Version::new(1 + u32::from(THREADS) * MARKS_PER_THREAD)
    );
    let delta = server.get_delta(base);
    assert_eq!(delta.kind, SyncKind::Delta { base });
    let slots: Vec<u16> = delta.slots.iter().map(|entry| entry.slot.raw()).collect();
    assert_eq!(slots, (0..THREADS).collect::<Vec<_>>());
}

#[test]
fn server_to_client_over_bytes() {
    let server = server();
    let codec = client_codec();
    let mut client = EquipmentState::new(SLOTS);
    server.upsert_viewer(ViewerContext::new(VIEWER, Vec3::ZERO));

    set(&server, 0, Some(ItemInstance::new("rifle").with_property("Ammo", 30.0)));
    set(&server, 2, Some(ItemInstance::new("medkit").with_quantity(3)));
    server.source().write().active_weapon_slot = Some(SlotIndex::new(0));
    server.mark_dirty(SlotIndex::new(0), false);

    let mut now = 0.0;
    for step in 0..5u16 {
        for payload in server.tick(now) {
            let data = codec.decode_from_bytes(&payload.bytes).unwrap();
            assert_eq!(client.apply(&data).unwrap(), ApplyOutcome::Applied);
            assert!(server.acknowledge(payload.viewer, payload.version));
        }
        assert_mirrors(&server, &client);

        set(&server, step % 3, Some(ItemInstance::new("ore").with_quantity(u32::from(step) + 1)));
        set(&server, 2, None);
        now += 0.5;
    }

    let stats = server.statistics();
    assert!(stats.full_replications >= 1);
    assert!(stats.delta_replications >= 1);
    assert!(stats.bytes_sent > 0);
}

#[test]
fn lagging_client_receives_full_snapshot() {
    let server = server();
    server.upsert_viewer(ViewerContext::new(VIEWER, Vec3::ZERO));
    set(&server, 0, Some(ItemInstance::new("rifle")));
    let first = server.tick(0.0);
    assert!(server.acknowledge(VIEWER, first[0].version));

    for round in 0..50u32 {
        set(&server, 1, Some(ItemInstance::new("ore").with_quantity(round + 1)));
    }

    let sent = server.tick(1.0);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, SyncKind::Full);
    assert_eq!(sent[0].version, Version::new(51));
}

#[test]
fn sink_applies_decoded_delta() {
    let server = server();
    set(&server, 1, Some(ItemInstance::new("pistol")));
    let base = server.current_version();
    let mut client = EquipmentState::new(SLOTS);
    apply_replicated_data(&mut client, &server.get_full_snapshot());

    set(&server, 1, None);
    set(&server, 4, Some(ItemInstance::new("shield")));
    let delta = server.get_delta(base);
    assert_eq!(apply_replicated_data(&mut client, &delta), 2);
    assert_mirrors(&server, &client);
}

#[derive(Debug, Clone)]
enum Change {
    Equip(u16, u32),
    Clear(u16),
}

fn change() -> impl Strategy<Value = Change> {
    prop_oneof![
        (0..SLOTS as u16, 1u32..100).prop_map(|(slot, qty)| Change::Equip(slot, qty)),
        (0..SLOTS as u16).prop_map(Change::Clear),
    ]
}

proptest! {
    #[test]
    fn snapshot_plus_delta_matches_latest_snapshot(
        before in prop::collection::vec(change(), 0..8),
        after in prop::collection::vec(change(), 0..16),
    ) {
        let server = server();
        let apply_change = |change: &Change| match *change {
            Change::Equip(slot, qty) => {
                set(&server, slot, Some(ItemInstance::new("crate").with_quantity(qty)));
            }
            Change::Clear(slot) => set(&server, slot, None),
        };

        before.iter().for_each(apply_change);
        let base = server.current_version();
        let mut client = EquipmentState::new(SLOTS);
        client.apply(&server.get_full_snapshot()).unwrap();

        after.iter().for_each(apply_change);
        let delta = server.get_delta(base);
        client.apply(&delta).unwrap();

        let mut expected = EquipmentState::new(SLOTS);
        expected.apply(&server.get_full_snapshot()).unwrap();
        prop_assert_eq!(client, expected);
    }
}
