use std::hint::black_box;

use codec::{decode_packed, encode_packed, CodecConfig, CodecLimits, PayloadCodec};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use loadout::{props, ItemInstance, NameTable, ReplicatedEquipmentData, SlotEntry, SlotIndex, Version};

fn loadout(slot_count: u16) -> ReplicatedEquipmentData {
    let mut data = ReplicatedEquipmentData::full(Version::new(100), 12.0);
    for slot in 0..slot_count {
        data.slots.push(SlotEntry::occupied(
            SlotIndex::new(slot),
            ItemInstance::new(format!("Item_{}", slot % 8))
                .with_quantity(1)
                .with_property(props::DURABILITY, 0.8)
                .with_property(props::AMMO, 30.0),
        ));
    }
    data.active_weapon_slot = Some(SlotIndex::new(0));
    data.state_tag = "Equipment.State.Combat".into();
    data
}

fn bench_full_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_codec");
    for slot_count in [4u16, 16, 64] {
        let data = loadout(slot_count);
        let codec = PayloadCodec::new(CodecConfig::default()).with_signing_key(b"bench".to_vec());
        let bytes = codec.encode_to_bytes(&data).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", slot_count), &data, |b, data| {
            b.iter(|| codec.encode_to_bytes(black_box(data)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", slot_count), &bytes, |b, bytes| {
            b.iter(|| codec.decode_from_bytes(black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

fn bench_packed_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("packed_codec");
    let names = NameTable::with_standard_properties();
    let limits = CodecLimits::default();
    for slot_count in [4u16, 16, 64] {
        let data = loadout(slot_count);
        let bytes = encode_packed(&data, &limits).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", slot_count), &data, |b, data| {
            b.iter(|| encode_packed(black_box(data), &limits).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", slot_count), &bytes, |b, bytes| {
            b.iter(|| decode_packed(black_box(bytes), &names, &limits).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_codec, bench_packed_codec);
criterion_main!(benches);
