//! Full-path body serialization.
//!
//! Layout (little-endian):
//! `[slot_count:u32][entry...][active_weapon_slot:i32][state_tag:str16][version:u32][timestamp:f32][sync_kind:u8][base_version:u32]`
//!
//! `entry = [slot:u16][present:u8]` followed, when present, by
//! `[item_id:str16][quantity:u32][instance_id:16][anchor:i32][rotated:u8][last_used:f32][prop_count:u16][(key:str16, value:f32)...]`

use std::collections::BTreeMap;

use bytestream::{ByteReader, ByteWriter};
use loadout::{
    InstanceId, ItemId, ItemInstance, ReplicatedEquipmentData, SlotEntry, SlotIndex, SyncKind,
    Version,
};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;

const SYNC_FULL: u8 = 0;
const SYNC_DELTA: u8 = 1;
const NO_ACTIVE_WEAPON: i32 = -1;

/// Serializes a payload body. Round-trips exactly through [`read_body`].
pub fn write_body(data: &ReplicatedEquipmentData, limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    check_limit(LimitKind::Slots, limits.max_slots, data.slots.len())?;

    let mut writer = ByteWriter::with_capacity(64 + data.slots.len() * 48);
    writer.write_u32(data.slots.len() as u32);
    for entry in &data.slots {
        writer.write_u16(entry.slot.raw());
        match &entry.item {
            Some(item) => {
                writer.write_bool(true);
                write_item(&mut writer, item, limits)?;
            }
            None => writer.write_bool(false),
        }
    }

    writer.write_i32(
        data.active_weapon_slot
            .map_or(NO_ACTIVE_WEAPON, |slot| i32::from(slot.raw())),
    );
    write_string(&mut writer, &data.state_tag, limits)?;
    writer.write_u32(data.version.raw());
    writer.write_f32(data.timestamp);
    match data.kind {
        SyncKind::Full => {
            writer.write_u8(SYNC_FULL);
            writer.write_u32(0);
        }
        SyncKind::Delta { base } => {
            writer.write_u8(SYNC_DELTA);
            writer.write_u32(base.raw());
        }
    }
    Ok(writer.finish())
}

/// Parses a body produced by [`write_body`], rejecting trailing bytes.
pub fn read_body(bytes: &[u8], limits: &CodecLimits) -> CodecResult<ReplicatedEquipmentData> {
    let mut reader = ByteReader::new(bytes);

    let slot_count = reader.read_u32()? as usize;
    check_limit(LimitKind::Slots, limits.max_slots, slot_count)?;
    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        let slot = SlotIndex::new(reader.read_u16()?);
        let item = if reader.read_bool()? {
            Some(read_item(&mut reader, limits)?)
        } else {
            None
        };
        slots.push(SlotEntry { slot, item });
    }

    let active_raw = reader.read_i32()?;
    let active_weapon_slot = match active_raw {
        NO_ACTIVE_WEAPON => None,
        raw => Some(SlotIndex::new(u16::try_from(raw).map_err(|_| {
            CodecError::ValueOutOfRange {
                field: "active_weapon_slot",
                value: i64::from(raw),
            }
        })?)),
    };
    let state_tag = read_string(&mut reader, limits)?;
    let version = Version::new(reader.read_u32()?);
    let timestamp = reader.read_f32()?;
    let kind = match reader.read_u8()? {
        SYNC_FULL => {
            reader.read_u32()?;
            SyncKind::Full
        }
        SYNC_DELTA => SyncKind::Delta {
            base: Version::new(reader.read_u32()?),
        },
        found => return Err(CodecError::InvalidSyncKind { found }),
    };

    if !reader.is_empty() {
        return Err(CodecError::TrailingData {
            remaining: reader.remaining(),
        });
    }

    Ok(ReplicatedEquipmentData {
        kind,
        slots,
        active_weapon_slot,
        state_tag,
        version,
        timestamp,
    })
}

fn write_item(writer: &mut ByteWriter, item: &ItemInstance, limits: &CodecLimits) -> CodecResult<()> {
    check_limit(
        LimitKind::PropertiesPerItem,
        limits.max_properties_per_item,
        item.properties.len(),
    )?;
    write_string(writer, item.item_id.as_str(), limits)?;
    writer.write_u32(item.quantity);
    writer.write_bytes(item.instance_id.as_bytes());
    writer.write_i32(item.anchor_index);
    writer.write_bool(item.rotated);
    writer.write_f32(item.last_used_time);
    writer.write_u16(item.properties.len() as u16);
    for (key, value) in &item.properties {
        write_string(writer, key, limits)?;
        writer.write_f32(*value);
    }
    Ok(())
}

fn read_item(reader: &mut ByteReader<'_>, limits: &CodecLimits) -> CodecResult<ItemInstance> {
    let item_id = ItemId::new(read_string(reader, limits)?);
    let quantity = reader.read_u32()?;
    let instance_id = InstanceId::from_bytes(reader.read_array::<16>()?);
    let anchor_index = reader.read_i32()?;
    let rotated = reader.read_bool()?;
    let last_used_time = reader.read_f32()?;
    let prop_count = reader.read_u16()? as usize;
    check_limit(
        LimitKind::PropertiesPerItem,
        limits.max_properties_per_item,
        prop_count,
    )?;
    let mut properties = BTreeMap::new();
    for _ in 0..prop_count {
        let key = read_string(reader, limits)?;
        let value = reader.read_f32()?;
        properties.insert(key, value);
    }
    Ok(ItemInstance {
        item_id,
        quantity,
        instance_id,
        anchor_index,
        rotated,
        last_used_time,
        properties,
    })
}

fn write_string(writer: &mut ByteWriter, value: &str, limits: &CodecLimits) -> CodecResult<()> {
    check_limit(LimitKind::StringBytes, limits.max_string_bytes, value.len())?;
    writer.write_str16(value)?;
    Ok(())
}

fn read_string(reader: &mut ByteReader<'_>, limits: &CodecLimits) -> CodecResult<String> {
    let value = reader.read_str16()?;
    check_limit(LimitKind::StringBytes, limits.max_string_bytes, value.len())?;
    Ok(value.to_owned())
}

pub(crate) fn check_limit(kind: LimitKind, limit: usize, actual: usize) -> CodecResult<()> {
    if actual > limit {
        return Err(CodecError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}
