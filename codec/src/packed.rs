//! Packed lossy codec for frequent small updates.
//!
//! Layout (little-endian):
//! `[version:u32][active_weapon_slot:i16][entry_count:u16][entry...]`
//! with
//! `entry = [item_hash:u16][quantity:u8][slot:u8][instance_hash:u32][prop_count:u16][(key_hash:u16, scaled:i16)...]`
//!
//! Identifiers are hashed and property values are scaled by 100 into `i16`,
//! so this path is for live sync only, never archival.

use bytestream::{ByteReader, ByteWriter};
use loadout::{
    instance_hash32, item_id_hash16, property_key_hash16, ItemId, NameTable,
    ReplicatedEquipmentData, SlotIndex, Version,
};

use crate::body::check_limit;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;

/// Fixed-point scale for property values.
pub const PROPERTY_SCALE: f32 = 100.0;

const EMPTY_ITEM_HASH: u16 = 0;
const NO_ACTIVE_WEAPON: i16 = -1;
const MAX_SCALED: f32 = i16::MAX as f32;

/// A decoded packed payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedEquipmentData {
    pub version: Version,
    pub active_weapon_slot: Option<SlotIndex>,
    pub slots: Vec<PackedSlot>,
}

/// One slot of a packed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSlot {
    pub slot: SlotIndex,
    /// `None` when the slot was cleared.
    pub item: Option<PackedItem>,
}

/// An item as seen through the packed codec.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedItem {
    pub item_hash: u16,
    /// Resolved through the [`NameTable`]; `None` if the hash is unknown.
    pub item_id: Option<ItemId>,
    pub quantity: u8,
    pub instance_hash: u32,
    pub properties: Vec<PackedProperty>,
}

/// A runtime property recovered within ±0.01.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedProperty {
    pub key_hash: u16,
    /// Resolved through the [`NameTable`]; `None` if the hash is unknown.
    pub key: Option<String>,
    pub value: f32,
}

impl PackedItem {
    #[must_use]
    pub fn property(&self, key: &str) -> Option<f32> {
        let hash = property_key_hash16(key);
        self.properties
            .iter()
            .find(|prop| prop.key_hash == hash)
            .map(|prop| prop.value)
    }
}

/// Encodes `data` in the packed layout.
///
/// Quantity and slot index must fit in a byte; out-of-range values are
/// rejected rather than truncated.
pub fn encode_packed(data: &ReplicatedEquipmentData, limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    check_limit(LimitKind::Slots, limits.max_slots, data.slots.len())?;
    let entry_count = narrow::<u16>("entry_count", data.slots.len() as i64)?;
    let active = match data.active_weapon_slot {
        Some(slot) => narrow::<i16>("active_weapon_slot", i64::from(slot.raw()))?,
        None => NO_ACTIVE_WEAPON,
    };

    let mut writer = ByteWriter::with_capacity(8 + data.slots.len() * 16);
    writer.write_u32(data.version.raw());
    writer.write_i16(active);
    writer.write_u16(entry_count);

    for entry in &data.slots {
        let slot = narrow::<u8>("slot_index", i64::from(entry.slot.raw()))?;
        let Some(item) = &entry.item else {
            writer.write_u16(EMPTY_ITEM_HASH);
            writer.write_u8(0);
            writer.write_u8(slot);
            writer.write_u32(0);
            writer.write_u16(0);
            continue;
        };

        check_limit(
            LimitKind::PropertiesPerItem,
            limits.max_properties_per_item,
            item.properties.len(),
        )?;
        writer.write_u16(item_id_hash16(item.item_id.as_str()));
        writer.write_u8(narrow::<u8>("quantity", i64::from(item.quantity))?);
        writer.write_u8(slot);
        writer.write_u32(instance_hash32(&item.instance_id));
        writer.write_u16(item.properties.len() as u16);
        for (key, value) in &item.properties {
            writer.write_u16(property_key_hash16(key));
            writer.write_i16(scale(*value));
        }
    }
    Ok(writer.finish())
}

/// Decodes a packed payload, resolving hashes through `names`.
pub fn decode_packed(
    bytes: &[u8],
    names: &NameTable,
    limits: &CodecLimits,
) -> CodecResult<PackedEquipmentData> {
    let mut reader = ByteReader::new(bytes);
    let version = Version::new(reader.read_u32()?);
    let active_weapon_slot = match reader.read_i16()? {
        NO_ACTIVE_WEAPON => None,
        raw => Some(SlotIndex::new(narrow::<u16>(
            "active_weapon_slot",
            i64::from(raw),
        )?)),
    };
    let entry_count = reader.read_u16()? as usize;
    check_limit(LimitKind::Slots, limits.max_slots, entry_count)?;

    let mut slots = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let item_hash = reader.read_u16()?;
        let quantity = reader.read_u8()?;
        let slot = SlotIndex::new(u16::from(reader.read_u8()?));
        let instance_hash = reader.read_u32()?;
        let prop_count = reader.read_u16()? as usize;
        check_limit(
            LimitKind::PropertiesPerItem,
            limits.max_properties_per_item,
            prop_count,
        )?;

        let mut properties = Vec::with_capacity(prop_count);
        for _ in 0..prop_count {
            let key_hash = reader.read_u16()?;
            let value = unscale(reader.read_i16()?);
            properties.push(PackedProperty {
                key_hash,
                key: names.property_name(key_hash).map(str::to_owned),
                value,
            });
        }

        let item = (item_hash != EMPTY_ITEM_HASH).then(|| PackedItem {
            item_hash,
            item_id: names.item_name(item_hash).map(ItemId::from),
            quantity,
            instance_hash,
            properties,
        });
        slots.push(PackedSlot { slot, item });
    }

    if !reader.is_empty() {
        return Err(CodecError::TrailingData {
            remaining: reader.remaining(),
        });
    }

    Ok(PackedEquipmentData {
        version,
        active_weapon_slot,
        slots,
    })
}

fn scale(value: f32) -> i16 {
    // `as` maps NaN to 0 and the clamp keeps the range symmetric.
    (value * PROPERTY_SCALE).round().clamp(-MAX_SCALED, MAX_SCALED) as i16
}

fn unscale(scaled: i16) -> f32 {
    f32::from(scaled) / PROPERTY_SCALE
}

fn narrow<T: TryFrom<i64>>(field: &'static str, value: i64) -> CodecResult<T> {
    T::try_from(value).map_err(|_| CodecError::ValueOutOfRange { field, value })
}
