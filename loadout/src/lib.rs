//! Equipment data model for gearsync.
//!
//! This crate defines what is replicated:
//! - Slot, version, item and instance identifiers
//! - Item instances with runtime properties
//! - The replicated payload (full snapshot or delta)
//! - A materialized receiver-side state that payloads apply to
//! - Deterministic identifier hashing and name tables for the packed codec
//!
//! # Design Principles
//!
//! - **Engine-agnostic** - No knowledge of actors, components or item tables.
//! - **Explicit absence** - An empty slot is `None`, never a sentinel item.
//! - **Deterministic hashing** - Hashes are stable across processes and platforms.

mod data;
mod error;
mod hash;
mod ids;
mod item;
mod names;
mod state;

pub use data::{strip_transient_properties, ReplicatedEquipmentData, SlotEntry, SyncKind};
pub use error::{LoadoutError, LoadoutResult};
pub use hash::{instance_hash32, item_id_hash16, property_key_hash16};
pub use ids::{InstanceId, ItemId, SlotIndex, Version};
pub use item::{props, ItemInstance};
pub use names::NameTable;
pub use state::{ApplyOutcome, EquipmentState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn public_api_exports() {
        let _ = SlotIndex::new(0);
        let _ = Version::ZERO;
        let _ = ItemInstance::new("Medkit");
        let _ = ReplicatedEquipmentData::default();
        let _ = EquipmentState::new(1);
        let _ = NameTable::new();
        let _ = item_id_hash16("Medkit");
        let _: LoadoutResult<()> = Ok(());
    }

    #[test]
    fn identifier_sizes() {
        assert_eq!(size_of::<SlotIndex>(), 2);
        assert_eq!(size_of::<Version>(), 4);
        assert_eq!(size_of::<InstanceId>(), 16);
    }
}
