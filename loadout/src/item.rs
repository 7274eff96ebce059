//! Item instances and runtime property keys.

use std::collections::BTreeMap;

use crate::ids::{InstanceId, ItemId};

/// Well-known runtime property keys.
pub mod props {
    pub const DURABILITY: &str = "Durability";
    pub const AMMO: &str = "Ammo";
    pub const COOLDOWN_END: &str = "CooldownEnd";
    pub const CHARGES: &str = "Charges";

    /// Client-local bookkeeping, never replicated.
    pub const LAST_USED_TIME: &str = "LastUsedTime";
    pub const CLIENT_PREDICTION: &str = "ClientPrediction";
    pub const LOCAL_COOLDOWN: &str = "LocalCooldown";

    /// Keys stripped before replication.
    pub const TRANSIENT: [&str; 3] = [LAST_USED_TIME, CLIENT_PREDICTION, LOCAL_COOLDOWN];

    /// Keys registered by [`NameTable::with_standard_properties`](crate::NameTable::with_standard_properties).
    pub const STANDARD: [&str; 4] = [DURABILITY, AMMO, COOLDOWN_END, CHARGES];
}

/// One concrete item occupying a slot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInstance {
    pub item_id: ItemId,
    pub quantity: u32,
    pub instance_id: InstanceId,
    /// Grid anchor inside a container, `-1` when not placed in a grid.
    pub anchor_index: i32,
    pub rotated: bool,
    pub last_used_time: f32,
    pub properties: BTreeMap<String, f32>,
}

impl ItemInstance {
    /// Creates a single, unplaced instance with a fresh instance id.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>) -> Self {
        Self {
            item_id: item_id.into(),
            quantity: 1,
            instance_id: InstanceId::generate(),
            anchor_index: -1,
            rotated: false,
            last_used_time: 0.0,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: f32) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<f32> {
        self.properties.get(key).copied()
    }

    /// Removes client-local properties. Returns how many were removed.
    pub fn strip_transient(&mut self) -> usize {
        props::TRANSIENT
            .iter()
            .filter(|key| self.properties.remove(**key).is_some())
            .count()
    }
}
