//! Per-slot and per-viewer replication bookkeeping.

use std::collections::BTreeSet;

use loadout::{ItemInstance, SlotIndex, Version};

use crate::relevancy::ViewerContext;

/// Replication record for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotState {
    pub slot: SlotIndex,
    /// Value as of the last committed replication.
    pub last_replicated_item: Option<ItemInstance>,
    pub last_replicated_version: Version,
    /// Set on change, cleared when the change is committed by a tick.
    pub is_dirty: bool,
    pub priority: f32,
    pub last_change_time: f32,
    pub change_count: u32,
}

impl SlotState {
    #[must_use]
    pub const fn new(slot: SlotIndex) -> Self {
        Self {
            slot,
            last_replicated_item: None,
            last_replicated_version: Version::ZERO,
            is_dirty: false,
            priority: 1.0,
            last_change_time: 0.0,
            change_count: 0,
        }
    }

    /// Records a change at `now`.
    pub fn mark_changed(&mut self, now: f32) {
        self.is_dirty = true;
        self.change_count = self.change_count.saturating_add(1);
        self.last_change_time = now;
    }

    /// Recomputes the replication priority.
    ///
    /// Weapon slots count double, dirty slots triple, frequently changing
    /// slots half again, and the active weapon slot five times.
    pub fn update_priority(&mut self, is_weapon_slot: bool, is_active_weapon: bool) {
        let mut priority = 1.0;
        if is_weapon_slot {
            priority *= 2.0;
        }
        if self.is_dirty {
            priority *= 3.0;
        }
        if self.change_count > 5 {
            priority *= 1.5;
        }
        if is_active_weapon {
            priority *= 5.0;
        }
        self.priority = priority;
    }

    /// Commits the current value as replicated.
    pub fn commit(&mut self, item: Option<ItemInstance>, version: Version) {
        self.last_replicated_item = item;
        self.last_replicated_version = version;
        self.is_dirty = false;
    }
}

/// Replication cursor for one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReplicationState {
    pub viewer: ViewerContext,
    /// Newest version the viewer confirmed. Zero means never.
    pub last_acknowledged_version: Version,
    /// Newest version sent to the viewer.
    pub last_sent_version: Version,
    pub consecutive_delta_count: u32,
    /// Estimate in `[0, 1]`, 1 is perfect.
    pub connection_quality: f32,
    pub last_update_time: Option<f32>,
    /// Slots committed since the last payload to this viewer.
    pub pending_slots: BTreeSet<SlotIndex>,
    pub packets_lost: u32,
    /// Set after reported loss; the next payload is a full snapshot.
    pub needs_full: bool,
}

impl ClientReplicationState {
    /// Latency at which quality reaches zero.
    pub const ZERO_QUALITY_LATENCY: f32 = 0.5;

    #[must_use]
    pub fn new(viewer: ViewerContext) -> Self {
        Self {
            viewer,
            last_acknowledged_version: Version::ZERO,
            last_sent_version: Version::ZERO,
            consecutive_delta_count: 0,
            connection_quality: 1.0,
            last_update_time: None,
            pending_slots: BTreeSet::new(),
            packets_lost: 0,
            needs_full: false,
        }
    }

    /// Advances the acknowledged version; older acks are ignored.
    pub fn acknowledge(&mut self, version: Version) -> bool {
        if version <= self.last_acknowledged_version || version > self.last_sent_version {
            return false;
        }
        self.last_acknowledged_version = version;
        true
    }

    /// Updates the quality estimate from a round-trip latency in seconds.
    pub fn update_latency(&mut self, latency_secs: f32) {
        self.connection_quality = (1.0 - latency_secs / Self::ZERO_QUALITY_LATENCY).clamp(0.0, 1.0);
    }

    /// Whether the next payload must be a full snapshot.
    #[must_use]
    pub fn requires_full(&self, current: Version, max_deltas: u32, force_full: bool) -> bool {
        force_full
            || self.needs_full
            || self.last_acknowledged_version.is_zero()
            || current.gap_since(self.last_acknowledged_version) > max_deltas
            || self.consecutive_delta_count >= max_deltas
    }

    /// Whether the viewer's own interval has elapsed at `now`.
    ///
    /// Poor connections are updated up to half as often.
    #[must_use]
    pub fn is_due(&self, now: f32, base_interval: f32) -> bool {
        let interval = base_interval / (0.5 + 0.5 * self.connection_quality);
        self.last_update_time
            .map_or(true, |last| now - last >= interval)
    }

    /// Records a payload sent at `now`.
    pub fn record_send(&mut self, version: Version, full: bool, now: f32) {
        self.last_sent_version = version;
        self.last_update_time = Some(now);
        self.pending_slots.clear();
        if full {
            self.consecutive_delta_count = 0;
            self.needs_full = false;
        } else {
            self.consecutive_delta_count = self.consecutive_delta_count.saturating_add(1);
        }
    }
}
