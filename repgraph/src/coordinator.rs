//! Authoritative-side replication coordinator.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use codec::{CodecResult, DeltaMask, PayloadCodec, VersionHistory};
use loadout::{
    strip_transient_properties, ReplicatedEquipmentData, SlotEntry, SlotIndex, SyncKind, Version,
};
use parking_lot::Mutex;

use crate::config::ReplicationConfig;
use crate::events::ReplicationEvent;
use crate::policy::{PolicyInput, ReplicationPolicy, ViewerFilter};
use crate::relevancy::{OwnerContext, RelevancyEstimator, ViewerContext, ViewerId};
use crate::source::EquipmentSource;
use crate::state::{ClientReplicationState, SlotState};
use crate::stats::ReplicationStats;

/// Priority base for the owner's own connection.
const OWNER_PRIORITY: f32 = 10.0;
const FORCE_FULL_WEIGHT: f32 = 5.0;
const DIRTY_WEIGHT_PER_PRIORITY: f32 = 0.2;
const MIN_RELEVANCY_WEIGHT: f32 = 0.1;

/// Encoded bytes for one viewer, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundPayload {
    pub viewer: ViewerId,
    pub version: Version,
    pub kind: SyncKind,
    pub bytes: Vec<u8>,
    pub priority: f32,
}

/// Mutable tuning shared by all viewers.
#[derive(Debug)]
struct Settings {
    policy: ReplicationPolicy,
    filter: Option<ViewerFilter>,
    owner: Option<OwnerContext>,
    estimator: RelevancyEstimator,
    update_interval: f32,
    max_deltas: u32,
    network_quality: f32,
    last_tick: Option<f32>,
}

/// Version counter, per-version history and the pending change set.
#[derive(Debug)]
struct VersionLog {
    current: Version,
    history: VersionHistory,
    pending: DeltaMask,
    force_full: bool,
    /// Time of the latest tick, stamped onto new versions.
    clock: f32,
    version_time: f32,
}

impl VersionLog {
    fn bump(&mut self, slots: &[SlotIndex]) -> Version {
        let version = self.current.next();
        if let Err(err) = self.history.record(version, slots.iter().copied()) {
            log::error!("version history rejected {version}: {err}");
        }
        self.current = version;
        self.pending.end_version = version;
        for slot in slots {
            self.pending.add_slot(*slot);
        }
        self.version_time = self.clock;
        version
    }
}

enum DeltaPlan {
    Empty,
    Full,
    Delta(DeltaMask),
}

struct Encoded {
    bytes: Vec<u8>,
    original: usize,
    saved: usize,
}

/// The single source of truth for what each viewer must be told.
///
/// All methods take `&self`. Each logical table sits behind its own lock and
/// no two locks are ever held at the same time.
pub struct ReplicationCoordinator<S> {
    source: Arc<S>,
    config: ReplicationConfig,
    slot_count: usize,
    codec: Mutex<PayloadCodec>,
    settings: Mutex<Settings>,
    slots: Mutex<Vec<SlotState>>,
    versions: Mutex<VersionLog>,
    clients: Mutex<HashMap<ViewerId, ClientReplicationState>>,
    stats: Mutex<ReplicationStats>,
    events: Mutex<Vec<ReplicationEvent>>,
}

impl<S> std::fmt::Debug for ReplicationCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationCoordinator")
            .field("slot_count", &self.slot_count)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: EquipmentSource> ReplicationCoordinator<S> {
    /// Creates a coordinator over `source`.
    ///
    /// The slot table is sized from the source, capped at
    /// `config.max_slots`.
    pub fn new(source: Arc<S>, config: ReplicationConfig, signing_key: Option<Vec<u8>>) -> Self {
        let slot_count = source.slot_count().min(config.max_slots);
        let mut codec = PayloadCodec::new(config.codec.clone());
        if let Some(key) = signing_key {
            codec = codec.with_signing_key(key);
        }
        let history_capacity =
            NonZeroUsize::new(config.history_capacity).unwrap_or(NonZeroUsize::MIN);

        let settings = Settings {
            policy: config.policy,
            filter: None,
            owner: None,
            estimator: RelevancyEstimator::new(config.relevancy.clone()),
            update_interval: config.min_update_interval,
            max_deltas: config.max_deltas_before_full,
            network_quality: 1.0,
            last_tick: None,
        };
        let versions = VersionLog {
            current: Version::ZERO,
            history: VersionHistory::new(history_capacity),
            pending: DeltaMask::default(),
            force_full: false,
            clock: 0.0,
            version_time: 0.0,
        };

        log::debug!(
            "replication coordinator created: {slot_count} slots, history {history_capacity}, signed {}",
            codec.is_signing()
        );

        Self {
            source,
            slot_count,
            codec: Mutex::new(codec),
            settings: Mutex::new(settings),
            slots: Mutex::new(
                (0..slot_count)
                    .map(|index| SlotState::new(SlotIndex::new(index as u16)))
                    .collect(),
            ),
            versions: Mutex::new(versions),
            clients: Mutex::new(HashMap::new()),
            stats: Mutex::new(ReplicationStats::default()),
            events: Mutex::new(Vec::new()),
            config,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    #[must_use]
    pub fn current_version(&self) -> Version {
        self.versions.lock().current
    }

    #[must_use]
    pub fn is_full_replication_pending(&self) -> bool {
        self.versions.lock().force_full
    }

    /// Flags a slot as changed and bumps the version.
    ///
    /// Out-of-range slots are logged and ignored. With `force_full` the next
    /// pass sends full snapshots to every viewer.
    pub fn mark_dirty(&self, slot: SlotIndex, force_full: bool) {
        if slot.as_usize() >= self.slot_count {
            log::warn!(
                "ignoring change to invalid slot {slot} (slot count {})",
                self.slot_count
            );
            self.stats.lock().ignored_invalid_slots += 1;
            return;
        }

        let is_weapon = self.source.is_weapon_slot(slot);
        let is_active = self.source.active_weapon_slot() == Some(slot);

        let (version, now) = {
            let mut versions = self.versions.lock();
            let version = versions.bump(&[slot]);
            versions.force_full |= force_full;
            (version, versions.clock)
        };

        {
            let mut slots = self.slots.lock();
            let state = &mut slots[slot.as_usize()];
            state.mark_changed(now);
            state.update_priority(is_weapon, is_active);
        }

        log::trace!("slot {slot} dirty at {version} (force_full {force_full})");
    }

    /// Marks every slot dirty and forces full snapshots on the next pass.
    pub fn force_full_replication(&self) {
        let all: Vec<SlotIndex> = (0..self.slot_count)
            .map(|index| SlotIndex::new(index as u16))
            .collect();
        let flags: Vec<(bool, bool)> = {
            let active = self.source.active_weapon_slot();
            all.iter()
                .map(|slot| (self.source.is_weapon_slot(*slot), active == Some(*slot)))
                .collect()
        };

        let (version, now) = {
            let mut versions = self.versions.lock();
            let version = versions.bump(&all);
            versions.force_full = true;
            (version, versions.clock)
        };

        {
            let mut slots = self.slots.lock();
            for (state, (is_weapon, is_active)) in slots.iter_mut().zip(flags) {
                state.mark_changed(now);
                state.update_priority(is_weapon, is_active);
            }
        }

        log::debug!("full replication forced at {version}");
    }

    /// Assembles a full snapshot of the non-empty slots.
    ///
    /// Without an intervening mutation, repeated calls return identical data.
    #[must_use]
    pub fn get_full_snapshot(&self) -> ReplicatedEquipmentData {
        let (version, timestamp) = {
            let versions = self.versions.lock();
            (versions.current, versions.version_time)
        };

        let mut data = ReplicatedEquipmentData::full(version, timestamp);
        for index in 0..self.slot_count {
            let slot = SlotIndex::new(index as u16);
            if let Some(item) = self.source.slot_item(slot) {
                data.slots.push(SlotEntry::occupied(slot, item));
            }
        }
        self.fill_common(&mut data);
        data
    }

    /// Returns what changed since `since`.
    ///
    /// Degrades to a full snapshot when full replication is pending, `since`
    /// is in the future, the gap exceeds the delta ceiling, or the range is no
    /// longer retained. Never fails.
    #[must_use]
    pub fn get_delta(&self, since: Version) -> ReplicatedEquipmentData {
        let max_deltas = self.settings.lock().max_deltas;
        let (plan, version, timestamp) = {
            let versions = self.versions.lock();
            let plan = if since == versions.current {
                DeltaPlan::Empty
            } else if versions.force_full
                || since > versions.current
                || versions.current.gap_since(since) > max_deltas
            {
                DeltaPlan::Full
            } else {
                versions
                    .history
                    .mask_between(since, versions.current)
                    .map_or(DeltaPlan::Full, DeltaPlan::Delta)
            };
            (plan, versions.current, versions.version_time)
        };

        let mask = match plan {
            DeltaPlan::Full => {
                log::debug!("delta since {since} degraded to full snapshot at {version}");
                return self.get_full_snapshot();
            }
            DeltaPlan::Empty => DeltaMask::default(),
            DeltaPlan::Delta(mask) => mask,
        };

        let mut data = ReplicatedEquipmentData::delta(since, version, timestamp);
        for slot in mask.iter().filter(|slot| slot.as_usize() < self.slot_count) {
            data.slots.push(SlotEntry {
                slot,
                item: self.source.slot_item(slot),
            });
        }
        self.fill_common(&mut data);
        data
    }

    /// Whether `viewer` receives this owner's state under the current policy.
    #[must_use]
    pub fn should_replicate_to(&self, viewer: ViewerId) -> bool {
        self.get_priority(viewer).0
    }

    /// Policy decision and send priority for `viewer`.
    ///
    /// The priority is the base (10 for the owner, 1 otherwise) times the
    /// dirty weight times the relevancy score (floored at 0.1).
    #[must_use]
    pub fn get_priority(&self, viewer: ViewerId) -> (bool, f32) {
        let Some(viewer) = self.clients.lock().get(&viewer).map(|cursor| cursor.viewer) else {
            return (false, 0.0);
        };
        let (policy, filter, owner, estimator, quality) = {
            let settings = self.settings.lock();
            (
                settings.policy,
                settings.filter.clone(),
                settings.owner,
                settings.estimator.clone(),
                settings.network_quality,
            )
        };
        let owner = owner.map(|mut owner| {
            owner.weapon_active = self.source.active_weapon_slot().is_some();
            owner
        });
        let is_owner = owner.is_some_and(|owner| owner.is_owner(viewer.id));

        let relevancy = match &owner {
            Some(owner) if self.config.enhanced_relevancy => {
                estimator.score(&viewer, owner, quality)
            }
            _ => 1.0,
        };
        let allowed = policy.allows(&PolicyInput {
            viewer: &viewer,
            owner: owner.as_ref(),
            relevant: estimator.is_relevant(relevancy),
            filter: filter.as_ref(),
        });
        if !allowed {
            return (false, 0.0);
        }

        let base = if is_owner { OWNER_PRIORITY } else { 1.0 };
        let priority = base * self.dirty_weight() * relevancy.max(MIN_RELEVANCY_WEIGHT);
        (true, priority)
    }

    /// `1 + 0.2 * sum(max(1, priority))` over dirty slots, times 5 while a
    /// full replication is pending.
    #[must_use]
    pub fn dirty_weight(&self) -> f32 {
        let dirty_sum: f32 = self
            .slots
            .lock()
            .iter()
            .filter(|state| state.is_dirty)
            .map(|state| state.priority.max(1.0))
            .sum();
        let force_full = self.versions.lock().force_full;
        let weight = 1.0 + DIRTY_WEIGHT_PER_PRIORITY * dirty_sum;
        if force_full {
            weight * FORCE_FULL_WEIGHT
        } else {
            weight
        }
    }

    pub fn set_policy(&self, policy: ReplicationPolicy) {
        self.settings.lock().policy = policy;
        log::info!("replication policy set to {policy:?}");
    }

    /// Installs the predicate used by [`ReplicationPolicy::Custom`].
    pub fn set_custom_filter(&self, filter: ViewerFilter) {
        self.settings.lock().filter = Some(filter);
    }

    pub fn set_owner(&self, owner: OwnerContext) {
        self.settings.lock().owner = Some(owner);
    }

    /// Adds a viewer or refreshes its context, keeping its cursor.
    pub fn upsert_viewer(&self, viewer: ViewerContext) {
        let mut clients = self.clients.lock();
        match clients.get_mut(&viewer.id) {
            Some(cursor) => cursor.viewer = viewer,
            None => {
                log::debug!("tracking viewer {:?}", viewer.id);
                clients.insert(viewer.id, ClientReplicationState::new(viewer));
            }
        }
    }

    pub fn remove_viewer(&self, viewer: ViewerId) -> bool {
        let removed = self.clients.lock().remove(&viewer).is_some();
        if removed {
            log::debug!("stopped tracking viewer {viewer:?}");
        }
        removed
    }

    /// Sets the replication rate, clamped to 1..=60 Hz.
    pub fn set_update_rate(&self, hz: f32) {
        let interval = ReplicationConfig::interval_for_rate(hz);
        self.settings.lock().update_interval = interval;
        log::info!("replication interval set to {interval:.3}s");
    }

    #[must_use]
    pub fn update_interval(&self) -> f32 {
        self.settings.lock().update_interval
    }

    /// Effective delta chain ceiling after network adaptation.
    #[must_use]
    pub fn max_deltas_before_full(&self) -> u32 {
        self.settings.lock().max_deltas
    }

    #[must_use]
    pub fn network_quality(&self) -> f32 {
        self.settings.lock().network_quality
    }

    /// Sets the relevancy radius (floored at 100).
    pub fn set_relevancy_radius(&self, radius: f32) {
        self.settings
            .lock()
            .estimator
            .config_mut()
            .set_radius(radius);
    }

    pub fn set_compression_enabled(&self, enabled: bool) {
        self.codec.lock().set_compression_enabled(enabled);
        log::info!("payload compression enabled: {enabled}");
    }

    /// Records that `viewer` has applied `version`. Stale or premature acks
    /// are ignored.
    pub fn acknowledge(&self, viewer: ViewerId, version: Version) -> bool {
        self.clients
            .lock()
            .get_mut(&viewer)
            .is_some_and(|cursor| cursor.acknowledge(version))
    }

    /// Updates the viewer's connection quality from a latency sample.
    pub fn update_connection_quality(&self, viewer: ViewerId, latency_secs: f32) {
        if let Some(cursor) = self.clients.lock().get_mut(&viewer) {
            cursor.update_latency(latency_secs);
        }
    }

    /// Counts a lost payload; the viewer's next payload is a full snapshot.
    pub fn report_packet_loss(&self, viewer: ViewerId) {
        if let Some(cursor) = self.clients.lock().get_mut(&viewer) {
            cursor.packets_lost = cursor.packets_lost.saturating_add(1);
            cursor.needs_full = true;
        }
    }

    #[must_use]
    pub fn client_state(&self, viewer: ViewerId) -> Option<ClientReplicationState> {
        self.clients.lock().get(&viewer).cloned()
    }

    #[must_use]
    pub fn slot_state(&self, slot: SlotIndex) -> Option<SlotState> {
        self.slots.lock().get(slot.as_usize()).cloned()
    }

    /// Adjusts rate and delta chain length to the observed network quality.
    ///
    /// At or below 0.3: 5 Hz and half the configured chain. Below 0.7: 10 Hz
    /// and the configured chain. Otherwise 20 Hz and double the chain.
    pub fn adapt_to_network_quality(&self, quality: f32) {
        let quality = quality.clamp(0.0, 1.0);
        let configured = self.config.max_deltas_before_full;
        let (hz, max_deltas) = if quality <= 0.3 {
            (5.0, (configured / 2).max(1))
        } else if quality < 0.7 {
            (10.0, configured)
        } else {
            (20.0, configured.saturating_mul(2))
        };

        {
            let mut settings = self.settings.lock();
            settings.network_quality = quality;
            settings.update_interval = ReplicationConfig::interval_for_rate(hz);
            settings.max_deltas = max_deltas;
        }
        log::info!(
            "adapted to network quality {quality:.2}: {hz} Hz, max {max_deltas} deltas before full"
        );
    }

    #[must_use]
    pub fn statistics(&self) -> ReplicationStats {
        let mut stats = self.stats.lock().clone();
        stats.active_viewers = self.clients.lock().len();
        stats
    }

    /// Takes the notifications queued by [`tick`](Self::tick).
    pub fn drain_events(&self) -> Vec<ReplicationEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Runs one replication pass.
    ///
    /// Rate-limited by the update interval. Commits dirty slots, then builds
    /// a payload for every due viewer the policy admits, highest priority
    /// first. Encode failures are logged, counted and queued as
    /// [`ReplicationEvent::ReplicationFailed`], never fatal.
    pub fn tick(&self, now: f32) -> Vec<OutboundPayload> {
        let (interval, max_deltas) = {
            let mut settings = self.settings.lock();
            if let Some(last) = settings.last_tick {
                if now - last < settings.update_interval {
                    return Vec::new();
                }
            }
            settings.last_tick = Some(now);
            (settings.update_interval, settings.max_deltas)
        };

        let (current, force_full, dirty) = {
            let mut versions = self.versions.lock();
            versions.clock = now;
            let dirty: Vec<SlotIndex> = versions.pending.iter().collect();
            (versions.current, versions.force_full, dirty)
        };

        let due: Vec<ClientReplicationState> = {
            let mut clients = self.clients.lock();
            clients
                .values_mut()
                .for_each(|cursor| cursor.pending_slots.extend(dirty.iter().copied()));
            clients
                .values()
                .filter(|cursor| cursor.is_due(now, interval))
                .filter(|cursor| {
                    force_full || cursor.needs_full || cursor.last_sent_version != current
                })
                .cloned()
                .collect()
        };

        let mut targets: Vec<(ClientReplicationState, f32)> = due
            .into_iter()
            .filter_map(|cursor| {
                let (allowed, priority) = self.get_priority(cursor.viewer.id);
                allowed.then_some((cursor, priority))
            })
            .collect();
        targets.sort_by(|a, b| b.1.total_cmp(&a.1));

        self.commit_dirty(&dirty, current);

        let mut encoded: HashMap<Option<Version>, Result<Encoded, String>> = HashMap::new();
        let mut events = Vec::new();
        let mut outbound = Vec::with_capacity(targets.len());
        for (cursor, priority) in targets {
            let data = if cursor.requires_full(current, max_deltas, force_full) {
                self.get_full_snapshot()
            } else {
                self.get_delta(cursor.last_acknowledged_version)
            };
            let cache_key = match data.kind {
                SyncKind::Full => None,
                SyncKind::Delta { base } => Some(base),
            };
            let entry = encoded
                .entry(cache_key)
                .or_insert_with(|| {
                    self.encode(&data).map_err(|err| {
                        log::warn!("failed to encode {} for replication: {err}", data.version);
                        self.stats.lock().encode_failures += 1;
                        err.to_string()
                    })
                });
            let payload = match entry {
                Ok(payload) => payload,
                Err(reason) => {
                    events.push(ReplicationEvent::ReplicationFailed {
                        viewer: cursor.viewer.id,
                        version: data.version,
                        reason: reason.clone(),
                    });
                    continue;
                }
            };

            let full = data.is_full();
            {
                let mut clients = self.clients.lock();
                if let Some(state) = clients.get_mut(&cursor.viewer.id) {
                    state.record_send(data.version, full, now);
                    if self.config.ack_on_send {
                        state.acknowledge(data.version);
                    }
                }
            }
            self.stats
                .lock()
                .record(full, payload.bytes.len(), payload.original, payload.saved);

            log::trace!(
                "{} payload {} -> {:?}: {} bytes, priority {priority:.2}",
                if full { "full" } else { "delta" },
                data.version,
                cursor.viewer.id,
                payload.bytes.len()
            );
            events.push(ReplicationEvent::DataReplicated {
                viewer: cursor.viewer.id,
                version: data.version,
                kind: data.kind,
            });
            outbound.push(OutboundPayload {
                viewer: cursor.viewer.id,
                version: data.version,
                kind: data.kind,
                bytes: payload.bytes.clone(),
                priority,
            });
        }

        {
            let mut versions = self.versions.lock();
            for slot in &dirty {
                versions.pending.slots.remove(slot);
            }
            if versions.current == current {
                versions.force_full = false;
                versions.pending.clear();
            }
        }
        if !events.is_empty() {
            self.events.lock().append(&mut events);
        }

        outbound
    }

    fn commit_dirty(&self, dirty: &[SlotIndex], version: Version) {
        if dirty.is_empty() {
            return;
        }
        let items: Vec<_> = dirty
            .iter()
            .map(|slot| (*slot, self.source.slot_item(*slot)))
            .collect();
        let mut slots = self.slots.lock();
        for (slot, item) in items {
            if let Some(state) = slots.get_mut(slot.as_usize()) {
                state.commit(item, version);
            }
        }
    }

    fn encode(&self, data: &ReplicatedEquipmentData) -> CodecResult<Encoded> {
        let codec = self.codec.lock();
        let payload = codec.encode(data)?;
        let bytes = codec.frame(&payload)?;
        Ok(Encoded {
            bytes,
            original: payload.original_size as usize,
            saved: payload.bytes_saved(),
        })
    }

    fn fill_common(&self, data: &mut ReplicatedEquipmentData) {
        data.active_weapon_slot = self.source.active_weapon_slot();
        data.state_tag = self.source.equipment_state_tag();
        strip_transient_properties(data);
    }
}
