//! Client-side prediction engine.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::config::PredictionConfig;
use crate::confidence::ConfidenceMetrics;
use crate::error::{PredictionError, PredictionResult, RestoreError};
use crate::host::{OperationExecutor, StateProvider};
use crate::stats::PredictionStatistics;
use crate::types::{
    EquipmentOperation, OperationKind, OperationResult, Prediction, PredictionEvent,
    PredictionId, PredictionState, TimelineEntry,
};

pub const REASON_MISMATCH: &str = "Server result mismatch";
pub const REASON_TIMEOUT: &str = "Timeout";
pub const REASON_REPLAY_FAILED: &str = "Replay failed";
pub const REASON_DISABLED: &str = "Prediction disabled";
pub const REASON_REJECTED: &str = "Server rejected operation";

/// Admission threshold for `priority * confidence`.
const MIN_PRIORITY: f32 = 0.5;
const QUICK_SWITCH_CONFIDENCE_FLOOR: f32 = 0.8;
const DROP_CONFIDENCE_FACTOR: f32 = 0.7;
/// Seconds between timeline sweeps.
const CLEANUP_INTERVAL: f32 = 1.0;
const AGE_PENALTY: f32 = 0.5;
const LATENCY_PENALTY: f32 = 0.3;
const LATENCY_PENALTY_START: f32 = 0.1;
const LATENCY_PENALTY_FULL: f32 = 0.5;

/// Speculatively executes operations on the client and reconciles them
/// with the server.
///
/// Pending predictions are kept in creation order. Rolling one back
/// restores its pre-state and replays every later pending prediction on
/// top of it, so newer speculative work is never silently dropped.
#[derive(Debug)]
pub struct PredictionEngine<H: StateProvider> {
    host: H,
    config: PredictionConfig,
    confidence: ConfidenceMetrics,
    active: Vec<Prediction<H::Snapshot>>,
    operations: HashMap<Uuid, PredictionId>,
    timeline: VecDeque<TimelineEntry>,
    latencies: VecDeque<f32>,
    stats: PredictionStatistics,
    events: Vec<PredictionEvent>,
    next_sequence: u64,
    last_tick: Option<f32>,
    last_cleanup: f32,
    last_server_update: f32,
}

impl<H> PredictionEngine<H>
where
    H: StateProvider + OperationExecutor,
{
    pub fn new(host: H, config: PredictionConfig) -> Self {
        log::debug!(
            "prediction engine created (enabled {}, authority {})",
            config.enabled,
            config.authority
        );
        Self {
            host,
            config,
            confidence: ConfidenceMetrics::default(),
            active: Vec::new(),
            operations: HashMap::new(),
            timeline: VecDeque::new(),
            latencies: VecDeque::new(),
            stats: PredictionStatistics::default(),
            events: Vec::new(),
            next_sequence: 0,
            last_tick: None,
            last_cleanup: 0.0,
            last_server_update: 0.0,
        }
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host. Changing state behind the engine's back
    /// invalidates the snapshots of pending predictions.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    #[must_use]
    pub const fn config(&self) -> &PredictionConfig {
        &self.config
    }

    #[must_use]
    pub const fn confidence(&self) -> &ConfidenceMetrics {
        &self.confidence
    }

    /// Executes `operation` locally and tracks it as a prediction.
    ///
    /// Returns `None` when prediction is disabled, the cap is reached, the
    /// admission gate rejects the operation, or local execution fails.
    pub fn create_prediction(
        &mut self,
        operation: EquipmentOperation,
        now: f32,
    ) -> Option<PredictionId> {
        if !self.config.enabled || self.config.authority {
            return None;
        }
        if !self.should_allow(&operation) {
            log::debug!("prediction of {:?} denied", operation.kind);
            return None;
        }
        if self.active.len() >= self.config.max_active_predictions {
            log::warn!(
                "prediction limit reached ({})",
                self.config.max_active_predictions
            );
            return None;
        }

        let state_before = self.host.snapshot();
        let result = self.host.execute(&operation);
        if !result.success {
            log::warn!(
                "local execution of {:?} failed: {}",
                operation.kind,
                result.error_message.as_deref().unwrap_or("no reason given")
            );
            return None;
        }
        let predicted_state = self.host.snapshot();

        let id = PredictionId::generate();
        let confidence = self.adjusted_confidence(operation.kind);
        if let Some(operation_id) = operation.operation_id {
            self.operations.insert(operation_id, id);
        }

        let prediction = Prediction {
            id,
            operation,
            created_at: now,
            sequence: self.next_sequence,
            state_before,
            predicted_state,
        };
        self.next_sequence += 1;
        let key = prediction.order_key();
        let position = self.active.partition_point(|p| p.order_key() <= key);
        self.active.insert(position, prediction);

        self.timeline.push_back(TimelineEntry {
            prediction: id,
            timestamp: now,
            server_timestamp: self.last_server_update,
            confidence,
            state: PredictionState::Pending,
        });
        while self.timeline.len() > self.config.timeline_capacity {
            self.timeline.pop_front();
        }

        self.stats.total_created += 1;
        self.events.push(PredictionEvent::Created(id));
        log::debug!("prediction {id} created at {now:.3}");
        Some(id)
    }

    /// Re-applies the predicted state of a pending prediction.
    pub fn apply_prediction(&mut self, id: PredictionId) -> PredictionResult<bool> {
        let Some(prediction) = self.active.iter().find(|p| p.id == id) else {
            log::warn!("cannot apply unknown prediction {id}");
            return Ok(false);
        };
        self.host
            .restore(&prediction.predicted_state)
            .map_err(|source| restore_failed(Some(id), source))?;
        Ok(true)
    }

    /// Resolves a prediction with the server's result.
    ///
    /// A successful result confirms it; anything else rolls it back. Returns
    /// whether the prediction was confirmed.
    pub fn confirm(
        &mut self,
        id: PredictionId,
        server_result: &OperationResult,
        now: f32,
    ) -> PredictionResult<bool> {
        let Some(index) = self.index_of(id) else {
            log::trace!("confirm for unknown prediction {id}");
            return Ok(false);
        };
        if !server_result.success {
            log::warn!("server result mismatch for prediction {id}");
            self.rollback(id, REASON_MISMATCH)?;
            return Ok(false);
        }

        let prediction = self.active.remove(index);
        self.confidence.record(true);
        self.stats.total_confirmed += 1;
        self.record_latency(now - prediction.created_at);
        self.resolve(id, PredictionState::Confirmed);
        self.events.push(PredictionEvent::Confirmed(id));
        log::debug!("prediction {id} confirmed");
        Ok(true)
    }

    /// Undoes a prediction and replays every later pending prediction on
    /// top of the restored state, in order.
    ///
    /// Returns `false` if the prediction is not pending.
    pub fn rollback(&mut self, id: PredictionId, reason: &str) -> PredictionResult<bool> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        if let Err(source) = self.host.restore(&self.active[index].state_before) {
            log::error!("rollback of prediction {id} could not restore state: {source}");
            return Err(restore_failed(Some(id), source));
        }

        self.active.remove(index);
        self.mark_rolled_back(id, reason);

        let reapplied = self.replay_from(index)?;
        if reapplied > 0 {
            log::debug!("replayed {reapplied} predictions after rolling back {id}");
        }
        Ok(true)
    }

    /// Replaces local state with the authoritative snapshot and replays
    /// every pending prediction in order. Returns the number replayed.
    pub fn reconcile(&mut self, server_state: &H::Snapshot, now: f32) -> PredictionResult<usize> {
        self.events.push(PredictionEvent::ReconciliationStarted);
        if let Err(source) = self.host.restore(server_state) {
            log::error!("reconciliation could not restore server state: {source}");
            return Err(restore_failed(None, source));
        }
        self.last_server_update = now;

        let reapplied = self.replay_from(0)?;
        self.stats.reconciliation_count += 1;
        self.events
            .push(PredictionEvent::ReconciliationCompleted { reapplied });
        log::debug!(
            "reconciliation #{} replayed {reapplied} predictions",
            self.stats.reconciliation_count
        );
        Ok(reapplied)
    }

    /// Admission gate for speculative execution.
    #[must_use]
    pub fn should_allow(&self, operation: &EquipmentOperation) -> bool {
        if self.config.authority {
            return false;
        }
        if self.config.adaptive_confidence
            && self.adjusted_confidence(operation.kind) < self.config.min_confidence_threshold
        {
            return false;
        }
        if operation.kind == OperationKind::QuickSwitch {
            return true;
        }
        self.priority(operation.kind) >= MIN_PRIORITY
    }

    /// Operation weight scaled by current confidence.
    #[must_use]
    pub fn priority(&self, kind: OperationKind) -> f32 {
        (kind.prediction_weight() * self.confidence.confidence).clamp(0.0, 1.0)
    }

    /// Confidence as seen by one operation kind.
    #[must_use]
    pub fn adjusted_confidence(&self, kind: OperationKind) -> f32 {
        let base = self.confidence.confidence;
        match kind {
            OperationKind::QuickSwitch => base.max(QUICK_SWITCH_CONFIDENCE_FLOOR),
            OperationKind::Drop => base * DROP_CONFIDENCE_FACTOR,
            _ => base,
        }
    }

    /// Periodic maintenance: confidence recovery, timeouts and timeline
    /// cleanup.
    pub fn tick(&mut self, now: f32) -> PredictionResult<()> {
        let dt = self.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        self.last_tick = Some(now);
        if !self.config.enabled {
            return Ok(());
        }

        if self.config.adaptive_confidence {
            self.confidence.recover(dt);
        }

        let expired: Vec<PredictionId> = self
            .active
            .iter()
            .filter(|p| now - p.created_at > self.config.timeout)
            .map(|p| p.id)
            .collect();
        for id in expired {
            log::warn!("prediction {id} timed out");
            if self.rollback(id, REASON_TIMEOUT)? {
                self.stats.total_timeouts += 1;
            }
        }

        if now - self.last_cleanup > CLEANUP_INTERVAL {
            let max_age = self.config.timeout * 2.0;
            self.timeline.retain(|entry| now - entry.timestamp <= max_age);
            self.last_cleanup = now;
        }
        Ok(())
    }

    /// Routes a server response by operation id. Returns whether a
    /// prediction was confirmed.
    pub fn handle_server_response(
        &mut self,
        operation_id: Uuid,
        result: &OperationResult,
        now: f32,
    ) -> PredictionResult<bool> {
        let id = self
            .operations
            .get(&operation_id)
            .or_else(|| {
                result
                    .operation_id
                    .and_then(|fallback| self.operations.get(&fallback))
            })
            .copied();
        let Some(id) = id else {
            log::trace!("no prediction for operation {operation_id}");
            return Ok(false);
        };

        if result.success {
            self.confirm(id, result, now)
        } else {
            let reason = result.error_message.as_deref().unwrap_or(REASON_REJECTED);
            self.rollback(id, reason)?;
            Ok(false)
        }
    }

    /// Rolls back the prediction for an operation the transport gave up on.
    pub fn handle_operation_timeout(&mut self, operation_id: Uuid) -> PredictionResult<bool> {
        let Some(id) = self.operations.get(&operation_id).copied() else {
            return Ok(false);
        };
        log::warn!("operation {operation_id} timed out");
        let rolled_back = self.rollback(id, REASON_TIMEOUT)?;
        if rolled_back {
            self.stats.total_timeouts += 1;
        }
        Ok(rolled_back)
    }

    /// Enables or disables prediction. Disabling rolls back everything
    /// pending, newest first.
    pub fn set_enabled(&mut self, enabled: bool) -> PredictionResult<()> {
        if !enabled {
            while let Some(id) = self.active.last().map(|p| p.id) {
                self.rollback(id, REASON_DISABLED)?;
            }
            self.operations.clear();
        }
        self.config.enabled = enabled;
        log::info!("prediction {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Confidence in one pending prediction, discounted by its age and by
    /// observed confirmation latency. Zero if not pending.
    #[must_use]
    pub fn prediction_confidence(&self, id: PredictionId, now: f32) -> f32 {
        let Some(prediction) = self.active.iter().find(|p| p.id == id) else {
            return 0.0;
        };
        let mut confidence = self.confidence.confidence;

        let age = now - prediction.created_at;
        let age_penalty = (age / self.config.timeout.max(f32::EPSILON)).clamp(0.0, 1.0);
        confidence *= 1.0 - age_penalty * AGE_PENALTY;

        let latency = self.stats.average_latency;
        if latency > LATENCY_PENALTY_START {
            let latency_penalty = (latency / LATENCY_PENALTY_FULL).clamp(0.0, 1.0);
            confidence *= 1.0 - latency_penalty * LATENCY_PENALTY;
        }
        confidence.clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_active(&self, id: PredictionId) -> bool {
        self.index_of(id).is_some()
    }

    /// Pending predictions in chronological order.
    pub fn active_predictions(&self) -> impl Iterator<Item = &Prediction<H::Snapshot>> {
        self.active.iter()
    }

    /// State of a pending or recently resolved prediction.
    #[must_use]
    pub fn outcome(&self, id: PredictionId) -> Option<PredictionState> {
        if self.is_active(id) {
            return Some(PredictionState::Pending);
        }
        self.timeline
            .iter()
            .rev()
            .find(|entry| entry.prediction == id)
            .map(|entry| entry.state.clone())
    }

    pub fn timeline(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.timeline.iter()
    }

    #[must_use]
    pub fn statistics(&self) -> PredictionStatistics {
        PredictionStatistics {
            active_predictions: self.active.len(),
            ..self.stats.clone()
        }
    }

    /// Takes the queued notifications.
    pub fn drain_events(&mut self) -> Vec<PredictionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forgets every prediction and resets confidence and statistics.
    /// Local state is left as is.
    pub fn reset(&mut self) {
        self.active.clear();
        self.operations.clear();
        self.timeline.clear();
        self.latencies.clear();
        self.events.clear();
        self.confidence = ConfidenceMetrics::default();
        self.stats = PredictionStatistics::default();
        self.last_tick = None;
        self.last_cleanup = 0.0;
        log::debug!("prediction engine reset");
    }

    fn index_of(&self, id: PredictionId) -> Option<usize> {
        self.active.iter().position(|p| p.id == id)
    }

    /// Re-executes pending predictions from `start` against current state,
    /// refreshing their snapshots. Predictions that no longer execute are
    /// rolled back in place.
    fn replay_from(&mut self, start: usize) -> PredictionResult<usize> {
        let mut index = start;
        let mut reapplied = 0;
        while index < self.active.len() {
            let state_before = self.host.snapshot();
            let result = self.host.execute(&self.active[index].operation);
            if result.success {
                let predicted_state = self.host.snapshot();
                let prediction = &mut self.active[index];
                prediction.state_before = state_before;
                prediction.predicted_state = predicted_state;
                reapplied += 1;
                index += 1;
            } else {
                let failed = self.active.remove(index);
                log::warn!("replay of prediction {} failed", failed.id);
                self.host
                    .restore(&state_before)
                    .map_err(|source| restore_failed(Some(failed.id), source))?;
                self.mark_rolled_back(failed.id, REASON_REPLAY_FAILED);
            }
        }
        Ok(reapplied)
    }

    fn mark_rolled_back(&mut self, id: PredictionId, reason: &str) {
        self.confidence.record(false);
        self.stats.total_rolled_back += 1;
        self.resolve(
            id,
            PredictionState::RolledBack {
                reason: reason.to_owned(),
            },
        );
        self.events.push(PredictionEvent::RolledBack {
            id,
            reason: reason.to_owned(),
        });
        log::debug!("prediction {id} rolled back: {reason}");
    }

    fn resolve(&mut self, id: PredictionId, state: PredictionState) {
        self.operations.retain(|_, prediction| *prediction != id);
        if let Some(entry) = self
            .timeline
            .iter_mut()
            .rev()
            .find(|entry| entry.prediction == id)
        {
            entry.state = state;
        }
    }

    fn record_latency(&mut self, latency: f32) {
        self.latencies.push_back(latency.max(0.0));
        while self.latencies.len() > self.config.latency_samples.max(1) {
            self.latencies.pop_front();
        }
        self.stats.average_latency =
            self.latencies.iter().sum::<f32>() / self.latencies.len() as f32;
    }
}

fn restore_failed(prediction: Option<PredictionId>, source: RestoreError) -> PredictionError {
    PredictionError::RestoreFailed { prediction, source }
}
