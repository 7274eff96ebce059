//! Coordinator configuration.

use codec::CodecConfig;

use crate::policy::ReplicationPolicy;
use crate::relevancy::RelevancyConfig;

/// Configuration for [`ReplicationCoordinator`](crate::ReplicationCoordinator).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicationConfig {
    /// Hard cap on tracked slots regardless of what the source reports.
    pub max_slots: usize,
    /// Minimum seconds between replication passes.
    pub min_update_interval: f32,
    /// Delta chain ceiling before a full snapshot is forced.
    pub max_deltas_before_full: u32,
    /// Versions retained for delta reconstruction.
    pub history_capacity: usize,
    /// Treat every sent payload as delivered (for transports without acks).
    pub ack_on_send: bool,
    /// Score viewers with the relevancy estimator; otherwise every viewer
    /// scores 1.
    pub enhanced_relevancy: bool,
    pub policy: ReplicationPolicy,
    pub relevancy: RelevancyConfig,
    pub codec: CodecConfig,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            max_slots: 256,
            min_update_interval: 0.1,
            max_deltas_before_full: 10,
            history_capacity: 128,
            ack_on_send: false,
            enhanced_relevancy: true,
            policy: ReplicationPolicy::Always,
            relevancy: RelevancyConfig::default(),
            codec: CodecConfig::default(),
        }
    }
}

impl ReplicationConfig {
    /// Lowest and highest accepted update rates in Hz.
    pub const MIN_UPDATE_RATE: f32 = 1.0;
    pub const MAX_UPDATE_RATE: f32 = 60.0;

    /// Creates a configuration with small limits for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_slots: 32,
            history_capacity: 64,
            codec: CodecConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Interval for an update rate, clamped to the accepted range.
    #[must_use]
    pub fn interval_for_rate(hz: f32) -> f32 {
        1.0 / hz.clamp(Self::MIN_UPDATE_RATE, Self::MAX_UPDATE_RATE)
    }
}
