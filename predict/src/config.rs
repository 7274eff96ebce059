//! Prediction engine configuration.

/// Configuration for [`PredictionEngine`](crate::PredictionEngine).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionConfig {
    pub enabled: bool,
    /// The host is authoritative; it never predicts.
    pub authority: bool,
    pub max_active_predictions: usize,
    /// Seconds a prediction may stay pending before it is rolled back.
    pub timeout: f32,
    /// Operations whose adjusted confidence falls below this are not predicted.
    pub min_confidence_threshold: f32,
    /// Gate admission on confidence and recover it over time.
    pub adaptive_confidence: bool,
    pub timeline_capacity: usize,
    /// Confirmation latencies kept for the running average.
    pub latency_samples: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authority: false,
            max_active_predictions: 10,
            timeout: 2.0,
            min_confidence_threshold: 0.3,
            adaptive_confidence: true,
            timeline_capacity: 100,
            latency_samples: 20,
        }
    }
}

impl PredictionConfig {
    /// Creates a configuration with small limits for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            enabled: true,
            authority: false,
            max_active_predictions: 4,
            timeout: 2.0,
            min_confidence_threshold: 0.3,
            adaptive_confidence: true,
            timeline_capacity: 16,
            latency_samples: 4,
        }
    }
}
