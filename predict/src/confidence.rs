//! Adaptive prediction confidence.

/// Smoothed success rate and the confidence derived from it.
///
/// `confidence` stays within `[0.1, 1.0]` and never exceeds `success_rate`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceMetrics {
    /// Exponential moving average of outcomes (1 = success).
    pub success_rate: f32,
    pub confidence: f32,
    pub time_since_last_failure: f32,
    pub successes: u64,
    pub failures: u64,
}

impl Default for ConfidenceMetrics {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            confidence: 1.0,
            time_since_last_failure: 0.0,
            successes: 0,
            failures: 0,
        }
    }
}

impl ConfidenceMetrics {
    pub const MIN_CONFIDENCE: f32 = 0.1;
    /// Weight of history in the success-rate average.
    pub const SMOOTHING: f32 = 0.9;
    pub const SUCCESS_STEP: f32 = 0.05;
    pub const FAILURE_FACTOR: f32 = 0.8;
    /// Seconds without failure before confidence starts to recover.
    pub const RECOVERY_DELAY: f32 = 1.0;
    /// Confidence regained per second once recovering.
    pub const RECOVERY_RATE: f32 = 0.1;

    /// Folds one outcome into the metrics.
    pub fn record(&mut self, success: bool) {
        let sample = if success { 1.0 } else { 0.0 };
        self.success_rate = (Self::SMOOTHING * self.success_rate + (1.0 - Self::SMOOTHING) * sample)
            .clamp(Self::MIN_CONFIDENCE, 1.0);

        if success {
            self.successes += 1;
            self.confidence = (self.confidence + Self::SUCCESS_STEP).min(self.success_rate);
        } else {
            self.failures += 1;
            self.time_since_last_failure = 0.0;
            self.confidence = (self.confidence * Self::FAILURE_FACTOR)
                .min(self.success_rate)
                .max(Self::MIN_CONFIDENCE);
        }
    }

    /// Advances time by `dt` seconds, recovering confidence after a quiet
    /// period.
    pub fn recover(&mut self, dt: f32) {
        self.time_since_last_failure += dt.max(0.0);
        if self.time_since_last_failure > Self::RECOVERY_DELAY {
            self.confidence =
                (self.confidence + Self::RECOVERY_RATE * dt.max(0.0)).min(self.success_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn failure_lowers_confidence() {
        let mut metrics = ConfidenceMetrics::default();
        metrics.record(false);
        assert!((metrics.success_rate - 0.9).abs() < 1e-6);
        assert!((metrics.confidence - 0.8).abs() < 1e-6);
        assert_eq!(metrics.failures, 1);
    }

    #[test]
    fn success_is_capped_by_rate() {
        let mut metrics = ConfidenceMetrics::default();
        metrics.record(false);
        metrics.record(true);
        assert!(metrics.confidence <= metrics.success_rate);
        assert!((metrics.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn recovery_waits_for_quiet_period() {
        let mut metrics = ConfidenceMetrics::default();
        metrics.record(false);
        metrics.record(true);
        metrics.record(true);
        let before = metrics.confidence;

        metrics.recover(0.5);
        assert_eq!(metrics.confidence, before);

        metrics.recover(0.6);
        assert!(metrics.confidence > before);
        assert!(metrics.confidence <= metrics.success_rate);
    }

    #[derive(Debug, Clone)]
    enum Event {
        Outcome(bool),
        Recover(f32),
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            any::<bool>().prop_map(Event::Outcome),
            (0.0f32..5.0).prop_map(Event::Recover),
        ]
    }

    proptest! {
        #[test]
        fn confidence_stays_bounded(events in prop::collection::vec(event(), 0..200)) {
            let mut metrics = ConfidenceMetrics::default();
            for event in events {
                match event {
                    Event::Outcome(success) => metrics.record(success),
                    Event::Recover(dt) => metrics.recover(dt),
                }
                prop_assert!(metrics.confidence >= ConfidenceMetrics::MIN_CONFIDENCE);
                prop_assert!(metrics.confidence <= 1.0);
                prop_assert!(metrics.confidence <= metrics.success_rate);
            }
        }
    }
}
