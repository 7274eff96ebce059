//! Prediction counters.

/// Running totals reported by
/// [`PredictionEngine::statistics`](crate::PredictionEngine::statistics).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionStatistics {
    pub total_created: u64,
    pub total_confirmed: u64,
    pub total_rolled_back: u64,
    pub total_timeouts: u64,
    pub active_predictions: usize,
    pub reconciliation_count: u64,
    /// Mean seconds from creation to confirmation.
    pub average_latency: f32,
}

impl PredictionStatistics {
    /// Confirmed share of created predictions.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        if self.total_created == 0 {
            return 0.0;
        }
        self.total_confirmed as f32 / self.total_created as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_handles_empty() {
        assert_eq!(PredictionStatistics::default().accuracy(), 0.0);
        let stats = PredictionStatistics {
            total_created: 4,
            total_confirmed: 3,
            ..PredictionStatistics::default()
        };
        assert!((stats.accuracy() - 0.75).abs() < 1e-6);
    }
}
