//! Client-side prediction for gearsync equipment.
//!
//! The [`PredictionEngine`] executes equipment operations locally before the
//! server answers, then confirms, rolls back or reconciles them. Hosts plug in
//! through [`StateProvider`] and [`OperationExecutor`].
//!
//! # Design Principles
//!
//! - **Never drop newer work** - Rolling back a prediction replays every
//!   later pending prediction on the restored state.
//! - **Mispredictions are not errors** - They trigger rollback and a warning.
//!   Only a host that cannot restore a snapshot yields an error.
//! - **Bounded** - Active predictions, the timeline and latency samples are
//!   all capped.

mod confidence;
mod config;
mod engine;
mod error;
mod host;
mod stats;
mod types;

pub use confidence::ConfidenceMetrics;
pub use config::PredictionConfig;
pub use engine::{
    PredictionEngine, REASON_DISABLED, REASON_MISMATCH, REASON_REJECTED, REASON_REPLAY_FAILED,
    REASON_TIMEOUT,
};
pub use error::{PredictionError, PredictionResult, RestoreError};
pub use host::{OperationExecutor, StateProvider};
pub use stats::PredictionStatistics;
pub use types::{
    EquipmentOperation, OperationKind, OperationResult, Prediction, PredictionEvent,
    PredictionId, PredictionState, TimelineEntry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = PredictionConfig::default();
        let _ = PredictionConfig::for_testing();
        let _ = ConfidenceMetrics::default();
        let _ = PredictionStatistics::default();
        let _ = EquipmentOperation::new(OperationKind::Equip);
        let _ = OperationResult::success();
        let _: PredictionResult<()> = Ok(());
    }
}
