//! Error types for the prediction engine.

use std::fmt;

use crate::types::PredictionId;

/// Result type for prediction engine operations.
pub type PredictionResult<T> = Result<T, PredictionError>;

/// A state provider could not restore a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreError {
    pub message: String,
}

impl RestoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot restore failed: {}", self.message)
    }
}

impl std::error::Error for RestoreError {}

/// Errors raised by the prediction engine.
///
/// These indicate a broken host contract, not a misprediction. A server
/// result that disagrees with a prediction is handled by rollback and is
/// never reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    /// Restoring a snapshot during rollback or reconciliation failed. Local
    /// state is undefined until the next successful reconcile.
    RestoreFailed {
        prediction: Option<PredictionId>,
        source: RestoreError,
    },
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestoreFailed {
                prediction: Some(id),
                source,
            } => write!(f, "rollback of prediction {id}: {source}"),
            Self::RestoreFailed {
                prediction: None,
                source,
            } => write!(f, "reconciliation: {source}"),
        }
    }
}

impl std::error::Error for PredictionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RestoreFailed { source, .. } => Some(source),
        }
    }
}
