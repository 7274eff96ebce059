//! Host contract for the prediction engine.

use crate::error::RestoreError;
use crate::types::{EquipmentOperation, OperationResult};

/// Captures and restores the local equipment state.
pub trait StateProvider {
    type Snapshot: Clone;

    fn snapshot(&self) -> Self::Snapshot;

    /// Replaces local state with `snapshot`. Failure is a broken contract,
    /// not a recoverable condition.
    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), RestoreError>;
}

/// Applies operations to the local state.
///
/// The engine does not interpret operations; it only needs to know whether
/// they succeeded. A failed operation must leave state unchanged.
pub trait OperationExecutor {
    fn execute(&mut self, operation: &EquipmentOperation) -> OperationResult;
}
