//! Operation, prediction and timeline types.

use std::fmt;

use loadout::{ItemInstance, SlotIndex};
use uuid::Uuid;

/// Identifies one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionId(Uuid);

impl PredictionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PredictionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of equipment operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationKind {
    Equip,
    Unequip,
    Swap,
    Move,
    Drop,
    Transfer,
    QuickSwitch,
    Reload,
    Inspect,
    Repair,
    Upgrade,
    Modify,
    Combine,
    Split,
}

impl OperationKind {
    /// Admission weight: cheap, reversible operations score high and
    /// destructive ones low.
    #[must_use]
    pub const fn prediction_weight(self) -> f32 {
        match self {
            Self::QuickSwitch => 1.0,
            Self::Equip | Self::Unequip => 0.8,
            Self::Swap | Self::Move => 0.6,
            Self::Drop => 0.4,
            _ => 0.5,
        }
    }
}

/// A request to mutate equipment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipmentOperation {
    /// Correlates server responses with the prediction.
    pub operation_id: Option<Uuid>,
    pub kind: OperationKind,
    pub source_slot: Option<SlotIndex>,
    pub target_slot: Option<SlotIndex>,
    pub item: Option<ItemInstance>,
}

impl EquipmentOperation {
    #[must_use]
    pub const fn new(kind: OperationKind) -> Self {
        Self {
            operation_id: None,
            kind,
            source_slot: None,
            target_slot: None,
            item: None,
        }
    }

    #[must_use]
    pub fn with_operation_id(mut self, id: Uuid) -> Self {
        self.operation_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_source_slot(mut self, slot: SlotIndex) -> Self {
        self.source_slot = Some(slot);
        self
    }

    #[must_use]
    pub fn with_target_slot(mut self, slot: SlotIndex) -> Self {
        self.target_slot = Some(slot);
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemInstance) -> Self {
        self.item = Some(item);
        self
    }
}

/// Result of executing an operation, locally or on the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationResult {
    pub success: bool,
    pub operation_id: Option<Uuid>,
    pub error_message: Option<String>,
}

impl OperationResult {
    #[must_use]
    pub const fn success() -> Self {
        Self {
            success: true,
            operation_id: None,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            operation_id: None,
            error_message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn with_operation_id(mut self, id: Uuid) -> Self {
        self.operation_id = Some(id);
        self
    }
}

/// Lifecycle of a prediction. `Confirmed` and `RolledBack` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredictionState {
    Pending,
    Confirmed,
    RolledBack { reason: String },
}

impl PredictionState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A pending prediction with the snapshots around its local execution.
#[derive(Debug, Clone)]
pub struct Prediction<S> {
    pub id: PredictionId,
    pub operation: EquipmentOperation,
    pub created_at: f32,
    /// Creation order; breaks ties between equal timestamps.
    pub(crate) sequence: u64,
    pub state_before: S,
    pub predicted_state: S,
}

impl<S> Prediction<S> {
    pub(crate) fn order_key(&self) -> (f32, u64) {
        (self.created_at, self.sequence)
    }
}

/// Bookkeeping record kept after a prediction resolves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimelineEntry {
    pub prediction: PredictionId,
    pub timestamp: f32,
    /// Time of the last reconciliation when the prediction was made.
    pub server_timestamp: f32,
    /// Adjusted confidence at creation.
    pub confidence: f32,
    pub state: PredictionState,
}

/// Notifications queued for the host; see `PredictionEngine::drain_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionEvent {
    Created(PredictionId),
    Confirmed(PredictionId),
    RolledBack { id: PredictionId, reason: String },
    ReconciliationStarted,
    ReconciliationCompleted { reapplied: usize },
}
