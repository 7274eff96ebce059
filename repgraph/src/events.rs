//! Replication notifications.

use loadout::{SyncKind, Version};

use crate::relevancy::ViewerId;

/// Notifications raised on either side of replication.
///
/// The coordinator queues the sending-side events; see
/// [`ReplicationCoordinator::drain_events`](crate::ReplicationCoordinator::drain_events).
/// [`apply_replicated_data`](crate::apply_replicated_data) reports
/// `StateApplied` to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationEvent {
    /// A payload was built for `viewer` and handed to the transport.
    DataReplicated {
        viewer: ViewerId,
        version: Version,
        kind: SyncKind,
    },
    /// No payload could be built for `viewer` this pass.
    ReplicationFailed {
        viewer: ViewerId,
        version: Version,
        reason: String,
    },
    /// The receiving side applied `version`, writing `slots_written` slots.
    StateApplied {
        version: Version,
        slots_written: usize,
    },
}

impl ReplicationEvent {
    /// The viewer a sending-side event concerns.
    #[must_use]
    pub const fn viewer(&self) -> Option<ViewerId> {
        match self {
            Self::DataReplicated { viewer, .. } | Self::ReplicationFailed { viewer, .. } => {
                Some(*viewer)
            }
            Self::StateApplied { .. } => None,
        }
    }
}
