//! Replication coordination: decide what to send, to whom, and when.
//!
//! The [`ReplicationCoordinator`] tracks dirty slots and a bounded version
//! history for one owner's equipment, keeps a cursor per viewer, and turns
//! each pass into encoded payloads via the `codec` crate.
//!
//! # Design Principles
//!
//! - **Source of truth stays outside** - State is read from an
//!   [`EquipmentSource`]; the coordinator never invents it.
//! - **Degrade, never fail** - A delta that cannot be built becomes a full
//!   snapshot.
//! - **Short locks** - Each table has its own lock, and no two are held at once.

mod config;
mod coordinator;
mod events;
mod policy;
mod relevancy;
mod source;
mod state;
mod stats;

pub use config::ReplicationConfig;
pub use coordinator::{OutboundPayload, ReplicationCoordinator};
pub use events::ReplicationEvent;
pub use policy::{ReplicationPolicy, ViewerFilter};
pub use relevancy::{
    OwnerContext, RelevancyConfig, RelevancyEstimator, TeamId, Vec3, ViewerContext, ViewerId,
};
pub use source::{apply_replicated_data, EquipmentSink, EquipmentSource};
pub use state::{ClientReplicationState, SlotState};
pub use stats::ReplicationStats;
