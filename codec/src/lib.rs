//! Equipment payload codecs for gearsync.
//!
//! This crate ties together bytestream, wire and loadout to turn
//! [`ReplicatedEquipmentData`](loadout::ReplicatedEquipmentData) into bytes
//! and back.
//!
//! # Features
//!
//! - Exact full-path codec with zlib compression, CRC32 and HMAC-SHA256
//! - Packed lossy codec for frequent small updates
//! - Delta masks and a bounded per-version change history
//!
//! # Design Principles
//!
//! - **Correctness first** - Integrity is verified before anything is parsed.
//! - **No partial results** - A failed decode yields an error, never half a payload.
//! - **Deterministic** - Same inputs produce same outputs.

mod body;
mod config;
mod delta;
mod error;
mod history;
mod limits;
mod packed;
mod payload;

pub use config::CodecConfig;
pub use delta::DeltaMask;
pub use error::{CodecError, CodecResult, LimitKind};
pub use history::{HistoryError, VersionHistory};
pub use limits::CodecLimits;
pub use packed::{
    decode_packed, encode_packed, PackedEquipmentData, PackedItem, PackedProperty, PackedSlot,
    PROPERTY_SCALE,
};
pub use payload::{CompressedPayload, PayloadCodec};
pub use wire::{CompressionType, Limits as WireLimits};
