//! Error types for the equipment data model.

use std::fmt;

use crate::ids::{SlotIndex, Version};

/// Result type for data model operations.
pub type LoadoutResult<T> = Result<T, LoadoutError>;

/// Errors raised by name registration and state application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadoutError {
    /// Two distinct names hash to the same 16-bit identifier.
    HashCollision {
        hash: u16,
        existing: String,
        incoming: String,
    },

    /// A slot index outside the materialized slot table.
    SlotOutOfRange { slot: SlotIndex, slot_count: usize },

    /// A delta was built against a version this state has not reached.
    MissingBase { base: Version, have: Version },
}

impl fmt::Display for LoadoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashCollision {
                hash,
                existing,
                incoming,
            } => {
                write!(
                    f,
                    "hash collision 0x{hash:04X}: '{incoming}' collides with '{existing}'"
                )
            }
            Self::SlotOutOfRange { slot, slot_count } => {
                write!(f, "slot {slot} out of range (slot count {slot_count})")
            }
            Self::MissingBase { base, have } => {
                write!(f, "delta base {base} is ahead of local state {have}")
            }
        }
    }
}

impl std::error::Error for LoadoutError {}
