//! Limits for codec-level decoding.

/// Codec-specific limits enforced while encoding and decoding bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecLimits {
    /// Maximum number of slot entries in one payload.
    pub max_slots: usize,
    /// Maximum number of runtime properties per item.
    pub max_properties_per_item: usize,
    /// Maximum byte length of any string (item id, property key, state tag).
    pub max_string_bytes: usize,
    /// Maximum size of a body after decompression.
    pub max_decompressed_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_slots: 256,
            max_properties_per_item: 32,
            max_string_bytes: 256,
            max_decompressed_bytes: 256 * 1024,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_slots: 32,
            max_properties_per_item: 8,
            max_string_bytes: 64,
            max_decompressed_bytes: 16 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_slots: usize::MAX,
            max_properties_per_item: usize::MAX,
            max_string_bytes: usize::MAX,
            max_decompressed_bytes: usize::MAX,
        }
    }
}
