//! Configurable limits for bounded decoding.

/// Wire-level limits for envelope decoding.
///
/// These limits are enforced before any allocation so a hostile length field
/// cannot force large buffers. Limits on the decoded body (slot counts,
/// decompressed size) belong to the codec layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum encoded envelope size in bytes.
    pub max_payload_bytes: usize,

    /// Maximum body length (compressed or raw) in bytes.
    pub max_body_bytes: usize,

    /// Maximum signature length in bytes.
    pub max_signature_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            max_body_bytes: 60 * 1024,

            // HMAC-SHA256 tags are 32 bytes; leave room for longer MACs
            max_signature_bytes: 64,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_payload_bytes: 4096,
            max_body_bytes: 3072,
            max_signature_bytes: 32,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_payload_bytes: usize::MAX,
            max_body_bytes: usize::MAX,
            max_signature_bytes: usize::MAX,
        }
    }
}
