//! Payload codec configuration.

use crate::limits::CodecLimits;

/// Configuration for [`PayloadCodec`](crate::PayloadCodec).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
    /// Compress bodies larger than `compression_threshold`.
    pub compression_enabled: bool,
    /// Bodies at or below this size are sent raw.
    pub compression_threshold: usize,
    /// Zlib level, 0 (store) to 9 (best).
    pub compression_level: u32,
    /// Reject unsigned payloads on decode.
    pub require_signature: bool,
    pub limits: CodecLimits,
    pub wire_limits: wire::Limits,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_enabled: true,
            compression_threshold: 128,
            compression_level: 6,
            require_signature: false,
            limits: CodecLimits::default(),
            wire_limits: wire::Limits::default(),
        }
    }
}

impl CodecConfig {
    /// Creates a configuration with small limits for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            compression_enabled: true,
            compression_threshold: 128,
            compression_level: 6,
            require_signature: false,
            limits: CodecLimits::for_testing(),
            wire_limits: wire::Limits::for_testing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CodecConfig::default();
        assert!(config.compression_enabled);
        assert_eq!(config.compression_threshold, 128);
        assert!(!config.require_signature);
    }

    #[test]
    fn testing_config_uses_testing_limits() {
        let config = CodecConfig::for_testing();
        assert_eq!(config.limits, CodecLimits::for_testing());
        assert_eq!(config.wire_limits, wire::Limits::for_testing());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip_keeps_wire_limits() {
        let config = CodecConfig {
            wire_limits: wire::Limits {
                max_payload_bytes: 1024,
                max_body_bytes: 900,
                max_signature_bytes: 32,
            },
            ..CodecConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
