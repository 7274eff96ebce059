//! Error types for codec operations.

use std::fmt;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding equipment payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Envelope framing error.
    Wire(wire::DecodeError),

    /// Envelope could not be framed on encode.
    WireEncode(wire::EncodeError),

    /// Byte-level read/write error inside the body.
    Bytestream(bytestream::ByteError),

    /// CRC32 of the body does not match the envelope.
    ChecksumMismatch { expected: u32, found: u32 },

    /// HMAC signature did not verify.
    SignatureMismatch,

    /// A signature is required but the payload carries none.
    SignatureMissing,

    /// The configured signing key was rejected.
    InvalidKey,

    /// Zlib stream could not be inflated.
    Decompression { message: String },

    /// Decompressed size disagrees with the envelope's original size.
    SizeMismatch { expected: usize, actual: usize },

    /// Body had unread bytes after parsing.
    TrailingData { remaining: usize },

    /// Unknown sync kind tag in the body.
    InvalidSyncKind { found: u8 },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// A value does not fit the field it is encoded into.
    ValueOutOfRange { field: &'static str, value: i64 },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Slots,
    PropertiesPerItem,
    StringBytes,
    DecompressedBytes,
}

impl CodecError {
    /// Returns `true` if the payload was corrupt or forged.
    ///
    /// The receiver must drop the payload and request a full resync; nothing
    /// from it may be applied. A declared size above the decompression limit
    /// counts as corruption: the size field sits outside the checksum and no
    /// conforming sender produces it.
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::Wire(_)
                | Self::Bytestream(_)
                | Self::ChecksumMismatch { .. }
                | Self::SignatureMismatch
                | Self::SignatureMissing
                | Self::Decompression { .. }
                | Self::SizeMismatch { .. }
                | Self::TrailingData { .. }
                | Self::InvalidSyncKind { .. }
                | Self::LimitsExceeded {
                    kind: LimitKind::DecompressedBytes,
                    ..
                }
        )
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::WireEncode(e) => write!(f, "wire encode error: {e}"),
            Self::Bytestream(e) => write!(f, "bytestream error: {e}"),
            Self::ChecksumMismatch { expected, found } => {
                write!(
                    f,
                    "checksum mismatch: expected 0x{expected:08X}, found 0x{found:08X}"
                )
            }
            Self::SignatureMismatch => write!(f, "signature verification failed"),
            Self::SignatureMissing => write!(f, "payload is not signed"),
            Self::InvalidKey => write!(f, "invalid signing key"),
            Self::Decompression { message } => write!(f, "decompression failed: {message}"),
            Self::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "size mismatch: expected {expected} bytes, got {actual}"
                )
            }
            Self::TrailingData { remaining } => {
                write!(f, "trailing data after body: {remaining} bytes")
            }
            Self::InvalidSyncKind { found } => write!(f, "invalid sync kind: {found}"),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::ValueOutOfRange { field, value } => {
                write!(f, "value {value} out of range for {field}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Slots => "slots",
            Self::PropertiesPerItem => "properties per item",
            Self::StringBytes => "string bytes",
            Self::DecompressedBytes => "decompressed bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::WireEncode(e) => Some(e),
            Self::Bytestream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wire::DecodeError> for CodecError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<wire::EncodeError> for CodecError {
    fn from(err: wire::EncodeError) -> Self {
        Self::WireEncode(err)
    }
}

impl From<bytestream::ByteError> for CodecError {
    fn from(err: bytestream::ByteError) -> Self {
        Self::Bytestream(err)
    }
}
