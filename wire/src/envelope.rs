//! Payload envelope framing.
//!
//! Layout (little-endian):
//! `[compression:u8][original_size:u32][body_len:u32][body][crc32:u32][sig_len:u16][sig]`

use bytestream::{ByteReader, ByteWriter};

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::limits::Limits;

/// Fixed framing bytes around the body and signature.
pub const ENVELOPE_OVERHEAD: usize = 1 + 4 + 4 + 4 + 2;

/// Compression applied to the envelope body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionType {
    None = 0,
    Zlib = 1,
}

impl CompressionType {
    /// Parses a compression type from a raw byte.
    pub fn parse(raw: u8) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            _ => Err(DecodeError::UnknownCompression { found: raw }),
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A framed payload borrowed from an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub compression: CompressionType,
    /// Size of the body before compression.
    pub original_size: u32,
    pub body: &'a [u8],
    pub crc32: u32,
    /// Empty when the payload is unsigned.
    pub signature: &'a [u8],
}

impl Envelope<'_> {
    /// Total encoded size of this envelope.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        ENVELOPE_OVERHEAD + self.body.len() + self.signature.len()
    }
}

/// Encodes an envelope into a fresh buffer.
pub fn encode_envelope(envelope: &Envelope<'_>, limits: &Limits) -> Result<Vec<u8>, EncodeError> {
    check_encode_limit(LimitKind::BodyBytes, limits.max_body_bytes, envelope.body.len())?;
    check_encode_limit(
        LimitKind::SignatureBytes,
        limits.max_signature_bytes,
        envelope.signature.len(),
    )?;
    check_encode_limit(
        LimitKind::PayloadBytes,
        limits.max_payload_bytes,
        envelope.encoded_len(),
    )?;

    let body_len = u32::try_from(envelope.body.len()).map_err(|_| EncodeError::LengthOverflow {
        length: envelope.body.len(),
    })?;
    let sig_len =
        u16::try_from(envelope.signature.len()).map_err(|_| EncodeError::LengthOverflow {
            length: envelope.signature.len(),
        })?;

    let mut writer = ByteWriter::with_capacity(envelope.encoded_len());
    writer.write_u8(envelope.compression.as_u8());
    writer.write_u32(envelope.original_size);
    writer.write_u32(body_len);
    writer.write_bytes(envelope.body);
    writer.write_u32(envelope.crc32);
    writer.write_u16(sig_len);
    writer.write_bytes(envelope.signature);
    Ok(writer.finish())
}

/// Decodes an envelope, borrowing body and signature from `buf`.
///
/// Only framing is validated here; checksum and signature verification are
/// the codec's job.
pub fn decode_envelope<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Envelope<'a>> {
    if buf.len() < ENVELOPE_OVERHEAD {
        return Err(DecodeError::EnvelopeTooSmall {
            actual: buf.len(),
            required: ENVELOPE_OVERHEAD,
        });
    }
    check_decode_limit(LimitKind::PayloadBytes, limits.max_payload_bytes, buf.len())?;

    let mut reader = ByteReader::new(buf);
    let compression = CompressionType::parse(reader.read_u8()?)?;
    let original_size = reader.read_u32()?;
    let body_len = reader.read_u32()? as usize;
    check_decode_limit(LimitKind::BodyBytes, limits.max_body_bytes, body_len)?;
    let body = reader.read_bytes(body_len)?;
    let crc32 = reader.read_u32()?;
    let sig_len = reader.read_u16()? as usize;
    check_decode_limit(LimitKind::SignatureBytes, limits.max_signature_bytes, sig_len)?;
    let signature = reader.read_bytes(sig_len)?;

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining(),
        });
    }

    Ok(Envelope {
        compression,
        original_size,
        body,
        crc32,
        signature,
    })
}

fn check_decode_limit(kind: LimitKind, limit: usize, actual: usize) -> WireResult<()> {
    if actual > limit {
        return Err(DecodeError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}

fn check_encode_limit(kind: LimitKind, limit: usize, actual: usize) -> Result<(), EncodeError> {
    if actual > limit {
        return Err(EncodeError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}
