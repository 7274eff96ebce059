//! Full payload codec: serialize, compress, checksum and sign.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use loadout::ReplicatedEquipmentData;
use sha2::Sha256;
use wire::{CompressionType, Envelope};

use crate::body::{check_limit, read_body, write_body};
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult, LimitKind};

type HmacSha256 = Hmac<Sha256>;

/// An encoded payload ready for framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPayload {
    pub compression: CompressionType,
    /// Size of the serialized body before compression.
    pub original_size: u32,
    /// Serialized body, compressed when `compression` is `Zlib`.
    pub body: Vec<u8>,
    /// CRC32 over `body`.
    pub crc32: u32,
    /// HMAC-SHA256 tag, empty when unsigned.
    pub signature: Vec<u8>,
}

impl CompressedPayload {
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        matches!(self.compression, CompressionType::Zlib)
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Size of the framed payload on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.envelope().encoded_len()
    }

    /// Body size relative to the uncompressed size (1.0 when raw).
    #[must_use]
    pub fn compression_ratio(&self) -> f32 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.body.len() as f32 / self.original_size as f32
    }

    /// Bytes saved by compression.
    #[must_use]
    pub fn bytes_saved(&self) -> usize {
        (self.original_size as usize).saturating_sub(self.body.len())
    }

    fn envelope(&self) -> Envelope<'_> {
        Envelope {
            compression: self.compression,
            original_size: self.original_size,
            body: &self.body,
            crc32: self.crc32,
            signature: &self.signature,
        }
    }

    fn from_envelope(envelope: &Envelope<'_>) -> Self {
        Self {
            compression: envelope.compression,
            original_size: envelope.original_size,
            body: envelope.body.to_vec(),
            crc32: envelope.crc32,
            signature: envelope.signature.to_vec(),
        }
    }
}

/// Encodes and decodes [`ReplicatedEquipmentData`] with integrity checks.
///
/// Decoding verifies in order: signature, checksum, decompressed size, body.
/// Any failure aborts before a value is produced.
#[derive(Clone)]
pub struct PayloadCodec {
    config: CodecConfig,
    signing_key: Option<Vec<u8>>,
}

impl std::fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodec")
            .field("config", &self.config)
            .field("signed", &self.signing_key.is_some())
            .finish()
    }
}

impl PayloadCodec {
    #[must_use]
    pub const fn new(config: CodecConfig) -> Self {
        Self {
            config,
            signing_key: None,
        }
    }

    /// Signs outgoing payloads and verifies incoming signatures with `key`.
    #[must_use]
    pub fn with_signing_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.signing_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn set_compression_enabled(&mut self, enabled: bool) {
        self.config.compression_enabled = enabled;
    }

    #[must_use]
    pub const fn is_signing(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Serializes, compresses when worthwhile, checksums and signs.
    pub fn encode(&self, data: &ReplicatedEquipmentData) -> CodecResult<CompressedPayload> {
        let raw = write_body(data, &self.config.limits)?;
        let original_size = u32::try_from(raw.len()).map_err(|_| CodecError::ValueOutOfRange {
            field: "original_size",
            value: raw.len() as i64,
        })?;

        let (compression, body) = self.maybe_compress(raw);
        let crc32 = crc32fast::hash(&body);
        let signature = match &self.signing_key {
            Some(key) => sign(key, compression, original_size, &body)?,
            None => Vec::new(),
        };

        log::trace!(
            "encoded {} ({:?}): {} -> {} bytes",
            data.version,
            compression,
            original_size,
            body.len()
        );

        Ok(CompressedPayload {
            compression,
            original_size,
            body,
            crc32,
            signature,
        })
    }

    /// Verifies and deserializes a payload.
    pub fn decode(&self, payload: &CompressedPayload) -> CodecResult<ReplicatedEquipmentData> {
        self.decode_parts(&payload.envelope())
    }

    /// Encodes straight to framed bytes.
    pub fn encode_to_bytes(&self, data: &ReplicatedEquipmentData) -> CodecResult<Vec<u8>> {
        let payload = self.encode(data)?;
        Ok(wire::encode_envelope(
            &payload.envelope(),
            &self.config.wire_limits,
        )?)
    }

    /// Decodes framed bytes received from the transport.
    pub fn decode_from_bytes(&self, bytes: &[u8]) -> CodecResult<ReplicatedEquipmentData> {
        let envelope = wire::decode_envelope(bytes, &self.config.wire_limits).map_err(|err| {
            log::error!("rejecting payload: {err}");
            CodecError::from(err)
        })?;
        self.decode_parts(&envelope)
    }

    /// Frames an already encoded payload.
    pub fn frame(&self, payload: &CompressedPayload) -> CodecResult<Vec<u8>> {
        Ok(wire::encode_envelope(
            &payload.envelope(),
            &self.config.wire_limits,
        )?)
    }

    /// Parses framing only, without integrity checks.
    pub fn unframe(&self, bytes: &[u8]) -> CodecResult<CompressedPayload> {
        let envelope = wire::decode_envelope(bytes, &self.config.wire_limits)?;
        Ok(CompressedPayload::from_envelope(&envelope))
    }

    fn decode_parts(&self, envelope: &Envelope<'_>) -> CodecResult<ReplicatedEquipmentData> {
        let result = self.verify_and_read(envelope);
        if let Err(err) = &result {
            if err.is_integrity_failure() {
                log::error!("rejecting payload: {err}");
            } else {
                log::warn!("payload decode failed: {err}");
            }
        }
        result
    }

    fn verify_and_read(&self, envelope: &Envelope<'_>) -> CodecResult<ReplicatedEquipmentData> {
        if envelope.signature.is_empty() {
            if self.config.require_signature {
                return Err(CodecError::SignatureMissing);
            }
        } else if let Some(key) = &self.signing_key {
            verify(
                key,
                envelope.compression,
                envelope.original_size,
                envelope.body,
                envelope.signature,
            )?;
        }

        let found = crc32fast::hash(envelope.body);
        if found != envelope.crc32 {
            return Err(CodecError::ChecksumMismatch {
                expected: envelope.crc32,
                found,
            });
        }

        let original_size = envelope.original_size as usize;
        check_limit(
            LimitKind::DecompressedBytes,
            self.config.limits.max_decompressed_bytes,
            original_size,
        )?;
        let raw: Cow<'_, [u8]> = match envelope.compression {
            CompressionType::None => {
                if envelope.body.len() != original_size {
                    return Err(CodecError::SizeMismatch {
                        expected: original_size,
                        actual: envelope.body.len(),
                    });
                }
                Cow::Borrowed(envelope.body)
            }
            CompressionType::Zlib => Cow::Owned(decompress(envelope.body, original_size)?),
        };

        read_body(&raw, &self.config.limits)
    }

    fn maybe_compress(&self, raw: Vec<u8>) -> (CompressionType, Vec<u8>) {
        if !self.config.compression_enabled || raw.len() <= self.config.compression_threshold {
            return (CompressionType::None, raw);
        }
        match compress(&raw, self.config.compression_level) {
            Ok(compressed) if compressed.len() < raw.len() => (CompressionType::Zlib, compressed),
            Ok(_) => (CompressionType::None, raw),
            Err(err) => {
                log::warn!("compression failed, sending raw body: {err}");
                (CompressionType::None, raw)
            }
        }
    }
}

fn compress(raw: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::new(level));
    encoder.write_all(raw)?;
    encoder.finish()
}

fn decompress(body: &[u8], original_size: usize) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(original_size);
    // Read one byte past the declared size so oversized streams are detected
    // without inflating them completely.
    ZlibDecoder::new(body)
        .take(original_size as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|err| CodecError::Decompression {
            message: err.to_string(),
        })?;
    if out.len() != original_size {
        return Err(CodecError::SizeMismatch {
            expected: original_size,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn mac_for(
    key: &[u8],
    compression: CompressionType,
    original_size: u32,
    body: &[u8],
) -> CodecResult<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CodecError::InvalidKey)?;
    mac.update(&[compression.as_u8()]);
    mac.update(&original_size.to_le_bytes());
    mac.update(body);
    Ok(mac)
}

fn sign(
    key: &[u8],
    compression: CompressionType,
    original_size: u32,
    body: &[u8],
) -> CodecResult<Vec<u8>> {
    let mac = mac_for(key, compression, original_size, body)?;
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify(
    key: &[u8],
    compression: CompressionType,
    original_size: u32,
    body: &[u8],
    signature: &[u8],
) -> CodecResult<()> {
    mac_for(key, compression, original_size, body)?
        .verify_slice(signature)
        .map_err(|_| CodecError::SignatureMismatch)
}
