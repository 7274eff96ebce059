//! Payload envelope framing for gearsync.
//!
//! This crate handles the binary envelope that carries an encoded equipment
//! payload: compression tag, sizes, checksum and optional signature. It does
//! not know about slots or items, only the structure of the envelope.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Field order and widths are fixed and little-endian.
//! - **Bounded decoding** - All length fields are validated against limits before use.
//! - **No domain knowledge** - Integrity checks and body parsing live in the codec.

mod envelope;
mod error;
mod limits;

pub use envelope::{
    decode_envelope, encode_envelope, CompressionType, Envelope, ENVELOPE_OVERHEAD,
};
pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use limits::Limits;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn public_api_exports() {
        let _ = ENVELOPE_OVERHEAD;
        let _ = CompressionType::Zlib;
        let _ = Limits::default();
        let _: WireResult<()> = Ok(());
    }

    #[test]
    fn envelope_overhead_constant_correct() {
        assert_eq!(
            ENVELOPE_OVERHEAD,
            size_of::<u8>() // compression
                + size_of::<u32>() // original_size
                + size_of::<u32>() // body_len
                + size_of::<u32>() // crc32
                + size_of::<u16>() // signature_len
        );
    }
}
