//! Byte writer for encoding packed little-endian data.

use crate::error::{ByteError, ByteResult};

/// A growable writer for little-endian binary data.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty `ByteWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `ByteWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `f32` as its IEEE-754 bit pattern, so NaN payloads survive.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a `u16` length prefix followed by the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ByteError::LengthOverflow`] if `bytes` is longer than `u16::MAX`.
    pub fn write_bytes16(&mut self, bytes: &[u8]) -> ByteResult<()> {
        let len = u16::try_from(bytes.len()).map_err(|_| ByteError::LengthOverflow {
            length: bytes.len(),
            max: u16::MAX as usize,
        })?;
        self.write_u16(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Writes a UTF-8 string with a `u16` byte-length prefix.
    pub fn write_str16(&mut self, value: &str) -> ByteResult<()> {
        self.write_bytes16(value.as_bytes())
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        buf.append(&mut self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = ByteWriter::new();
        assert_eq!(writer.len(), 0);
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn write_u16_little_endian() {
        let mut writer = ByteWriter::new();
        writer.write_u16(0xABCD);
        assert_eq!(writer.finish(), vec![0xCD, 0xAB]);
    }

    #[test]
    fn write_u32_little_endian() {
        let mut writer = ByteWriter::new();
        writer.write_u32(0x1234_5678);
        assert_eq!(writer.finish(), vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn write_negative_i32() {
        let mut writer = ByteWriter::new();
        writer.write_i32(-1);
        assert_eq!(writer.finish(), vec![0xFF; 4]);
    }

    #[test]
    fn write_str16_prefixes_length() {
        let mut writer = ByteWriter::new();
        writer.write_str16("ak").unwrap();
        assert_eq!(writer.finish(), vec![2, 0, b'a', b'k']);
    }

    #[test]
    fn write_bytes16_rejects_oversized() {
        let mut writer = ByteWriter::new();
        let big = vec![0u8; u16::MAX as usize + 1];
        let err = writer.write_bytes16(&big).unwrap_err();
        assert!(matches!(err, ByteError::LengthOverflow { .. }));
        assert!(writer.is_empty(), "failed write must not emit a prefix");
    }

    #[test]
    fn finish_into_appends() {
        let mut writer = ByteWriter::with_capacity(4);
        writer.write_u8(7);
        let mut out = vec![1];
        writer.finish_into(&mut out);
        assert_eq!(out, vec![1, 7]);
    }
}
