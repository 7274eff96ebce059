//! Deterministic identifier hashing for the packed codec.
//!
//! 16-bit hashes are never zero; zero is reserved for "no item".

use blake3::Hasher;

use crate::ids::InstanceId;

const ITEM_DOMAIN: &[u8] = b"gearsync.item";
const PROPERTY_DOMAIN: &[u8] = b"gearsync.property";
const INSTANCE_DOMAIN: &[u8] = b"gearsync.instance";

/// Hashes an item definition id to 16 bits.
#[must_use]
pub fn item_id_hash16(item_id: &str) -> u16 {
    nonzero16(digest(ITEM_DOMAIN, item_id.as_bytes()))
}

/// Hashes a runtime property key to 16 bits.
#[must_use]
pub fn property_key_hash16(key: &str) -> u16 {
    nonzero16(digest(PROPERTY_DOMAIN, key.as_bytes()))
}

/// Hashes an instance id to 32 bits.
#[must_use]
pub fn instance_hash32(instance_id: &InstanceId) -> u32 {
    let bytes = digest(INSTANCE_DOMAIN, instance_id.as_bytes());
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn digest(domain: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    write_u16(&mut hasher, domain.len() as u16);
    hasher.update(domain);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

fn nonzero16(bytes: [u8; 32]) -> u16 {
    match u16::from_le_bytes([bytes[0], bytes[1]]) {
        0 => u16::from_le_bytes([bytes[2], bytes[3]]).max(1),
        hash => hash,
    }
}

fn write_u16(hasher: &mut Hasher, value: u16) {
    hasher.update(&value.to_le_bytes());
}
