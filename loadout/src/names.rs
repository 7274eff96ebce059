//! Registry that resolves 16-bit hashes back to names.

use std::collections::HashMap;

use crate::error::{LoadoutError, LoadoutResult};
use crate::hash::{item_id_hash16, property_key_hash16};
use crate::item::props;

/// Maps item and property hashes to their names.
///
/// Registration fails on a collision, so any hash this table resolves is
/// unambiguous.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    items: HashMap<u16, String>,
    properties: HashMap<u16, String>,
}

impl NameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the standard property keys registered.
    #[must_use]
    pub fn with_standard_properties() -> Self {
        let mut table = Self::new();
        for key in props::STANDARD {
            // Standard keys are known not to collide with each other.
            let _ = table.register_property(key);
        }
        table
    }

    /// Registers an item id, returning its hash.
    pub fn register_item(&mut self, item_id: &str) -> LoadoutResult<u16> {
        register(&mut self.items, item_id_hash16(item_id), item_id)
    }

    /// Registers a property key, returning its hash.
    pub fn register_property(&mut self, key: &str) -> LoadoutResult<u16> {
        register(&mut self.properties, property_key_hash16(key), key)
    }

    #[must_use]
    pub fn item_name(&self, hash: u16) -> Option<&str> {
        self.items.get(&hash).map(String::as_str)
    }

    #[must_use]
    pub fn property_name(&self, hash: u16) -> Option<&str> {
        self.properties.get(&hash).map(String::as_str)
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

fn register(map: &mut HashMap<u16, String>, hash: u16, name: &str) -> LoadoutResult<u16> {
    match map.get(&hash) {
        Some(existing) if existing == name => Ok(hash),
        Some(existing) => {
            log::error!("name hash collision 0x{hash:04X}: '{name}' vs '{existing}'");
            Err(LoadoutError::HashCollision {
                hash,
                existing: existing.clone(),
                incoming: name.to_owned(),
            })
        }
        None => {
            map.insert(hash, name.to_owned());
            Ok(hash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let mut table = NameTable::new();
        let hash = table.register_item("Rifle_AK").unwrap();
        assert_eq!(hash, item_id_hash16("Rifle_AK"));
        assert_eq!(table.item_name(hash), Some("Rifle_AK"));
        assert_eq!(table.property_name(hash), None);
    }

    #[test]
    fn register_is_idempotent() {
        let mut table = NameTable::new();
        let a = table.register_item("Medkit").unwrap();
        let b = table.register_item("Medkit").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.item_count(), 1);
    }

    #[test]
    fn collision_is_rejected() {
        let mut map = HashMap::new();
        register(&mut map, 42, "first").unwrap();
        let err = register(&mut map, 42, "second").unwrap_err();
        assert_eq!(
            err,
            LoadoutError::HashCollision {
                hash: 42,
                existing: "first".into(),
                incoming: "second".into(),
            }
        );
        assert_eq!(map.get(&42).map(String::as_str), Some("first"));
    }

    #[test]
    fn standard_properties_registered() {
        let table = NameTable::with_standard_properties();
        assert_eq!(table.property_count(), props::STANDARD.len());
        let ammo = property_key_hash16(props::AMMO);
        assert_eq!(table.property_name(ammo), Some(props::AMMO));
    }
}
