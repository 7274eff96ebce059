#![no_main]

use codec::{decode_packed, CodecLimits};
use libfuzzer_sys::fuzz_target;
use loadout::NameTable;

fuzz_target!(|data: &[u8]| {
    let mut names = NameTable::with_standard_properties();
    let _ = names.register_item("Rifle_AK");
    let _ = names.register_item("Medkit");

    let limits = CodecLimits::for_testing();
    if let Ok(packed) = decode_packed(data, &names, &limits) {
        assert!(packed.slots.len() <= limits.max_slots);
        for slot in &packed.slots {
            if let Some(item) = &slot.item {
                assert!(item.properties.len() <= limits.max_properties_per_item);
            }
        }
    }
});
