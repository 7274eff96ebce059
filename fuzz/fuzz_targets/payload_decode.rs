#![no_main]

use codec::{CodecConfig, PayloadCodec};
use libfuzzer_sys::fuzz_target;
use loadout::EquipmentState;

fuzz_target!(|data: &[u8]| {
    let _ = wire::decode_envelope(data, &wire::Limits::for_testing());

    let unsigned = PayloadCodec::new(CodecConfig::for_testing());
    if let Ok(decoded) = unsigned.decode_from_bytes(data) {
        let _ = unsigned.encode_to_bytes(&decoded);
        let mut state = EquipmentState::new(256);
        let _ = state.apply(&decoded);
    }

    let signed = PayloadCodec::new(CodecConfig::for_testing()).with_signing_key(b"fuzz-key".to_vec());
    let _ = signed.decode_from_bytes(data);
});
