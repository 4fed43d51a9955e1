#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_convert::formats;

/// Fuzz identify + decode, and re-encode whatever decodes.
///
/// Encoding a decoded document must never panic, whatever the input held.
fuzz_target!(|data: &[u8]| {
    let Ok(sbom) = formats::decode(data) else {
        return;
    };
    for format in formats::registry().all() {
        let _ = formats::encode_to_vec(format.as_ref(), &sbom);
    }
});
