#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_convert::formats::{FormatId, registry};

/// Fuzz the SPDX tag-value decoder directly, bypassing identification.
fuzz_target!(|data: &[u8]| {
    if let Some(format) = registry().by_id(FormatId::SpdxTagValue) {
        let mut reader = data;
        let _ = format.decode(&mut reader);
    }
});
