#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz structural format identification.
///
/// Runs every registered sniffer over arbitrary bytes, including invalid
/// UTF-8 and truncated JSON or XML.
fuzz_target!(|data: &[u8]| {
    let _ = sbom_convert::formats::identify(data);
});
