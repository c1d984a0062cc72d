//! Fuzz target for the delimited-text parser.
//!
//! The parser must never panic on malformed input, whatever the
//! delimiter or quoting.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vigil::Parser;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    for delimiter in [b',', b'\t', b';'] {
        let _ = parser.parse_bytes(data, delimiter);
    }
});
