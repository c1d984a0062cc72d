//! Fuzz target for the rule battery and the normalizer.
//!
//! Any parsable table must validate and normalize without panicking,
//! and validation must be deterministic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vigil::{Normalizer, NormalizerConfig, Parser, ValidationConfig, Validator};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    // Header + fuzzed rows, so every rule sees real columns.
    let config = ValidationConfig::features_daily();
    let csv = format!("{}\n{}\n", config.expected_columns.join(","), content);
    let Ok(table) = Parser::new().parse_bytes(csv.as_bytes(), b',') else {
        return;
    };

    let first = Validator::new(&table, &config).validate();
    let second = Validator::new(&table, &config).validate();
    assert_eq!(first.report, second.report);

    let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
    if normalizer.fit_transform(&table).is_ok() {
        let _ = normalizer.transform(&table);
    }
});
