// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz fixture TOML parsing, validation and application.
//!
//! Feeds arbitrary byte strings through `parse_toml`, `validate_config` and
//! `apply_config`, verifying:
//! 1. `parse_toml` never panics on arbitrary input.
//! 2. Successfully parsed configs can be validated without panics.
//! 3. A config that validates can always be applied to a stub.
//! 4. Round-trip: serialize back to TOML and re-parse produces the same config.
#![no_main]
use hs_config::{apply_config, parse_toml, validate_config};
use hs_stub::StubBackend;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    // --- Property 1: parse_toml never panics ---
    let config = match parse_toml(s) {
        Ok(c) => c,
        Err(_) => return,
    };

    // --- Property 2 and 3: validation and application agree ---
    match validate_config(&config) {
        Ok(warnings) => {
            for w in &warnings {
                let _ = format!("{w}");
            }
            let stub = apply_config(&config, &StubBackend::synchronous())
                .expect("validated config must apply");
            assert_eq!(stub.rule_count(), config.rules.len());
        }
        Err(e) => {
            let _ = format!("{e}");
        }
    }

    // --- Property 4: round-trip through TOML serialization ---
    if let Ok(toml_str) = toml::to_string(&config) {
        if let Ok(rt) = parse_toml(&toml_str) {
            assert_eq!(config, rt, "TOML round-trip must be lossless");
        }
    }

    if let Ok(json) = serde_json::to_string(&config) {
        let _ = serde_json::from_str::<hs_config::StubConfig>(&json);
    }
});
