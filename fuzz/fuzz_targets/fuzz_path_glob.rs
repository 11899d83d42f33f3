// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz path-glob matchers.
//!
//! Compiles arbitrary patterns and evaluates them against arbitrary request
//! paths, verifying that neither compilation nor matching panics and that a
//! literal pattern always matches its own path.
#![no_main]
use arbitrary::Arbitrary;
use hs_core::Request;
use hs_stub::matchers::path_glob;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    pattern: String,
    segments: Vec<String>,
}

fuzz_target!(|input: Input| {
    let path: String = input
        .segments
        .iter()
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|s| format!("/{s}"))
        .collect();
    let path = if path.is_empty() { "/".to_string() } else { path };
    let Ok(request) = Request::get(&format!("http://fuzz{path}")) else {
        return;
    };
    let request = request.into_erased();

    if let Ok(matcher) = path_glob(&input.pattern) {
        let _ = matcher.matches(&request);
    }

    let literal = path_glob(&path).expect("alphanumeric paths are valid globs");
    assert!(literal.matches(&request));
});
