// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz body coercion with arbitrary bodies, descriptions and statuses.
//!
//! Verifies that `coerce` never panics and that the byte-array conversion
//! of text and bytes preserves content exactly.
#![no_main]
use arbitrary::Arbitrary;
use bytes::Bytes;
use hs_coerce::{adjust_response_body, coerce};
use hs_core::{Body, ByteStream, FileHandle, Response, ResponseAs, ResponseDescription, ResponseMetadata};
use http::StatusCode;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzBody {
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    Chunks(Vec<Vec<u8>>),
    File(String),
    Number(u64),
}

#[derive(Debug, Arbitrary)]
enum FuzzDescription {
    Ignore,
    ByteArray,
    String,
    StringEither,
    Stream,
    File,
}

#[derive(Debug, Arbitrary)]
struct Input {
    body: FuzzBody,
    description: FuzzDescription,
    status: u16,
}

fn body(input: &FuzzBody) -> Body {
    match input {
        FuzzBody::Empty => Body::Empty,
        FuzzBody::Text(s) => Body::Text(s.clone()),
        FuzzBody::Bytes(b) => Body::Bytes(Bytes::from(b.clone())),
        FuzzBody::Chunks(c) => Body::ByteStream(ByteStream::from_chunks(c.clone())),
        FuzzBody::File(p) => Body::File(FileHandle::new(p)),
        FuzzBody::Number(n) => Body::from_value(*n),
    }
}

fn description(input: &FuzzDescription) -> ResponseDescription {
    match input {
        FuzzDescription::Ignore => ResponseDescription::Ignore,
        FuzzDescription::ByteArray => ResponseDescription::ByteArray,
        FuzzDescription::String => ResponseAs::as_string().into_description(),
        FuzzDescription::StringEither => ResponseAs::as_string_either().into_description(),
        FuzzDescription::Stream => ResponseDescription::Stream,
        FuzzDescription::File => ResponseDescription::File,
    }
}

fuzz_target!(|input: Input| {
    let Ok(status) = StatusCode::from_u16(input.status) else {
        return;
    };
    let meta = ResponseMetadata::new(status, "");
    let body = body(&input.body);
    let desired = description(&input.description);

    let coerced = coerce(&desired, &body, &meta);
    if let (ResponseDescription::ByteArray, Body::Text(s), Some(Body::Bytes(b))) =
        (&desired, &body, &coerced)
    {
        assert_eq!(s.as_bytes(), &b[..]);
    }
    if matches!(desired, ResponseDescription::Ignore) {
        assert!(matches!(coerced, Some(Body::Empty)));
    }

    let _ = adjust_response_body(Response::new(body, status, ""), &desired);
});
