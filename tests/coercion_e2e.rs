// SPDX-License-Identifier: MIT OR Apache-2.0
//! Response coercion observed through the stub's `send`.

use bytes::Bytes;
use hs_backend_core::{Backend, BackendExt};
use hs_core::{Body, ByteStream, FileHandle, Request, Response, ResponseAs};
use hs_error::{ErrorCode, StubError};
use hs_stub::StubBackend;
use http::StatusCode;

fn stub_with<T: hs_core::BodyType>(body: T) -> StubBackend<hs_effect::Immediate> {
    StubBackend::synchronous().match_any().then_respond(body)
}

fn request() -> Request<Bytes> {
    Request::get("http://h/resource").unwrap()
}

#[test]
fn text_body_reads_as_bytes_and_string() {
    let stub = stub_with("hello");
    assert_eq!(stub.send(request()).unwrap().body, Bytes::from_static(b"hello"));
    let text = stub
        .send(request().response_as(ResponseAs::as_string()))
        .unwrap();
    assert_eq!(text.body, "hello");
}

#[test]
fn byte_bodies_read_as_text() {
    let stub = stub_with(vec![0x68_u8, 0x69]);
    let text = stub
        .send(request().response_as(ResponseAs::as_string()))
        .unwrap();
    assert_eq!(text.body, "hi");

    let chunked = stub_with(ByteStream::from_chunks(["ab", "cd"]));
    assert_eq!(chunked.send(request()).unwrap().body, Bytes::from_static(b"abcd"));
}

#[test]
fn mapped_reads_may_produce_static_str() {
    let stub = stub_with("hello");
    let constant = stub
        .send(request().response_as(ResponseAs::as_bytes().map(|_| "constant")))
        .unwrap();
    assert_eq!(constant.body, "constant");

    let raw = stub.send_raw(request().erased()).unwrap();
    assert_eq!(raw.body.as_bytes(), Some(&Bytes::from_static(b"hello")));
}

#[test]
fn ignore_discards_any_body() {
    let stub = stub_with(FileHandle::new("/tmp/x"));
    let response = stub.send(request().response_as(ResponseAs::ignore())).unwrap();
    assert_eq!(response.body, ());
}

#[test]
fn mapped_description_sees_metadata() {
    let stub = StubBackend::synchronous()
        .match_any()
        .then_respond_response(
            Response::with_status("payload", StatusCode::PARTIAL_CONTENT)
                .try_header("x-part", "2")
                .unwrap(),
        );
    let described = ResponseAs::as_string().map_with_metadata(|body, meta| {
        format!("{}:{}:{}", meta.status.as_u16(), meta.header("x-part").unwrap_or("?"), body)
    });
    let response = stub.send(request().response_as(described)).unwrap();
    assert_eq!(response.body, "206:2:payload");
}

#[test]
fn description_chosen_from_metadata() {
    let stub = StubBackend::synchronous()
        .match_when(|r| r.path() == "/ok")
        .then_respond("fine")
        .match_any()
        .then_respond_server_error();
    let description = || {
        ResponseAs::from_metadata(|meta| {
            if meta.is_server_error() {
                ResponseAs::as_string().map(|s| s.len())
            } else {
                ResponseAs::as_string().map(|_| 0)
            }
        })
    };
    let ok = stub
        .send(Request::get("http://h/ok").unwrap().response_as(description()))
        .unwrap();
    let failed = stub
        .send(Request::get("http://h/err").unwrap().response_as(description()))
        .unwrap();
    assert_eq!(ok.body, 0);
    assert_eq!(failed.body, "Internal server error".len());
}

#[test]
fn file_bodies_satisfy_as_file() {
    let stub = stub_with(FileHandle::new("/tmp/download.bin"));
    let response = stub.send(request().response_as(ResponseAs::as_file())).unwrap();
    assert_eq!(response.body.path(), std::path::Path::new("/tmp/download.bin"));
}

#[test]
fn streams_pass_through_unconverted() {
    let stub = stub_with(ByteStream::from_chunks(["x"]));
    let response = stub.send(request().response_as(ResponseAs::as_stream())).unwrap();
    assert_eq!(response.body.chunks(), [Bytes::from_static(b"x")]);
}

#[test]
fn unconvertible_body_surfaces_only_when_read() {
    let stub = stub_with(FileHandle::new("/tmp/x"));

    // The raw send never fails: the body is left exactly as produced.
    let raw = stub.send_raw(request().into_erased()).unwrap();
    assert!(matches!(raw.body, Body::File(_)));

    // Reading it as the requested type is where the mismatch shows.
    let err = stub.send(request()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BodyTypeMismatch);
    assert!(matches!(err, StubError::BodyTypeMismatch { .. }));
}

#[test]
fn custom_value_bodies_round_trip() {
    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: u32,
    }

    let stub = stub_with(User { id: 7 });
    let raw = stub.send_raw(request().into_erased()).unwrap();
    let user = raw.cast::<User>().unwrap();
    assert_eq!(user.body, User { id: 7 });
}
