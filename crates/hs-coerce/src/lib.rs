// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime coercion of stubbed response bodies.
//!
//! A stub rule supplies a body of whatever shape is convenient; the caller's
//! [`ResponseDescription`] says what shape it wants. [`coerce`] bridges the two
//! by walking the description, and [`adjust_response_body`] applies the result
//! to a whole response.
//!
//! Coercion is best effort. When no conversion exists the body is left exactly
//! as the rule produced it, and any mismatch only shows up when the caller
//! reads the body as a concrete type. This trade-off is meant for test
//! doubles and should not be copied elsewhere.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use bytes::Bytes;
use hs_core::{Body, Response, ResponseDescription, ResponseMetadata};
use tracing::trace;

/// Convert `body` into the shape `desired` asks for.
///
/// Returns `None` when the body's runtime shape has no conversion to the
/// requested one. `None` means "leave the body alone", not failure.
pub fn coerce(
    desired: &ResponseDescription,
    body: &Body,
    meta: &ResponseMetadata,
) -> Option<Body> {
    match desired {
        ResponseDescription::Ignore => Some(Body::Empty),
        ResponseDescription::ByteArray => match body {
            Body::Text(s) => Some(Body::Bytes(Bytes::copy_from_slice(s.as_bytes()))),
            Body::StaticText(s) => Some(Body::Bytes(Bytes::from_static(s.as_bytes()))),
            Body::Bytes(b) => Some(Body::Bytes(b.clone())),
            Body::ByteStream(s) => Some(Body::Bytes(s.clone().drain())),
            _ => None,
        },
        // A static body cannot become a live stream.
        ResponseDescription::Stream
        | ResponseDescription::StreamUnsafe
        | ResponseDescription::WebSocketStream => None,
        ResponseDescription::File => match body {
            Body::File(f) => Some(Body::File(f.clone())),
            _ => None,
        },
        ResponseDescription::WebSocket(f) => match body {
            Body::WebSocketStub(stub) => Some(f(stub.build())),
            Body::WebSocket(ws) => Some(f(ws.clone())),
            _ => None,
        },
        ResponseDescription::WebSocketUnsafe => match body {
            Body::WebSocketStub(stub) => Some(Body::WebSocket(stub.build())),
            _ => None,
        },
        ResponseDescription::Mapped(inner, g) => {
            coerce(inner, body, meta).and_then(|value| g(value, meta))
        }
        ResponseDescription::FromMetadata(select) => coerce(&select(meta), body, meta),
    }
}

/// Replace the body of `response` with its coerced form.
///
/// When [`coerce`] finds no conversion the response is returned unchanged.
/// This never fails.
pub fn adjust_response_body(
    response: Response<Body>,
    desired: &ResponseDescription,
) -> Response<Body> {
    let meta = response.metadata();
    match coerce(desired, &response.body, &meta) {
        Some(body) => response.with_body(body),
        None => {
            trace!(
                target: "hs.coerce",
                desired = %desired.show(),
                body = response.body.type_name(),
                "no conversion, body passed through"
            );
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::{
        ByteStream, FileHandle, ResponseAs, WebSocketFrame, WebSocketHandle, WebSocketStub,
    };
    use http::StatusCode;
    use proptest::prelude::*;

    fn meta() -> ResponseMetadata {
        ResponseMetadata::new(StatusCode::OK, "OK")
    }

    fn bytes_of(body: Option<Body>) -> Vec<u8> {
        match body {
            Some(Body::Bytes(b)) => b.to_vec(),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Leaf variants
    // -----------------------------------------------------------------------

    #[test]
    fn ignore_accepts_anything() {
        for body in [
            Body::Empty,
            Body::from("x"),
            Body::from(FileHandle::new("/tmp/f")),
            Body::from_value(12_u64),
        ] {
            assert!(matches!(
                coerce(&ResponseDescription::Ignore, &body, &meta()),
                Some(Body::Empty)
            ));
        }
    }

    #[test]
    fn byte_array_from_string_is_utf8() {
        let out = coerce(&ResponseDescription::ByteArray, &Body::from("héllo"), &meta());
        assert_eq!(bytes_of(out), "héllo".as_bytes());
    }

    #[test]
    fn byte_array_from_static_text() {
        let out = coerce(&ResponseDescription::ByteArray, &Body::StaticText("abc"), &meta());
        assert_eq!(bytes_of(out), b"abc");
    }

    #[test]
    fn websocket_transform_may_return_static_str() {
        let desired = ResponseAs::as_websocket(|_: WebSocketHandle| "opened").into_description();
        let out = coerce(&desired, &Body::from(WebSocketStub::new()), &meta()).unwrap();
        assert_eq!(out.downcast::<&'static str>().unwrap(), "opened");
    }

    #[test]
    fn byte_array_from_bytes_is_identity() {
        let out = coerce(
            &ResponseDescription::ByteArray,
            &Body::from(vec![0_u8, 159, 255]),
            &meta(),
        );
        assert_eq!(bytes_of(out), vec![0, 159, 255]);
    }

    #[test]
    fn byte_array_drains_streams() {
        let stream = ByteStream::from_chunks(["he", "llo"]);
        let out = coerce(&ResponseDescription::ByteArray, &Body::from(stream), &meta());
        assert_eq!(bytes_of(out), b"hello");
    }

    #[test]
    fn byte_array_rejects_files_and_values() {
        let desired = ResponseDescription::ByteArray;
        assert!(coerce(&desired, &Body::from(FileHandle::new("/f")), &meta()).is_none());
        assert!(coerce(&desired, &Body::from_value(1_i32), &meta()).is_none());
        assert!(coerce(&desired, &Body::Empty, &meta()).is_none());
    }

    #[test]
    fn stream_variants_never_coerce() {
        let body = Body::from(ByteStream::from_chunks(["x"]));
        for desired in [
            ResponseDescription::Stream,
            ResponseDescription::StreamUnsafe,
            ResponseDescription::WebSocketStream,
        ] {
            assert!(coerce(&desired, &body, &meta()).is_none());
        }
    }

    #[test]
    fn file_requires_file_body() {
        let file = FileHandle::new("/tmp/download.bin");
        let out = coerce(&ResponseDescription::File, &Body::from(file.clone()), &meta());
        assert!(matches!(out, Some(Body::File(f)) if f == file));
        assert!(coerce(&ResponseDescription::File, &Body::from("x"), &meta()).is_none());
    }

    // -----------------------------------------------------------------------
    // WebSockets
    // -----------------------------------------------------------------------

    #[test]
    fn websocket_materialises_stub_and_applies_transform() {
        let desired = ResponseAs::as_websocket(|ws: WebSocketHandle| {
            ws.receive_text().unwrap_or_default()
        })
        .into_description();
        let stub = WebSocketStub::initial_receive([WebSocketFrame::text("hello ws")]);
        let out = coerce(&desired, &Body::from(stub), &meta()).unwrap();
        assert_eq!(out.as_text(), Some("hello ws"));
    }

    #[test]
    fn websocket_accepts_live_handle() {
        let ws = WebSocketStub::initial_receive([WebSocketFrame::text("live")]).build();
        let desired = ResponseAs::as_websocket(|ws: WebSocketHandle| ws.is_open())
            .into_description();
        let out = coerce(&desired, &Body::from(ws), &meta()).unwrap();
        assert!(out.downcast::<bool>().unwrap());
    }

    #[test]
    fn websocket_unsafe_only_materialises_stubs() {
        let desired = ResponseDescription::WebSocketUnsafe;
        let out = coerce(&desired, &Body::from(WebSocketStub::new()), &meta());
        assert!(matches!(out, Some(Body::WebSocket(_))));

        let live = WebSocketStub::new().build();
        assert!(coerce(&desired, &Body::from(live), &meta()).is_none());
        assert!(coerce(&desired, &Body::from("x"), &meta()).is_none());
    }

    // -----------------------------------------------------------------------
    // Composed descriptions
    // -----------------------------------------------------------------------

    #[test]
    fn mapped_applies_transform_after_inner() {
        let desired = ResponseAs::as_bytes()
            .map_with_metadata(|b, meta| format!("{}:{}", meta.status.as_u16(), b.len()))
            .into_description();
        let out = coerce(&desired, &Body::from("abc"), &meta()).unwrap();
        assert_eq!(out.as_text(), Some("200:3"));
    }

    #[test]
    fn mapped_fails_when_inner_fails() {
        let desired = ResponseAs::as_file().map(|f| f.path().display().to_string());
        assert!(coerce(desired.description(), &Body::from("abc"), &meta()).is_none());
    }

    #[test]
    fn from_metadata_selects_by_status() {
        let desired = ResponseAs::as_string_either().into_description();
        let ok = coerce(&desired, &Body::from("fine"), &meta()).unwrap();
        assert_eq!(
            ok.downcast::<Result<String, String>>().unwrap(),
            Ok("fine".to_string())
        );

        let not_found = ResponseMetadata::new(StatusCode::NOT_FOUND, "Not Found");
        let err = coerce(&desired, &Body::from("missing"), &not_found).unwrap();
        assert_eq!(
            err.downcast::<Result<String, String>>().unwrap(),
            Err("missing".to_string())
        );
    }

    #[test]
    fn nested_from_metadata_and_mapped_compose() {
        let desired = ResponseAs::from_metadata(|meta| {
            let code = meta.status.as_u16();
            ResponseAs::as_string().map(move |s| format!("{code}/{s}"))
        })
        .map(|s| s.to_uppercase())
        .into_description();
        let out = coerce(&desired, &Body::from("ok"), &meta()).unwrap();
        assert_eq!(out.as_text(), Some("200/OK"));
    }

    // -----------------------------------------------------------------------
    // Whole-response adjustment
    // -----------------------------------------------------------------------

    #[test]
    fn adjust_replaces_body_on_success() {
        let response = Response::ok(Body::from("abc"));
        let adjusted = adjust_response_body(response, &ResponseDescription::ByteArray);
        assert_eq!(adjusted.body.as_bytes().map(|b| b.to_vec()), Some(b"abc".to_vec()));
        assert_eq!(adjusted.status, StatusCode::OK);
    }

    #[test]
    fn adjust_leaves_body_untouched_on_mismatch() {
        let response = Response::new(Body::from_value(99_u16), StatusCode::ACCEPTED, "Accepted");
        let adjusted = adjust_response_body(response, &ResponseDescription::ByteArray);
        assert_eq!(adjusted.status, StatusCode::ACCEPTED);
        assert_eq!(adjusted.body.downcast::<u16>().unwrap(), 99);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn byte_array_of_text_matches_utf8(s in ".*") {
            let out = coerce(&ResponseDescription::ByteArray, &Body::from(s.clone()), &meta());
            prop_assert_eq!(bytes_of(out), s.into_bytes());
        }

        #[test]
        fn byte_array_of_chunks_concatenates(chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 0..8)) {
            let expected: Vec<u8> = chunks.concat();
            let stream = ByteStream::from_chunks(chunks);
            let out = coerce(&ResponseDescription::ByteArray, &Body::from(stream), &meta());
            prop_assert_eq!(bytes_of(out), expected);
        }
    }
}
