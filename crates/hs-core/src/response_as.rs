// SPDX-License-Identifier: MIT OR Apache-2.0
//! Descriptions of how a caller wants a response body decoded.
//!
//! [`ResponseDescription`] is the closed, recursive set of decoding variants.
//! [`ResponseAs<T>`] wraps one and records the type `T` the description
//! produces, so the public API stays typed while the stub works on the
//! erased form.

use bytes::Bytes;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::body::{Body, BodyType, ByteStream, FileHandle};
use crate::response::ResponseMetadata;
use crate::websocket::WebSocketHandle;

/// Transform applied by [`ResponseDescription::Mapped`].
///
/// Returns `None` when the inner value is not of the type the transform was
/// written for.
pub type MapFn = Arc<dyn Fn(Body, &ResponseMetadata) -> Option<Body> + Send + Sync>;

/// Selector used by [`ResponseDescription::FromMetadata`].
pub type SelectFn = Arc<dyn Fn(&ResponseMetadata) -> ResponseDescription + Send + Sync>;

/// Transform applied to a live handle by [`ResponseDescription::WebSocket`].
pub type WebSocketFn = Arc<dyn Fn(WebSocketHandle) -> Body + Send + Sync>;

/// How to turn a raw body into a decoded value.
#[derive(Clone)]
pub enum ResponseDescription {
    /// Discard the body.
    Ignore,
    /// Read the whole body as bytes.
    ByteArray,
    /// Hand the body over as a stream.
    Stream,
    /// Hand the body over as a stream the caller must drain.
    StreamUnsafe,
    /// Write the body to a file.
    File,
    /// Open a websocket and apply a transform to the handle.
    WebSocket(WebSocketFn),
    /// Open a websocket and return the bare handle.
    WebSocketUnsafe,
    /// Pipe a websocket through a stream processor.
    WebSocketStream,
    /// Decode with the inner description, then transform the result.
    Mapped(Box<ResponseDescription>, MapFn),
    /// Pick the description from the response metadata.
    FromMetadata(SelectFn),
}

impl ResponseDescription {
    /// Short human-readable rendering, e.g. `"mapped(as bytes)"`.
    pub fn show(&self) -> String {
        match self {
            Self::Ignore => "ignore".into(),
            Self::ByteArray => "as bytes".into(),
            Self::Stream => "as stream".into(),
            Self::StreamUnsafe => "as stream unsafe".into(),
            Self::File => "as file".into(),
            Self::WebSocket(_) => "as websocket".into(),
            Self::WebSocketUnsafe => "as websocket unsafe".into(),
            Self::WebSocketStream => "as websocket stream".into(),
            Self::Mapped(inner, _) => format!("mapped({})", inner.show()),
            Self::FromMetadata(_) => "from metadata".into(),
        }
    }
}

impl fmt::Debug for ResponseDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

/// A [`ResponseDescription`] known to produce values of type `T`.
pub struct ResponseAs<T> {
    description: ResponseDescription,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResponseAs<T> {
    fn clone(&self) -> Self {
        Self::from_description(self.description.clone())
    }
}

impl<T> fmt::Debug for ResponseAs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseAs").field(&self.description).finish()
    }
}

impl<T> ResponseAs<T> {
    fn from_description(description: ResponseDescription) -> Self {
        Self {
            description,
            _marker: PhantomData,
        }
    }

    /// The erased description.
    pub fn description(&self) -> &ResponseDescription {
        &self.description
    }

    /// Take the erased description.
    pub fn into_description(self) -> ResponseDescription {
        self.description
    }

    /// The same description, typed as producing a dynamic [`Body`].
    pub fn erase(&self) -> ResponseAs<Body> {
        ResponseAs::from_description(self.description.clone())
    }

    /// See [`ResponseDescription::show`].
    pub fn show(&self) -> String {
        self.description.show()
    }
}

impl ResponseAs<()> {
    /// Discard the body.
    pub fn ignore() -> Self {
        Self::from_description(ResponseDescription::Ignore)
    }

    /// Pipe a websocket through a stream processor.
    pub fn as_websocket_stream() -> Self {
        Self::from_description(ResponseDescription::WebSocketStream)
    }
}

impl ResponseAs<Bytes> {
    /// Read the whole body as bytes.
    pub fn as_bytes() -> Self {
        Self::from_description(ResponseDescription::ByteArray)
    }
}

impl ResponseAs<String> {
    /// Read the body as text, replacing invalid UTF-8.
    pub fn as_string() -> Self {
        ResponseAs::as_bytes().map(|b| String::from_utf8_lossy(&b).into_owned())
    }
}

impl ResponseAs<Result<String, String>> {
    /// Read the body as text: `Ok` for `2xx` responses, `Err` otherwise.
    pub fn as_string_either() -> Self {
        ResponseAs::from_metadata(|meta| {
            if meta.is_success() {
                ResponseAs::as_string().map(Ok)
            } else {
                ResponseAs::as_string().map(Err)
            }
        })
    }
}

impl ResponseAs<ByteStream> {
    /// Hand the body over as a stream.
    pub fn as_stream() -> Self {
        Self::from_description(ResponseDescription::Stream)
    }

    /// Hand the body over as a stream the caller must drain.
    pub fn as_stream_unsafe() -> Self {
        Self::from_description(ResponseDescription::StreamUnsafe)
    }
}

impl ResponseAs<FileHandle> {
    /// Write the body to a file.
    pub fn as_file() -> Self {
        Self::from_description(ResponseDescription::File)
    }
}

impl ResponseAs<WebSocketHandle> {
    /// Open a websocket and return the bare handle.
    pub fn as_websocket_unsafe() -> Self {
        Self::from_description(ResponseDescription::WebSocketUnsafe)
    }
}

impl<T: BodyType> ResponseAs<T> {
    /// Open a websocket and hand the live handle to `f`.
    pub fn as_websocket<F>(f: F) -> Self
    where
        F: Fn(WebSocketHandle) -> T + Send + Sync + 'static,
    {
        Self::from_description(ResponseDescription::WebSocket(Arc::new(move |ws| {
            Body::from_value(f(ws))
        })))
    }

    /// Transform the decoded value.
    pub fn map<U, F>(self, f: F) -> ResponseAs<U>
    where
        U: BodyType,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_with_metadata(move |value, _| f(value))
    }

    /// Transform the decoded value, with access to the response metadata.
    pub fn map_with_metadata<U, F>(self, f: F) -> ResponseAs<U>
    where
        U: BodyType,
        F: Fn(T, &ResponseMetadata) -> U + Send + Sync + 'static,
    {
        let map: MapFn = Arc::new(move |body, meta| {
            body.downcast::<T>()
                .ok()
                .map(|value| Body::from_value(f(value, meta)))
        });
        ResponseAs::from_description(ResponseDescription::Mapped(
            Box::new(self.description),
            map,
        ))
    }

    /// Choose the description once the response metadata is known.
    pub fn from_metadata<F>(select: F) -> Self
    where
        F: Fn(&ResponseMetadata) -> ResponseAs<T> + Send + Sync + 'static,
    {
        Self::from_description(ResponseDescription::FromMetadata(Arc::new(move |meta| {
            select(meta).into_description()
        })))
    }
}
