// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamically typed response bodies.
//!
//! Stub rules hand back bodies of whatever shape is convenient (a string,
//! some bytes, a websocket test double, a fully decoded domain value), while
//! callers describe the shape they want with a [`ResponseAs`]. [`Body`] is the
//! tagged union that sits between the two. Everything outside the coercion
//! boundary stays statically typed.
//!
//! [`ResponseAs`]: crate::ResponseAs

use bytes::{Bytes, BytesMut};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::websocket::{WebSocketHandle, WebSocketStub};

/// Values that can travel inside a [`Body`].
pub trait BodyType: Any + Clone + Send + Sync {}

impl<T: Any + Clone + Send + Sync> BodyType for T {}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A response body whose concrete type is only known at runtime.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body; reads as `()`.
    #[default]
    Empty,
    /// UTF-8 text.
    Text(String),
    /// UTF-8 text known at compile time; reads as `&'static str` or `String`.
    StaticText(&'static str),
    /// Raw bytes.
    Bytes(Bytes),
    /// A chunked byte stream.
    ByteStream(ByteStream),
    /// A file on disk.
    File(FileHandle),
    /// A live websocket handle.
    WebSocket(WebSocketHandle),
    /// A websocket test double that has not been materialised yet.
    WebSocketStub(WebSocketStub),
    /// Any other value, usually a fully decoded domain type.
    Value(DynValue),
}

impl Body {
    /// Wrap `value`, normalising well-known types into their dedicated variant.
    ///
    /// `String`, `&'static str`, `Bytes`, `Vec<u8>`, `()`, the stream, file
    /// and websocket types all get their own variant; a `Body` is returned
    /// unchanged and anything else becomes [`Body::Value`].
    pub fn from_value<T: BodyType>(value: T) -> Body {
        let value = match same_type::<T, Body>(value) {
            Ok(body) => return body,
            Err(v) => v,
        };
        let value = match same_type::<T, ()>(value) {
            Ok(()) => return Body::Empty,
            Err(v) => v,
        };
        let value = match same_type::<T, String>(value) {
            Ok(s) => return Body::Text(s),
            Err(v) => v,
        };
        let value = match same_type::<T, &'static str>(value) {
            Ok(s) => return Body::StaticText(s),
            Err(v) => v,
        };
        let value = match same_type::<T, Bytes>(value) {
            Ok(b) => return Body::Bytes(b),
            Err(v) => v,
        };
        let value = match same_type::<T, Vec<u8>>(value) {
            Ok(b) => return Body::Bytes(Bytes::from(b)),
            Err(v) => v,
        };
        let value = match same_type::<T, ByteStream>(value) {
            Ok(s) => return Body::ByteStream(s),
            Err(v) => v,
        };
        let value = match same_type::<T, FileHandle>(value) {
            Ok(f) => return Body::File(f),
            Err(v) => v,
        };
        let value = match same_type::<T, WebSocketHandle>(value) {
            Ok(ws) => return Body::WebSocket(ws),
            Err(v) => v,
        };
        match same_type::<T, WebSocketStub>(value) {
            Ok(stub) => Body::WebSocketStub(stub),
            Err(v) => Body::Value(DynValue::new(v)),
        }
    }

    /// Read the body as a `T`, handing the body back untouched on mismatch.
    ///
    /// The inverse of [`Body::from_value`]. `Body` itself is always a valid
    /// target, `Vec<u8>` reads a [`Body::Bytes`] and `String` reads a
    /// [`Body::StaticText`].
    pub fn downcast<T: BodyType>(self) -> Result<T, Body> {
        let body = match same_type::<Body, T>(self) {
            Ok(t) => return Ok(t),
            Err(body) => body,
        };
        match body {
            Body::Empty => same_type::<(), T>(()).map_err(|()| Body::Empty),
            Body::Text(s) => same_type(s).map_err(Body::Text),
            Body::StaticText(s) => same_type::<&'static str, T>(s)
                .or_else(|s| same_type(s.to_owned()).map_err(|_| Body::StaticText(s))),
            Body::Bytes(b) if TypeId::of::<T>() == TypeId::of::<Vec<u8>>() => {
                same_type(b.to_vec()).map_err(|v| Body::Bytes(Bytes::from(v)))
            }
            Body::Bytes(b) => same_type(b).map_err(Body::Bytes),
            Body::ByteStream(s) => same_type(s).map_err(Body::ByteStream),
            Body::File(f) => same_type(f).map_err(Body::File),
            Body::WebSocket(ws) => same_type(ws).map_err(Body::WebSocket),
            Body::WebSocketStub(stub) => same_type(stub).map_err(Body::WebSocketStub),
            Body::Value(v) => v.downcast().map_err(Body::Value),
        }
    }

    /// Name of the type held by this body, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Body::Empty => "()",
            Body::Text(_) => type_name::<String>(),
            Body::StaticText(_) => type_name::<&'static str>(),
            Body::Bytes(_) => type_name::<Bytes>(),
            Body::ByteStream(_) => type_name::<ByteStream>(),
            Body::File(_) => type_name::<FileHandle>(),
            Body::WebSocket(_) => type_name::<WebSocketHandle>(),
            Body::WebSocketStub(_) => type_name::<WebSocketStub>(),
            Body::Value(v) => v.type_name(),
        }
    }

    /// Borrow the text of a [`Body::Text`] or [`Body::StaticText`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            Body::StaticText(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the bytes of a [`Body::Bytes`].
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns `true` for [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::StaticText(s)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(b))
    }
}

impl From<ByteStream> for Body {
    fn from(s: ByteStream) -> Self {
        Body::ByteStream(s)
    }
}

impl From<FileHandle> for Body {
    fn from(f: FileHandle) -> Self {
        Body::File(f)
    }
}

impl From<WebSocketHandle> for Body {
    fn from(ws: WebSocketHandle) -> Self {
        Body::WebSocket(ws)
    }
}

impl From<WebSocketStub> for Body {
    fn from(stub: WebSocketStub) -> Self {
        Body::WebSocketStub(stub)
    }
}

/// Move `value` out as a `V` when `U` and `V` are the same type.
fn same_type<U: Any, V: Any>(value: U) -> Result<V, U> {
    if TypeId::of::<U>() != TypeId::of::<V>() {
        return Err(value);
    }
    let boxed: Box<dyn Any> = Box::new(value);
    match boxed.downcast::<V>() {
        Ok(v) => Ok(*v),
        Err(_) => unreachable!("type ids were compared above"),
    }
}

// ---------------------------------------------------------------------------
// DynValue
// ---------------------------------------------------------------------------

/// A cloneable, type-erased value with its type name attached.
#[derive(Clone)]
pub struct DynValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DynValue {
    /// Erase `value`.
    pub fn new<T: BodyType>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the erased type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the erased value is a `T`.
    pub fn is<T: BodyType>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Recover the value as a `T`, cloning only when the value is shared.
    pub fn downcast<T: BodyType>(self) -> Result<T, DynValue> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(arc) => Ok(Arc::unwrap_or_clone(arc)),
            Err(inner) => Err(DynValue { inner, type_name }),
        }
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynValue").field(&self.type_name).finish()
    }
}

// ---------------------------------------------------------------------------
// ByteStream
// ---------------------------------------------------------------------------

/// An ordered sequence of byte chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStream {
    chunks: Vec<Bytes>,
}

impl ByteStream {
    /// Build a stream from chunks.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        self.chunks.push(chunk.into());
    }

    /// Borrow the chunks in order.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Total number of bytes across all chunks.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Returns `true` when the stream carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the stream, concatenating every chunk.
    pub fn drain(self) -> Bytes {
        if self.chunks.len() == 1 {
            return self.chunks.into_iter().next().unwrap_or_default();
        }
        let mut buf = BytesMut::with_capacity(self.len());
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk);
        }
        buf.freeze()
    }
}

// ---------------------------------------------------------------------------
// FileHandle
// ---------------------------------------------------------------------------

/// Reference to a file a response body was (or would be) written to.
///
/// The stub never touches the file system; the handle only names the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    /// Point at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
