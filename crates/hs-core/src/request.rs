// SPDX-License-Identifier: MIT OR Apache-2.0
//! Outgoing requests as seen by a backend.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use hs_error::StubError;
use std::fmt;

use crate::body::Body;
use crate::response_as::ResponseAs;

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl RequestBody {
    /// The body as bytes.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Self::Bytes(b) => b.clone(),
        }
    }
}

/// An outgoing request whose response should decode to a `T`.
pub struct Request<T> {
    /// HTTP method.
    pub method: Method,
    /// Target URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: RequestBody,
    /// How the response body should be decoded.
    pub response_as: ResponseAs<T>,
}

impl<T> Clone for Request<T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            response_as: self.response_as.clone(),
        }
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("response_as", &self.response_as)
            .finish()
    }
}

fn parse_uri(uri: &str) -> Result<Uri, StubError> {
    uri.parse::<Uri>().map_err(|e| StubError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

impl Request<Bytes> {
    /// A request for `uri` whose response is read as bytes.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            response_as: ResponseAs::as_bytes(),
        }
    }

    /// Parse `uri` and build a request for it.
    pub fn try_new(method: Method, uri: &str) -> Result<Self, StubError> {
        Ok(Self::new(method, parse_uri(uri)?))
    }

    /// `GET uri`.
    pub fn get(uri: &str) -> Result<Self, StubError> {
        Self::try_new(Method::GET, uri)
    }

    /// `POST uri`.
    pub fn post(uri: &str) -> Result<Self, StubError> {
        Self::try_new(Method::POST, uri)
    }

    /// `PUT uri`.
    pub fn put(uri: &str) -> Result<Self, StubError> {
        Self::try_new(Method::PUT, uri)
    }

    /// `DELETE uri`.
    pub fn delete(uri: &str) -> Result<Self, StubError> {
        Self::try_new(Method::DELETE, uri)
    }
}

impl<T> Request<T> {
    /// Append a header given as strings.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, StubError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| StubError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| StubError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    /// Use a text body.
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body = RequestBody::Text(text.into());
        self
    }

    /// Use a byte body.
    #[must_use]
    pub fn body_bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(bytes.into());
        self
    }

    /// Decode the response with `response_as` instead.
    pub fn response_as<U>(self, response_as: ResponseAs<U>) -> Request<U> {
        Request {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
            response_as,
        }
    }

    /// A copy of this request typed as producing a dynamic [`Body`].
    pub fn erased(&self) -> Request<Body> {
        self.clone().into_erased()
    }

    /// This request typed as producing a dynamic [`Body`].
    pub fn into_erased(self) -> Request<Body> {
        let response_as = self.response_as.erase();
        self.response_as(response_as)
    }

    /// Path component of the URI.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
