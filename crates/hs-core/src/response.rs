// SPDX-License-Identifier: MIT OR Apache-2.0
//! Responses and the metadata view response descriptions inspect.

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use hs_error::StubError;
use std::any::type_name;

use crate::body::{Body, BodyType};

/// Status line and headers of a response, without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// Status code.
    pub status: StatusCode,
    /// Reason phrase.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
}

impl ResponseMetadata {
    /// Metadata with no headers.
    pub fn new(status: StatusCode, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: HeaderMap::new(),
        }
    }

    /// `2xx`.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `4xx`.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// `5xx`.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// A response whose body has type `T`.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// Decoded body.
    pub body: T,
    /// Status code.
    pub status: StatusCode,
    /// Reason phrase.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Earlier responses in a redirect chain, oldest first.
    pub history: Vec<Response<()>>,
}

impl<T> Response<T> {
    /// A response with no headers and no history.
    pub fn new(body: T, status: StatusCode, status_text: impl Into<String>) -> Self {
        Self {
            body,
            status,
            status_text: status_text.into(),
            headers: HeaderMap::new(),
            history: Vec::new(),
        }
    }

    /// `200 OK` carrying `body`.
    pub fn ok(body: T) -> Self {
        Self::new(body, StatusCode::OK, "OK")
    }

    /// A response with `status` and its canonical reason phrase.
    pub fn with_status(body: T, status: StatusCode) -> Self {
        Self::new(body, status, status.canonical_reason().unwrap_or(""))
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append a header given as strings.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self, StubError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| StubError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| StubError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.header(header_name, header_value))
    }

    /// Replace the redirect history.
    #[must_use]
    pub fn history(mut self, history: Vec<Response<()>>) -> Self {
        self.history = history;
        self
    }

    /// Copy of this response carrying `body` instead.
    pub fn with_body<U>(self, body: U) -> Response<U> {
        Response {
            body,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            history: self.history,
        }
    }

    /// Transform the body, keeping everything else.
    pub fn map_body<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        let Response {
            body,
            status,
            status_text,
            headers,
            history,
        } = self;
        Response {
            body: f(body),
            status,
            status_text,
            headers,
            history,
        }
    }

    /// Status line and headers.
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
        }
    }

    /// `2xx`.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl<T: BodyType> Response<T> {
    /// Erase the body type.
    pub fn into_dynamic(self) -> Response<Body> {
        self.map_body(Body::from_value)
    }
}

impl Response<Body> {
    /// Read the dynamic body as a `T`.
    ///
    /// Fails with [`StubError::BodyTypeMismatch`] when the body holds some
    /// other type.
    pub fn cast<T: BodyType>(self) -> Result<Response<T>, StubError> {
        let Response {
            body,
            status,
            status_text,
            headers,
            history,
        } = self;
        match body.downcast::<T>() {
            Ok(body) => Ok(Response {
                body,
                status,
                status_text,
                headers,
                history,
            }),
            Err(body) => Err(StubError::BodyTypeMismatch {
                expected: type_name::<T>().to_string(),
                actual: body.type_name().to_string(),
            }),
        }
    }
}
