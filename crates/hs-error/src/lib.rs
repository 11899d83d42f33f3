// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy with stable error codes for the HTTP backend stub.
//!
//! Every failure a stub can report travels as a [`StubError`]. Each variant
//! maps to a machine-readable [`ErrorCode`], which in turn belongs to a broad
//! [`ErrorCategory`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rule matching and response production.
    Dispatch,
    /// Reading a response body as a typed value.
    Coercion,
    /// In-memory websocket handles.
    #[serde(rename = "websocket")]
    WebSocket,
    /// Malformed request parts.
    Request,
    /// Fixture configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dispatch => "dispatch",
            Self::Coercion => "coercion",
            Self::WebSocket => "websocket",
            Self::Request => "request",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Dispatch --
    /// A predicate or response producer panicked.
    DispatchPanicked,
    /// A response producer deliberately returned a failed effect.
    DispatchFailed,
    /// A spawned producer task was cancelled before it finished.
    DispatchCancelled,

    // -- Coercion --
    /// The dynamic body could not be read as the requested type.
    BodyTypeMismatch,

    // -- WebSocket --
    /// The websocket was closed or has no more frames to deliver.
    WebSocketClosed,

    // -- Request --
    /// The request URI could not be parsed.
    RequestInvalidUri,
    /// A request header name or value is invalid.
    RequestInvalidHeader,

    // -- Config --
    /// Stub fixture configuration is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DispatchPanicked | Self::DispatchFailed | Self::DispatchCancelled => {
                ErrorCategory::Dispatch
            }
            Self::BodyTypeMismatch => ErrorCategory::Coercion,
            Self::WebSocketClosed => ErrorCategory::WebSocket,
            Self::RequestInvalidUri | Self::RequestInvalidHeader => ErrorCategory::Request,
            Self::ConfigInvalid => ErrorCategory::Config,
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"BODY_TYPE_MISMATCH"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DispatchPanicked => "DISPATCH_PANICKED",
            Self::DispatchFailed => "DISPATCH_FAILED",
            Self::DispatchCancelled => "DISPATCH_CANCELLED",
            Self::BodyTypeMismatch => "BODY_TYPE_MISMATCH",
            Self::WebSocketClosed => "WEB_SOCKET_CLOSED",
            Self::RequestInvalidUri => "REQUEST_INVALID_URI",
            Self::RequestInvalidHeader => "REQUEST_INVALID_HEADER",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StubError
// ---------------------------------------------------------------------------

/// Errors surfaced by stub backends, effects and the request/response model.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    /// A predicate, partial mapping or lazy producer panicked.
    #[error("stub evaluation panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// A failure injected on purpose, typically by a test.
    #[error("{message}")]
    Custom {
        /// Human-readable description.
        message: String,
    },

    /// A spawned producer task was cancelled.
    #[error("stub task cancelled: {reason}")]
    Cancelled {
        /// Why the task did not complete.
        reason: String,
    },

    /// A dynamic response body could not be read as the requested type.
    #[error("response body of type `{actual}` cannot be read as `{expected}`")]
    BodyTypeMismatch {
        /// Type the caller asked for.
        expected: String,
        /// Type actually held by the body.
        actual: String,
    },

    /// The websocket is closed or has nothing left to receive.
    #[error("websocket closed")]
    WebSocketClosed,

    /// A request URI failed to parse.
    #[error("invalid uri '{uri}': {reason}")]
    InvalidUri {
        /// Offending input.
        uri: String,
        /// Parser detail.
        reason: String,
    },

    /// A header name or value is invalid.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Offending header name.
        name: String,
        /// Parser detail.
        reason: String,
    },

    /// Stub fixtures could not be turned into rules.
    #[error("invalid stub configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// Any other error raised by caller code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StubError {
    /// Shorthand for [`StubError::Custom`].
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Convert a caught panic payload into [`StubError::Panicked`].
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }

    /// The stable [`ErrorCode`] for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Panicked { .. } => ErrorCode::DispatchPanicked,
            Self::Custom { .. } => ErrorCode::DispatchFailed,
            Self::Cancelled { .. } => ErrorCode::DispatchCancelled,
            Self::BodyTypeMismatch { .. } => ErrorCode::BodyTypeMismatch,
            Self::WebSocketClosed => ErrorCode::WebSocketClosed,
            Self::InvalidUri { .. } => ErrorCode::RequestInvalidUri,
            Self::InvalidHeader { .. } => ErrorCode::RequestInvalidHeader,
            Self::Config { .. } => ErrorCode::ConfigInvalid,
            Self::Other(_) => ErrorCode::Internal,
        }
    }

    /// Shorthand for `self.code().category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }
}
