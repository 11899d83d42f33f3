// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory websocket test double.
//!
//! A [`WebSocketStub`] is an immutable recipe: frames the server sends right
//! away plus an optional responder that answers each frame the client sends.
//! [`WebSocketStub::build`] materialises it into a live [`WebSocketHandle`].

use bytes::Bytes;
use hs_error::StubError;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A single websocket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSocketFrame {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Bytes),
    /// A close frame.
    Close {
        /// Close status code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

impl WebSocketFrame {
    /// A text frame.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// A binary frame.
    pub fn binary(b: impl Into<Bytes>) -> Self {
        Self::Binary(b.into())
    }

    /// A normal-closure (1000) close frame.
    pub fn close() -> Self {
        Self::Close {
            code: 1000,
            reason: String::new(),
        }
    }
}

type Responder = Arc<dyn Fn(&WebSocketFrame) -> Vec<WebSocketFrame> + Send + Sync>;

// ---------------------------------------------------------------------------
// WebSocketStub
// ---------------------------------------------------------------------------

/// Recipe for a scripted websocket.
#[derive(Clone, Default)]
pub struct WebSocketStub {
    initial: Vec<WebSocketFrame>,
    responder: Option<Responder>,
}

impl WebSocketStub {
    /// A socket that sends nothing and never answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A socket that delivers `frames` to the client as soon as it opens.
    pub fn initial_receive(frames: impl IntoIterator<Item = WebSocketFrame>) -> Self {
        Self {
            initial: frames.into_iter().collect(),
            responder: None,
        }
    }

    /// Answer every frame the client sends with the frames `f` returns.
    #[must_use]
    pub fn then_respond<F>(self, f: F) -> Self
    where
        F: Fn(&WebSocketFrame) -> Vec<WebSocketFrame> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(f)),
            ..self
        }
    }

    /// Materialise a fresh live handle. Each call yields an independent socket.
    pub fn build(&self) -> WebSocketHandle {
        WebSocketHandle {
            state: Arc::new(Mutex::new(SocketState {
                inbox: self.initial.iter().cloned().collect(),
                sent: Vec::new(),
                responder: self.responder.clone(),
                open: true,
            })),
        }
    }
}

impl fmt::Debug for WebSocketStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketStub")
            .field("initial", &self.initial.len())
            .field("responds", &self.responder.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WebSocketHandle
// ---------------------------------------------------------------------------

struct SocketState {
    inbox: VecDeque<WebSocketFrame>,
    sent: Vec<WebSocketFrame>,
    responder: Option<Responder>,
    open: bool,
}

/// A live in-memory websocket. Clones share the same socket.
#[derive(Clone)]
pub struct WebSocketHandle {
    state: Arc<Mutex<SocketState>>,
}

impl WebSocketHandle {
    fn lock(&self) -> MutexGuard<'_, SocketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a frame to the server side.
    ///
    /// A close frame closes the socket. Other frames are recorded and passed
    /// to the responder, whose answers are queued for [`receive`].
    ///
    /// [`receive`]: WebSocketHandle::receive
    pub fn send(&self, frame: WebSocketFrame) -> Result<(), StubError> {
        let responder = {
            let mut state = self.lock();
            if !state.open {
                return Err(StubError::WebSocketClosed);
            }
            state.sent.push(frame.clone());
            if matches!(frame, WebSocketFrame::Close { .. }) {
                state.open = false;
                return Ok(());
            }
            state.responder.clone()
        };
        // The responder runs unlocked so it may not deadlock on this socket.
        if let Some(responder) = responder {
            let replies = responder(&frame);
            self.lock().inbox.extend(replies);
        }
        Ok(())
    }

    /// Take the next frame from the server side.
    ///
    /// Receiving a close frame closes the socket. An exhausted or closed
    /// socket yields [`StubError::WebSocketClosed`].
    pub fn receive(&self) -> Result<WebSocketFrame, StubError> {
        let mut state = self.lock();
        if !state.open {
            return Err(StubError::WebSocketClosed);
        }
        let frame = state.inbox.pop_front().ok_or(StubError::WebSocketClosed)?;
        if matches!(frame, WebSocketFrame::Close { .. }) {
            state.open = false;
        }
        Ok(frame)
    }

    /// Receive the next frame and require it to be text.
    pub fn receive_text(&self) -> Result<String, StubError> {
        match self.receive()? {
            WebSocketFrame::Text(s) => Ok(s),
            other => Err(StubError::custom(format!(
                "expected a text frame, got {other:?}"
            ))),
        }
    }

    /// Close the socket from the client side.
    pub fn close(&self) {
        self.lock().open = false;
    }

    /// Returns `true` until either side closes the socket.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Every frame the client has sent so far.
    pub fn sent(&self) -> Vec<WebSocketFrame> {
        self.lock().sent.clone()
    }

    /// Returns `true` if both handles refer to the same socket.
    pub fn same_socket(&self, other: &WebSocketHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for WebSocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("WebSocketHandle")
            .field("open", &state.open)
            .field("pending", &state.inbox.len())
            .field("sent", &state.sent.len())
            .finish()
    }
}
