// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data model shared by every HTTP backend stub crate.
//!
//! * [`Request`] / [`Response`] / [`ResponseMetadata`]: the request and
//!   response views a backend consumes and produces.
//! * [`Body`]: the dynamically typed response body used at the coercion
//!   boundary.
//! * [`ResponseAs`]: a typed description of how a caller wants a body decoded,
//!   backed by the closed [`ResponseDescription`] enum.
//! * [`WebSocketStub`] / [`WebSocketHandle`]: an in-memory websocket test
//!   double and the live handle it materialises into.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod request;
pub mod response;
pub mod response_as;
pub mod websocket;

pub use body::{Body, BodyType, ByteStream, DynValue, FileHandle};
pub use request::{Request, RequestBody};
pub use response::{Response, ResponseMetadata};
pub use response_as::{MapFn, ResponseAs, ResponseDescription, SelectFn, WebSocketFn};
pub use websocket::{WebSocketFrame, WebSocketHandle, WebSocketStub};
