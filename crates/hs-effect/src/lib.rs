// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect wrappers for HTTP backend stubs.
//!
//! A backend never returns a bare response: it returns the response wrapped in
//! the caller's chosen [`Effect`], which decides whether work happens now
//! ([`Immediate`]) or on a runtime ([`TokioEffect`]) and how failures travel.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod immediate;
mod scheduled;

pub use immediate::Immediate;
pub use scheduled::TokioEffect;

use hs_error::StubError;

/// A container for the result of a possibly deferred, possibly failing
/// computation.
///
/// Implementations must turn a panic inside [`eval`] or [`suspend`] into a
/// failed effect carrying [`StubError::Panicked`].
///
/// [`eval`]: Effect::eval
/// [`suspend`]: Effect::suspend
pub trait Effect: Clone + Send + Sync + 'static {
    /// The wrapped form of a `T`.
    type Wrapped<T: Send + 'static>: Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Wrap an already computed value.
    fn unit<T: Send + 'static>(&self, value: T) -> Self::Wrapped<T>;

    /// A failed effect.
    fn error<T: Send + 'static>(&self, error: StubError) -> Self::Wrapped<T>;

    /// Transform the successful value.
    fn map<T, U, F>(&self, fa: Self::Wrapped<T>, f: F) -> Self::Wrapped<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static;

    /// Chain another effect onto the successful value.
    fn flat_map<T, U, F>(&self, fa: Self::Wrapped<T>, f: F) -> Self::Wrapped<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Self::Wrapped<U> + Send + 'static;

    /// Recover from a failure.
    fn handle_error<T, F>(&self, fa: Self::Wrapped<T>, f: F) -> Self::Wrapped<T>
    where
        T: Send + 'static,
        F: FnOnce(StubError) -> Self::Wrapped<T> + Send + 'static;

    /// Run `thunk` under this effect, capturing panics.
    fn eval<T, F>(&self, thunk: F) -> Self::Wrapped<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static;

    /// Run an effect-producing `thunk` under this effect, capturing panics.
    fn suspend<T, F>(&self, thunk: F) -> Self::Wrapped<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Self::Wrapped<T> + Send + 'static;

    /// Lift a `Result`.
    fn from_result<T: Send + 'static>(&self, result: Result<T, StubError>) -> Self::Wrapped<T> {
        match result {
            Ok(value) => self.unit(value),
            Err(error) => self.error(error),
        }
    }
}
