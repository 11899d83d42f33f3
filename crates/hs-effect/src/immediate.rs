// SPDX-License-Identifier: MIT OR Apache-2.0
use hs_error::StubError;
use std::panic::{self, AssertUnwindSafe};

use crate::Effect;

/// Synchronous effect: everything runs on the calling thread, right away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

impl Effect for Immediate {
    type Wrapped<T: Send + 'static> = Result<T, StubError>;

    fn name(&self) -> &'static str {
        "immediate"
    }

    fn unit<T: Send + 'static>(&self, value: T) -> Result<T, StubError> {
        Ok(value)
    }

    fn error<T: Send + 'static>(&self, error: StubError) -> Result<T, StubError> {
        Err(error)
    }

    fn map<T, U, F>(&self, fa: Result<T, StubError>, f: F) -> Result<U, StubError>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        fa.map(f)
    }

    fn flat_map<T, U, F>(&self, fa: Result<T, StubError>, f: F) -> Result<U, StubError>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, StubError> + Send + 'static,
    {
        fa.and_then(f)
    }

    fn handle_error<T, F>(&self, fa: Result<T, StubError>, f: F) -> Result<T, StubError>
    where
        T: Send + 'static,
        F: FnOnce(StubError) -> Result<T, StubError> + Send + 'static,
    {
        fa.or_else(f)
    }

    fn eval<T, F>(&self, thunk: F) -> Result<T, StubError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        panic::catch_unwind(AssertUnwindSafe(thunk)).map_err(StubError::from_panic)
    }

    fn suspend<T, F>(&self, thunk: F) -> Result<T, StubError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, StubError> + Send + 'static,
    {
        panic::catch_unwind(AssertUnwindSafe(thunk)).unwrap_or_else(|payload| {
            Err(StubError::from_panic(payload))
        })
    }
}
