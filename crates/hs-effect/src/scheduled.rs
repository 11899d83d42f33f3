// SPDX-License-Identifier: MIT OR Apache-2.0
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use hs_error::StubError;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use crate::Effect;

/// Asynchronous effect backed by boxed futures.
///
/// Deferred work ([`Effect::eval`], [`Effect::suspend`]) is spawned on the
/// runtime behind the handle given at construction; nothing is taken from
/// ambient global state.
#[derive(Debug, Clone)]
pub struct TokioEffect {
    handle: Handle,
}

impl TokioEffect {
    /// Schedule deferred work on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule deferred work on the runtime this is called from.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// The runtime handle deferred work is spawned on.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

fn join_error(err: JoinError) -> StubError {
    if err.is_panic() {
        StubError::from_panic(err.into_panic())
    } else {
        StubError::Cancelled {
            reason: err.to_string(),
        }
    }
}

async fn join<T>(task: JoinHandle<T>) -> Result<T, StubError> {
    task.await.map_err(join_error)
}

impl Effect for TokioEffect {
    type Wrapped<T: Send + 'static> = BoxFuture<'static, Result<T, StubError>>;

    fn name(&self) -> &'static str {
        "tokio"
    }

    fn unit<T: Send + 'static>(&self, value: T) -> BoxFuture<'static, Result<T, StubError>> {
        future::ready(Ok(value)).boxed()
    }

    fn error<T: Send + 'static>(&self, error: StubError) -> BoxFuture<'static, Result<T, StubError>> {
        future::ready(Err(error)).boxed()
    }

    fn map<T, U, F>(
        &self,
        fa: BoxFuture<'static, Result<T, StubError>>,
        f: F,
    ) -> BoxFuture<'static, Result<U, StubError>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        fa.map(|result| result.map(f)).boxed()
    }

    fn flat_map<T, U, F>(
        &self,
        fa: BoxFuture<'static, Result<T, StubError>>,
        f: F,
    ) -> BoxFuture<'static, Result<U, StubError>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> BoxFuture<'static, Result<U, StubError>> + Send + 'static,
    {
        async move {
            let value = fa.await?;
            f(value).await
        }
        .boxed()
    }

    fn handle_error<T, F>(
        &self,
        fa: BoxFuture<'static, Result<T, StubError>>,
        f: F,
    ) -> BoxFuture<'static, Result<T, StubError>>
    where
        T: Send + 'static,
        F: FnOnce(StubError) -> BoxFuture<'static, Result<T, StubError>> + Send + 'static,
    {
        async move {
            match fa.await {
                Ok(value) => Ok(value),
                Err(err) => f(err).await,
            }
        }
        .boxed()
    }

    fn eval<T, F>(&self, thunk: F) -> BoxFuture<'static, Result<T, StubError>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        join(self.handle.spawn(async move { thunk() })).boxed()
    }

    fn suspend<T, F>(&self, thunk: F) -> BoxFuture<'static, Result<T, StubError>>
    where
        T: Send + 'static,
        F: FnOnce() -> BoxFuture<'static, Result<T, StubError>> + Send + 'static,
    {
        let task = self.handle.spawn(async move { thunk().await });
        async move { join(task).await? }.boxed()
    }
}
