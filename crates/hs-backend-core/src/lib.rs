// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Shared backend abstraction.
//!
//! [`Backend`] is object safe so backends can be stored behind
//! [`SharedBackend`] (for example as a stub's fallback). Typed sends go
//! through [`BackendExt::send`].

use hs_core::{Body, BodyType, Request, Response};
use hs_effect::Effect;
use std::sync::Arc;

/// Something that executes requests and returns responses wrapped in `E`.
pub trait Backend<E: Effect>: Send + Sync {
    /// The effect responses are wrapped in.
    fn effect(&self) -> &E;

    /// Execute `request`, producing a response with a dynamic body.
    fn send_raw(&self, request: Request<Body>) -> E::Wrapped<Response<Body>>;

    /// Release any resources held by the backend.
    fn close(&self) -> E::Wrapped<()> {
        self.effect().unit(())
    }
}

/// A backend behind a shared, type-erased pointer.
pub type SharedBackend<E> = Arc<dyn Backend<E>>;

impl<E: Effect, B: Backend<E> + ?Sized> Backend<E> for Arc<B> {
    fn effect(&self) -> &E {
        (**self).effect()
    }

    fn send_raw(&self, request: Request<Body>) -> E::Wrapped<Response<Body>> {
        (**self).send_raw(request)
    }

    fn close(&self) -> E::Wrapped<()> {
        (**self).close()
    }
}

/// Typed convenience layer over [`Backend`].
pub trait BackendExt<E: Effect>: Backend<E> {
    /// Execute `request` and read the body as the request's `T`.
    ///
    /// A body that does not hold a `T` fails the effect with
    /// [`hs_error::StubError::BodyTypeMismatch`].
    fn send<T: BodyType>(&self, request: Request<T>) -> E::Wrapped<Response<T>> {
        let effect = self.effect().clone();
        let raw = self.send_raw(request.into_erased());
        self.effect()
            .flat_map(raw, move |response| effect.from_result(response.cast::<T>()))
    }
}

impl<E: Effect, B: Backend<E> + ?Sized> BackendExt<E> for B {}
