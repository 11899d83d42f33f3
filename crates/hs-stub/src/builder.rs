// SPDX-License-Identifier: MIT OR Apache-2.0
use http::StatusCode;
use hs_core::{Body, BodyType, Request, Response};
use hs_effect::Effect;
use hs_error::StubError;
use std::sync::Arc;

use crate::StubBackend;
use crate::cyclic::CyclicResponses;
use crate::matchers::RequestMatcher;
use crate::rule::{Producer, Rule};

/// A rule under construction.
///
/// Every `then_*` method finishes the rule and returns a **new**
/// [`StubBackend`] with the rule appended; the stub the builder came from is
/// left untouched.
#[must_use = "a rule is only registered by one of the `then_*` methods"]
pub struct RuleBuilder<'a, E: Effect> {
    stub: &'a StubBackend<E>,
    matcher: RequestMatcher,
    label: String,
}

impl<'a, E: Effect> RuleBuilder<'a, E> {
    pub(crate) fn new(stub: &'a StubBackend<E>, matcher: RequestMatcher, label: &str) -> Self {
        Self {
            stub,
            matcher,
            label: label.to_string(),
        }
    }

    /// Name the rule in logs.
    pub fn labelled(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// `200` with an empty text body.
    pub fn then_respond_ok(self) -> StubBackend<E> {
        self.then_respond_with_status(StatusCode::OK)
    }

    /// `404` with body `"Not found"`.
    pub fn then_respond_not_found(self) -> StubBackend<E> {
        self.then_respond_with_code(StatusCode::NOT_FOUND, "Not found")
    }

    /// `500` with body `"Internal server error"`.
    pub fn then_respond_server_error(self) -> StubBackend<E> {
        self.then_respond_with_code(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// `status` with an empty message.
    pub fn then_respond_with_status(self, status: StatusCode) -> StubBackend<E> {
        self.then_respond_with_code(status, "")
    }

    /// `status`, with `message` as both reason phrase and text body.
    pub fn then_respond_with_code(
        self,
        status: StatusCode,
        message: impl Into<String>,
    ) -> StubBackend<E> {
        let message = message.into();
        self.then_respond_response(Response::new(Body::Text(message.clone()), status, message))
    }

    /// `200 OK` carrying `body`.
    pub fn then_respond<T: BodyType>(self, body: T) -> StubBackend<E> {
        self.then_respond_response(Response::ok(body))
    }

    /// A fixed, fully specified response.
    pub fn then_respond_response<T: BodyType>(self, response: Response<T>) -> StubBackend<E> {
        let response = response.into_dynamic();
        let effect = self.stub.effect.clone();
        self.finish(Arc::new(move |_: &Request<Body>| effect.unit(response.clone())))
    }

    /// Build the response anew on every match, inside the stub's effect.
    pub fn then_respond_lazy<T, F>(self, thunk: F) -> StubBackend<E>
    where
        T: BodyType,
        F: Fn() -> Response<T> + Send + Sync + 'static,
    {
        let thunk = Arc::new(thunk);
        let effect = self.stub.effect.clone();
        self.finish(Arc::new(move |_: &Request<Body>| {
            let thunk = Arc::clone(&thunk);
            effect.eval(move || thunk().into_dynamic())
        }))
    }

    /// Build the response from the matched request, inside the stub's effect.
    pub fn then_respond_with<T, F>(self, f: F) -> StubBackend<E>
    where
        T: BodyType,
        F: Fn(&Request<Body>) -> Response<T> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let effect = self.stub.effect.clone();
        self.finish(Arc::new(move |request: &Request<Body>| {
            let f = Arc::clone(&f);
            let request = request.clone();
            effect.eval(move || f(&request).into_dynamic())
        }))
    }

    /// `200 OK` responses carrying `bodies` in turn, wrapping around.
    ///
    /// See [`CyclicResponses`] for the concurrency caveat.
    pub fn then_respond_cyclic<T, I>(self, bodies: I) -> StubBackend<E>
    where
        T: BodyType,
        I: IntoIterator<Item = T>,
    {
        self.then_respond_cyclic_responses(bodies.into_iter().map(Response::ok))
    }

    /// `responses` in turn, wrapping around.
    ///
    /// An empty list yields a failed effect on every match.
    /// See [`CyclicResponses`] for the concurrency caveat.
    pub fn then_respond_cyclic_responses<T, I>(self, responses: I) -> StubBackend<E>
    where
        T: BodyType,
        I: IntoIterator<Item = Response<T>>,
    {
        let source = Arc::new(CyclicResponses::new(
            responses.into_iter().map(Response::into_dynamic),
        ));
        let effect = self.stub.effect.clone();
        self.finish(Arc::new(move |_: &Request<Body>| match source.advance() {
            Some(response) => effect.unit(response),
            None => effect.error(StubError::Config {
                reason: "cyclic response list is empty".into(),
            }),
        }))
    }

    /// Use an already wrapped response, e.g. a failed effect.
    pub fn then_respond_wrapped<F>(self, thunk: F) -> StubBackend<E>
    where
        F: Fn() -> E::Wrapped<Response<Body>> + Send + Sync + 'static,
    {
        self.finish(Arc::new(move |_: &Request<Body>| thunk()))
    }

    /// Use an already wrapped response built from the matched request.
    pub fn then_respond_wrapped_with<F>(self, f: F) -> StubBackend<E>
    where
        F: Fn(&Request<Body>) -> E::Wrapped<Response<Body>> + Send + Sync + 'static,
    {
        self.finish(Arc::new(f))
    }

    fn finish(self, producer: Producer<E>) -> StubBackend<E> {
        self.stub
            .push_rule(Rule::matched(self.label, self.matcher, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_backend_core::Backend;

    fn raw_text(stub: &StubBackend<hs_effect::Immediate>) -> String {
        let request = Request::get("http://h/").unwrap().erased();
        stub.send_raw(request).unwrap().status_text
    }

    #[test]
    fn builders_produce_through_the_stub_effect() {
        let base = StubBackend::synchronous();
        let fixed = base
            .match_any()
            .then_respond_response(Response::new("x", StatusCode::OK, "fixed"));
        let lazy = base
            .match_any()
            .then_respond_lazy(|| Response::new("x", StatusCode::OK, "lazy"));
        let with = base
            .match_any()
            .then_respond_with(|r| Response::new("x", StatusCode::OK, r.path().to_string()));
        let cyclic = base
            .match_any()
            .then_respond_cyclic_responses([Response::new("x", StatusCode::OK, "cyclic")]);

        assert_eq!(raw_text(&fixed), "fixed");
        assert_eq!(raw_text(&lazy), "lazy");
        assert_eq!(raw_text(&with), "/");
        assert_eq!(raw_text(&cyclic), "cyclic");
    }

    #[test]
    fn empty_cyclic_list_fails_every_match() {
        let stub = StubBackend::synchronous()
            .match_any()
            .then_respond_cyclic_responses(Vec::<Response<Body>>::new());
        let err = stub
            .send_raw(Request::get("http://h/").unwrap().erased())
            .unwrap_err();
        assert!(matches!(err, StubError::Config { .. }));
    }
}
