// SPDX-License-Identifier: MIT OR Apache-2.0
//! Programmable stub backend.
//!
//! A [`StubBackend`] answers requests from an ordered list of rules instead of
//! the network. Rules are added with [`StubBackend::match_when`],
//! [`StubBackend::match_any`] or [`StubBackend::match_partial`] and finished
//! with one of the [`RuleBuilder`] `then_*` methods, each of which returns a
//! new stub:
//!
//! ```
//! use hs_backend_core::BackendExt;
//! use hs_core::{Request, ResponseAs};
//! use hs_stub::StubBackend;
//!
//! let stub = StubBackend::synchronous()
//!     .match_when(|r| r.path() == "/ping")
//!     .then_respond("pong");
//!
//! let request = Request::get("http://localhost/ping")
//!     .unwrap()
//!     .response_as(ResponseAs::as_string());
//! let response = stub.send(request).unwrap();
//! assert_eq!(response.body, "pong");
//! ```
//!
//! The first matching rule wins. Its body is coerced to the shape the request
//! asks for (see `hs_coerce`). Unmatched requests go to the fallback backend
//! when one is configured, and otherwise get a `404`.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod cyclic;
pub mod matchers;
mod rule;

pub use builder::RuleBuilder;
pub use cyclic::CyclicResponses;
pub use matchers::RequestMatcher;
pub use rule::{PartialMapping, Producer, Rule};

use http::{StatusCode, Uri};
use hs_backend_core::{Backend, SharedBackend};
use hs_coerce::adjust_response_body;
use hs_core::{Body, Request, Response};
use hs_effect::{Effect, Immediate, TokioEffect};
use hs_error::StubError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// An immutable, composable request-dispatch backend for tests.
pub struct StubBackend<E: Effect> {
    effect: E,
    rules: Vec<Rule<E>>,
    fallback: Option<SharedBackend<E>>,
}

impl StubBackend<Immediate> {
    /// A stub whose responses are plain `Result`s.
    pub fn synchronous() -> Self {
        Self::new(Immediate)
    }
}

impl StubBackend<TokioEffect> {
    /// A stub whose responses are futures; lazy producers run on `handle`.
    pub fn asynchronous(handle: Handle) -> Self {
        Self::new(TokioEffect::new(handle))
    }
}

impl<E: Effect> StubBackend<E> {
    /// An empty stub using `effect`.
    pub fn new(effect: E) -> Self {
        Self {
            effect,
            rules: Vec::new(),
            fallback: None,
        }
    }

    /// A copy of this stub that forwards unmatched requests to `fallback`.
    pub fn with_fallback<B: Backend<E> + 'static>(&self, fallback: B) -> Self {
        Self {
            effect: self.effect.clone(),
            rules: self.rules.clone(),
            fallback: Some(Arc::new(fallback)),
        }
    }

    /// Start a rule for requests satisfying `predicate`.
    pub fn match_when<F>(&self, predicate: F) -> RuleBuilder<'_, E>
    where
        F: Fn(&Request<Body>) -> bool + Send + Sync + 'static,
    {
        RuleBuilder::new(self, RequestMatcher::new(predicate), "when")
    }

    /// Start a rule for requests satisfying `matcher`.
    pub fn match_with(&self, matcher: RequestMatcher) -> RuleBuilder<'_, E> {
        RuleBuilder::new(self, matcher, "when")
    }

    /// Start a rule matching every request.
    pub fn match_any(&self) -> RuleBuilder<'_, E> {
        RuleBuilder::new(self, RequestMatcher::always(), "any")
    }

    /// A copy of this stub with `mapping` appended as a single rule.
    ///
    /// Requests for which `mapping` returns `None` fall through to the rules
    /// registered after it.
    pub fn match_partial<F>(&self, mapping: F) -> Self
    where
        F: Fn(&Request<Body>) -> Option<Response<Body>> + Send + Sync + 'static,
    {
        self.push_rule(Rule::partial("partial", Arc::new(mapping)))
    }

    /// Registered rules, in match order.
    pub fn rules(&self) -> &[Rule<E>] {
        &self.rules
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when unmatched requests are forwarded.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub(crate) fn push_rule(&self, rule: Rule<E>) -> Self {
        let mut rules = Vec::with_capacity(self.rules.len() + 1);
        rules.extend(self.rules.iter().cloned());
        rules.push(rule);
        Self {
            effect: self.effect.clone(),
            rules,
            fallback: self.fallback.clone(),
        }
    }

    fn find_response(
        &self,
        request: &Request<Body>,
    ) -> Option<(&Rule<E>, E::Wrapped<Response<Body>>)> {
        self.rules.iter().find_map(|rule| {
            rule.apply(request, &self.effect)
                .map(|response| (rule, response))
        })
    }
}

fn not_found(uri: &Uri) -> Response<Body> {
    Response::new(
        Body::Text(format!("Not Found: {uri}")),
        StatusCode::NOT_FOUND,
        "Not Found",
    )
}

impl<E: Effect> Backend<E> for StubBackend<E> {
    fn effect(&self) -> &E {
        &self.effect
    }

    fn send_raw(&self, request: Request<Body>) -> E::Wrapped<Response<Body>> {
        let matched = panic::catch_unwind(AssertUnwindSafe(|| self.find_response(&request)));
        match matched {
            Ok(Some((rule, produced))) => {
                debug!(
                    target: "hs.stub",
                    rule = rule.label(),
                    method = %request.method,
                    uri = %request.uri,
                    "rule matched"
                );
                let desired = request.response_as.into_description();
                let effect = self.effect.clone();
                self.effect.flat_map(produced, move |response| {
                    effect.eval(move || adjust_response_body(response, &desired))
                })
            }
            Ok(None) => match &self.fallback {
                Some(fallback) => {
                    debug!(
                        target: "hs.stub",
                        method = %request.method,
                        uri = %request.uri,
                        "no rule matched, delegating to fallback"
                    );
                    fallback.send_raw(request)
                }
                None => {
                    debug!(
                        target: "hs.stub",
                        method = %request.method,
                        uri = %request.uri,
                        "no rule matched, responding 404"
                    );
                    let uri = request.uri;
                    let desired = request.response_as.into_description();
                    self.effect
                        .eval(move || adjust_response_body(not_found(&uri), &desired))
                }
            },
            Err(payload) => {
                let err = StubError::from_panic(payload);
                warn!(target: "hs.stub", uri = %request.uri, error = %err, "rule evaluation panicked");
                self.effect.error(err)
            }
        }
    }

    fn close(&self) -> E::Wrapped<()> {
        self.effect.unit(())
    }
}

impl<E: Effect> Clone for StubBackend<E> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
            rules: self.rules.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<E: Effect> fmt::Debug for StubBackend<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.rules.iter().map(Rule::label).collect();
        f.debug_struct("StubBackend")
            .field("effect", &self.effect.name())
            .field("rules", &labels)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
