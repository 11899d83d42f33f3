// SPDX-License-Identifier: MIT OR Apache-2.0
use hs_core::{Body, Request, Response};
use hs_effect::Effect;
use std::fmt;
use std::sync::Arc;

use crate::matchers::RequestMatcher;

/// Produces the (wrapped) response for a matched request.
pub type Producer<E> =
    Arc<dyn Fn(&Request<Body>) -> <E as Effect>::Wrapped<Response<Body>> + Send + Sync>;

/// A partial request-to-response mapping; `None` means "not handled".
pub type PartialMapping = Arc<dyn Fn(&Request<Body>) -> Option<Response<Body>> + Send + Sync>;

enum RuleKind<E: Effect> {
    Matched {
        matcher: RequestMatcher,
        producer: Producer<E>,
    },
    Partial(PartialMapping),
}

/// One registered stub rule. Immutable once created.
pub struct Rule<E: Effect> {
    label: String,
    kind: RuleKind<E>,
}

impl<E: Effect> Rule<E> {
    /// A predicate plus a response producer.
    pub fn matched(label: impl Into<String>, matcher: RequestMatcher, producer: Producer<E>) -> Self {
        Self {
            label: label.into(),
            kind: RuleKind::Matched { matcher, producer },
        }
    }

    /// A partial mapping whose defined results are returned as-is.
    pub fn partial(label: impl Into<String>, mapping: PartialMapping) -> Self {
        Self {
            label: label.into(),
            kind: RuleKind::Partial(mapping),
        }
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` for rules registered from a partial mapping.
    pub fn is_partial(&self) -> bool {
        matches!(self.kind, RuleKind::Partial(_))
    }

    /// The wrapped response for `request`, or `None` if this rule does not
    /// handle it.
    pub fn apply(&self, request: &Request<Body>, effect: &E) -> Option<E::Wrapped<Response<Body>>> {
        match &self.kind {
            RuleKind::Matched { matcher, producer } => {
                matcher.matches(request).then(|| producer(request))
            }
            RuleKind::Partial(mapping) => mapping(request).map(|response| effect.unit(response)),
        }
    }
}

impl<E: Effect> Clone for Rule<E> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            RuleKind::Matched { matcher, producer } => RuleKind::Matched {
                matcher: matcher.clone(),
                producer: Arc::clone(producer),
            },
            RuleKind::Partial(mapping) => RuleKind::Partial(Arc::clone(mapping)),
        };
        Self {
            label: self.label.clone(),
            kind,
        }
    }
}

impl<E: Effect> fmt::Debug for Rule<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("partial", &self.is_partial())
            .finish()
    }
}
