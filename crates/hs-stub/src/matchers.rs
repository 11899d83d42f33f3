// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composable request predicates.

use globset::GlobBuilder;
use http::Method;
use hs_core::{Body, Request};
use std::fmt;
use std::ops::Not;
use std::sync::Arc;

type MatchFn = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// A predicate over requests.
#[derive(Clone)]
pub struct RequestMatcher(MatchFn);

impl RequestMatcher {
    /// Wrap an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Request<Body>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Matches every request.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate against `request`.
    pub fn matches(&self, request: &Request<Body>) -> bool {
        (self.0)(request)
    }

    /// Both must match.
    #[must_use]
    pub fn and(self, other: RequestMatcher) -> Self {
        Self::new(move |r| self.matches(r) && other.matches(r))
    }

    /// Either may match.
    #[must_use]
    pub fn or(self, other: RequestMatcher) -> Self {
        Self::new(move |r| self.matches(r) || other.matches(r))
    }
}

impl Not for RequestMatcher {
    type Output = RequestMatcher;

    fn not(self) -> RequestMatcher {
        RequestMatcher::new(move |r| !self.matches(r))
    }
}

impl fmt::Debug for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestMatcher")
    }
}

/// Every matcher must match; an empty list matches everything.
pub fn all(matchers: impl IntoIterator<Item = RequestMatcher>) -> RequestMatcher {
    let matchers: Vec<RequestMatcher> = matchers.into_iter().collect();
    RequestMatcher::new(move |r| matchers.iter().all(|m| m.matches(r)))
}

/// At least one matcher must match; an empty list matches nothing.
pub fn any(matchers: impl IntoIterator<Item = RequestMatcher>) -> RequestMatcher {
    let matchers: Vec<RequestMatcher> = matchers.into_iter().collect();
    RequestMatcher::new(move |r| matchers.iter().any(|m| m.matches(r)))
}

/// Requests using `method`.
pub fn method(method: Method) -> RequestMatcher {
    RequestMatcher::new(move |r| r.method == method)
}

/// Requests whose path is exactly `path`.
pub fn path(path: impl Into<String>) -> RequestMatcher {
    let path = path.into();
    RequestMatcher::new(move |r| r.path() == path)
}

/// Requests whose path starts with `prefix`.
pub fn path_prefix(prefix: impl Into<String>) -> RequestMatcher {
    let prefix = prefix.into();
    RequestMatcher::new(move |r| r.path().starts_with(&prefix))
}

/// Requests whose path matches the glob `pattern`.
///
/// `*` stays within one path segment; `**` crosses segments.
pub fn path_glob(pattern: &str) -> Result<RequestMatcher, globset::Error> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();
    Ok(RequestMatcher::new(move |r| glob.is_match(r.path())))
}

/// Requests to `host`.
pub fn host(host: impl Into<String>) -> RequestMatcher {
    let host = host.into();
    RequestMatcher::new(move |r| r.uri.host() == Some(host.as_str()))
}

/// Requests carrying header `name` with exactly `value`.
pub fn header(name: impl Into<String>, value: impl Into<String>) -> RequestMatcher {
    let name = name.into();
    let value = value.into();
    RequestMatcher::new(move |r| {
        r.headers
            .get_all(name.as_str())
            .iter()
            .any(|v| v.to_str().is_ok_and(|v| v == value))
    })
}

/// Requests whose text body contains `needle`.
pub fn body_contains(needle: impl Into<String>) -> RequestMatcher {
    let needle = needle.into();
    RequestMatcher::new(move |r| {
        String::from_utf8_lossy(&r.body.to_bytes()).contains(needle.as_str())
    })
}
