// SPDX-License-Identifier: MIT OR Apache-2.0
use hs_core::{Body, Response};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed list of responses handed out in order, wrapping around forever.
///
/// This is the only mutable state a stub carries, and each instance belongs
/// to a single rule.
///
/// # Concurrency
///
/// [`advance`](CyclicResponses::advance) is a plain load followed by a store,
/// not an atomic increment. Concurrent callers may observe the same position
/// or skip one. Register one rule per thread when rotation order matters.
#[derive(Debug)]
pub struct CyclicResponses {
    responses: Vec<Response<Body>>,
    position: AtomicUsize,
}

impl CyclicResponses {
    /// Rotate through `responses`, starting with the first.
    pub fn new(responses: impl IntoIterator<Item = Response<Body>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            position: AtomicUsize::new(0),
        }
    }

    /// Number of responses in one rotation.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` when there is nothing to hand out.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// The response at the current position; moves one step forward.
    pub fn advance(&self) -> Option<Response<Body>> {
        let len = self.responses.len();
        if len == 0 {
            return None;
        }
        let current = self.position.load(Ordering::Relaxed) % len;
        self.position.store((current + 1) % len, Ordering::Relaxed);
        self.responses.get(current).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &CyclicResponses, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| {
                source
                    .advance()
                    .and_then(|r| r.body.as_text().map(str::to_owned))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn wraps_around() {
        let source = CyclicResponses::new(["a", "b", "c"].map(|s| Response::ok(Body::from(s))));
        assert_eq!(texts(&source, 7), ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn single_response_repeats() {
        let source = CyclicResponses::new([Response::ok(Body::from("only"))]);
        assert_eq!(texts(&source, 3), ["only", "only", "only"]);
    }

    #[test]
    fn empty_source_yields_nothing() {
        let source = CyclicResponses::new(Vec::new());
        assert!(source.is_empty());
        assert!(source.advance().is_none());
    }
}
