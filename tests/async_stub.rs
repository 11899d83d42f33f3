// SPDX-License-Identifier: MIT OR Apache-2.0
//! The stub driven by the tokio-backed effect.

use hs_backend_core::{Backend, BackendExt};
use hs_core::{Body, Request, Response, ResponseAs};
use hs_effect::{Effect, TokioEffect};
use hs_error::StubError;
use hs_stub::StubBackend;
use http::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Handle;

fn get(uri: &str) -> Request<String> {
    Request::get(uri)
        .unwrap()
        .response_as(ResponseAs::as_string())
}

#[tokio::test]
async fn async_stub_answers_in_rule_order() {
    let stub = StubBackend::asynchronous(Handle::current())
        .match_when(|r| r.path() == "/a")
        .then_respond("a")
        .match_any()
        .then_respond("any");
    assert_eq!(stub.send(get("http://h/a")).await.unwrap().body, "a");
    assert_eq!(stub.send(get("http://h/b")).await.unwrap().body, "any");
}

#[tokio::test]
async fn async_404_is_successful() {
    let stub = StubBackend::asynchronous(Handle::current());
    let response = stub.send(get("http://h/missing")).await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Not Found: http://h/missing");
}

#[tokio::test]
async fn lazy_producer_runs_once_per_send() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let stub = StubBackend::asynchronous(Handle::current())
        .match_any()
        .then_respond_lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Response::ok("lazy")
        });

    let response = stub.send(get("http://h/")).await.unwrap();
    assert_eq!(response.body, "lazy");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_producer_fails_the_future() {
    let stub = StubBackend::asynchronous(Handle::current())
        .match_any()
        .then_respond_lazy(|| -> Response<String> { panic!("async boom") });
    let err = stub.send(get("http://h/")).await.unwrap_err();
    assert!(matches!(err, StubError::Panicked { ref message } if message == "async boom"));
}

#[tokio::test]
async fn predicate_panic_fails_the_future() {
    let stub = StubBackend::asynchronous(Handle::current())
        .match_when(|_| panic!("bad predicate"))
        .then_respond_ok();
    let err = stub.send(get("http://h/")).await.unwrap_err();
    assert!(matches!(err, StubError::Panicked { .. }));
}

#[tokio::test]
async fn wrapped_failure_is_returned_as_is() {
    let effect = TokioEffect::current();
    let stub = StubBackend::new(effect.clone())
        .match_any()
        .then_respond_wrapped(move || effect.error(StubError::custom("timeout")));
    let err = stub.send(get("http://h/")).await.unwrap_err();
    assert_eq!(err.to_string(), "timeout");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shared_stub_serves_concurrent_requests() {
    let stub = Arc::new(
        StubBackend::asynchronous(Handle::current())
            .match_any()
            .then_respond_with(|r| Response::ok(r.path().to_string())),
    );
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let stub = Arc::clone(&stub);
            tokio::spawn(async move { stub.send(get(&format!("http://h/{i}"))).await })
        })
        .collect();
    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.body, format!("/{i}"));
    }
}

#[tokio::test]
async fn explicit_handle_from_another_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let stub = StubBackend::asynchronous(runtime.handle().clone())
        .match_any()
        .then_respond_lazy(|| Response::ok(Body::from("elsewhere")));
    let response = stub
        .send(Request::get("http://h/").unwrap().response_as(ResponseAs::as_string()))
        .await
        .unwrap();
    assert_eq!(response.body, "elsewhere");
    stub.close().await.unwrap();
    runtime.shutdown_background();
}
