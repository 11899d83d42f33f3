// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests verifying tracing output from dispatch, coercion and
//! fixture loading.

use std::sync::{Arc, Mutex};

use hs_backend_core::BackendExt;
use hs_config::{StubConfig, apply_config, log_filter, parse_toml};
use hs_core::{FileHandle, Request, ResponseAs};
use hs_stub::StubBackend;

// ---------------------------------------------------------------------------
// Shared log-capture infrastructure
// ---------------------------------------------------------------------------

/// Thread-safe buffer that captures tracing output.
#[derive(Clone, Default)]
struct LogBuf(Arc<Mutex<Vec<u8>>>);

impl LogBuf {
    fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl std::io::Write for LogBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuf {
    type Writer = LogBuf;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a tracing subscriber that captures all output into a [`LogBuf`].
/// Returns the buffer and a guard that must be held for the test duration.
fn setup_tracing() -> (LogBuf, tracing::subscriber::DefaultGuard) {
    let buf = LogBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn matched_rule_is_logged_with_label() {
    let (buf, _guard) = setup_tracing();
    let stub = StubBackend::synchronous()
        .match_any()
        .labelled("health check")
        .then_respond_ok();
    stub.send(Request::get("http://h/health").unwrap()).unwrap();

    assert!(buf.contains("hs.stub"));
    assert!(buf.contains("rule matched"));
    assert!(buf.contains("health check"));
    assert!(buf.contains("http://h/health"));
}

#[test]
fn synthesized_404_is_logged() {
    let (buf, _guard) = setup_tracing();
    StubBackend::synchronous()
        .send(Request::get("http://h/none").unwrap())
        .unwrap();
    assert!(buf.contains("no rule matched, responding 404"));
}

#[test]
fn fallback_delegation_is_logged() {
    let (buf, _guard) = setup_tracing();
    let inner = StubBackend::synchronous().match_any().then_respond("inner");
    let outer = StubBackend::synchronous().with_fallback(inner);
    outer
        .send(Request::get("http://h/x").unwrap().response_as(ResponseAs::as_string()))
        .unwrap();
    assert!(buf.contains("delegating to fallback"));
}

#[test]
fn predicate_panic_is_logged_as_warning() {
    let (buf, _guard) = setup_tracing();
    let stub = StubBackend::synchronous()
        .match_when(|_| panic!("bad predicate"))
        .then_respond_ok();
    let _ = stub.send(Request::get("http://h/").unwrap());
    let logs = buf.contents();
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("rule evaluation panicked"));
    assert!(logs.contains("bad predicate"));
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

#[test]
fn coercion_pass_through_is_traced() {
    let (buf, _guard) = setup_tracing();
    let stub = StubBackend::synchronous()
        .match_any()
        .then_respond(FileHandle::new("/tmp/report.csv"));
    let _ = stub.send(Request::get("http://h/report").unwrap());
    assert!(buf.contains("hs.coerce"));
    assert!(buf.contains("no conversion, body passed through"));
}

#[test]
fn successful_coercion_is_quiet() {
    let (buf, _guard) = setup_tracing();
    let stub = StubBackend::synchronous().match_any().then_respond("text");
    stub.send(Request::get("http://h/").unwrap()).unwrap();
    assert!(!buf.contains("hs.coerce"));
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[test]
fn applied_fixtures_are_logged() {
    let (buf, _guard) = setup_tracing();
    let cfg = parse_toml(
        r#"
        name = "billing"

        [[rules]]
        name = "invoices"
        path = "/invoices"
        response = { body = "[]" }

        [[rules]]
        name = "shadowed"
        response = { body = "never" }
        "#,
    )
    .unwrap();
    apply_config(&cfg, &StubBackend::synchronous()).unwrap();
    let logs = buf.contents();
    assert!(logs.contains("hs.config"));
    assert!(logs.contains("fixture applied"));
    assert!(logs.contains("billing"));
}

#[test]
fn fixture_warnings_are_logged() {
    let (buf, _guard) = setup_tracing();
    let cfg = parse_toml(
        r#"
        [[rules]]
        name = "everything"
        response = { status = 204 }

        [[rules]]
        name = "unreachable"
        path = "/x"
        response = { status = 200 }
        "#,
    )
    .unwrap();
    apply_config(&cfg, &StubBackend::synchronous()).unwrap();
    assert!(buf.contains("rule 'unreachable' is unreachable after catch-all rule 'everything'"));
}

// ---------------------------------------------------------------------------
// Configured level
// ---------------------------------------------------------------------------

fn capture_at(level: &str) -> (LogBuf, tracing::subscriber::DefaultGuard) {
    let config = StubConfig {
        log_level: Some(level.into()),
        ..StubConfig::default()
    };
    let buf = LogBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_env_filter(log_filter(&config).unwrap())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}

#[test]
fn configured_level_filters_stub_events() {
    let stub = StubBackend::synchronous().match_any().then_respond_ok();

    let (quiet, guard) = capture_at("warn");
    stub.send(Request::get("http://h/ok").unwrap()).unwrap();
    drop(guard);
    assert!(!quiet.contains("rule matched"));

    let (chatty, _guard) = capture_at("debug");
    stub.send(Request::get("http://h/ok").unwrap()).unwrap();
    assert!(chatty.contains("rule matched"));
}
