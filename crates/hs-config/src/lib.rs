// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixture files for the HTTP stub backend.
//!
//! A [`StubConfig`] describes stub rules declaratively, usually in a TOML file
//! checked in next to the tests that use it:
//!
//! ```toml
//! name = "users-api"
//!
//! [[rules]]
//! name = "list users"
//! method = "GET"
//! path = "/users"
//! response = { status = 200, body = "[]" }
//!
//! [[rules]]
//! name = "flaky health check"
//! path = "/health"
//! cyclic = [{ status = 503 }, { status = 200, body = "ok" }]
//! ```
//!
//! [`apply_config`] turns each fixture into one stub rule, in file order, and
//! [`init_logging`] installs a subscriber at the file's `log_level`.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use hs_core::{Body, Response};
use hs_effect::Effect;
use hs_stub::StubBackend;
use hs_stub::matchers::{self, RequestMatcher};
use http::{HeaderName, HeaderValue, Method, StatusCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading, validating, or applying fixtures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested fixture file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory issues that do not prevent the fixtures from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A rule can never match because an earlier rule matches everything.
    ShadowedRule {
        /// The unreachable rule.
        rule: String,
        /// The catch-all rule before it.
        by: String,
    },
    /// A cyclic rule has no responses and fails every matching request.
    EmptyCyclic {
        /// The offending rule.
        rule: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::ShadowedRule { rule, by } => {
                write!(f, "rule '{rule}' is unreachable after catch-all rule '{by}'")
            }
            ConfigWarning::EmptyCyclic { rule } => {
                write!(f, "rule '{rule}' has an empty cyclic list")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A set of stub fixtures.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct StubConfig {
    /// Human-readable name of the stubbed service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Fixture rules, in match order.
    #[serde(default)]
    pub rules: Vec<FixtureRule>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            name: None,
            log_level: Some("info".into()),
            rules: Vec::new(),
        }
    }
}

/// One declarative stub rule.
///
/// All present criteria must match. A rule with no criteria matches every
/// request.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct FixtureRule {
    /// Label used in logs and warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// HTTP method to match (e.g. `"GET"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Path glob to match; `*` stays within one segment, `**` crosses them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Headers that must be present with exactly these values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Fixed response. Exclusive with `cyclic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<FixtureResponse>,

    /// Responses returned in turn, wrapping around. Exclusive with `response`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclic: Option<Vec<FixtureResponse>>,
}

impl FixtureRule {
    /// The rule's name, or its position when unnamed.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("rule #{}", index + 1))
    }

    /// Returns `true` when the rule has no match criteria.
    pub fn is_catch_all(&self) -> bool {
        self.method.is_none() && self.path.is_none() && self.headers.is_empty()
    }
}

/// A canned response.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct FixtureResponse {
    /// Status code (100..=999).
    #[serde(default = "default_status")]
    pub status: u16,

    /// Reason phrase; defaults to the canonical one for `status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,

    /// Text body; absent means empty text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Response headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for FixtureResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            status_text: None,
            body: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_status() -> u16 {
    200
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Environment variable overriding [`StubConfig::log_level`].
pub const LOG_LEVEL_ENV: &str = "HTTP_STUB_LOG_LEVEL";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`StubConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`StubConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<StubConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => StubConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`StubConfig`].
pub fn parse_toml(content: &str) -> Result<StubConfig, ConfigError> {
    toml::from_str::<StubConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `HTTP_STUB_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut StubConfig) {
    if let Ok(val) = std::env::var(LOG_LEVEL_ENV) {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Tracing filter enabling the stub's `hs.*` targets at the configured level.
///
/// A missing `log_level` means `info`.
pub fn log_filter(config: &StubConfig) -> Result<EnvFilter, ConfigError> {
    let level = config.log_level.as_deref().unwrap_or("info");
    if !VALID_LOG_LEVELS.contains(&level) {
        return Err(invalid(format!("invalid log_level '{level}'")));
    }
    Ok(EnvFilter::new(format!("hs={level}")))
}

/// Install a global `fmt` subscriber filtered by [`log_filter`].
///
/// Returns `Ok(false)` when another global subscriber is already installed.
pub fn init_logging(config: &StubConfig) -> Result<bool, ConfigError> {
    let filter = log_filter(config)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (bad methods, globs, statuses, or headers, and rules without
/// exactly one of `response` and `cyclic`) are returned together as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &StubConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(level) = &config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    let mut catch_all: Option<String> = None;
    for (index, rule) in config.rules.iter().enumerate() {
        let label = rule.label(index);

        if let Some(by) = &catch_all {
            warnings.push(ConfigWarning::ShadowedRule {
                rule: label.clone(),
                by: by.clone(),
            });
        }

        if let Some(method) = &rule.method {
            if parse_method(method).is_err() {
                errors.push(format!("rule '{label}': invalid method '{method}'"));
            }
        }
        if let Some(path) = &rule.path {
            if let Err(e) = matchers::path_glob(path) {
                errors.push(format!("rule '{label}': invalid path glob '{path}': {e}"));
            }
        }
        for name in rule.headers.keys() {
            if HeaderName::try_from(name.as_str()).is_err() {
                errors.push(format!("rule '{label}': invalid header name '{name}'"));
            }
        }

        match (&rule.response, &rule.cyclic) {
            (None, None) => errors.push(format!(
                "rule '{label}': one of 'response' or 'cyclic' is required"
            )),
            (Some(_), Some(_)) => errors.push(format!(
                "rule '{label}': 'response' and 'cyclic' are mutually exclusive"
            )),
            (Some(response), None) => validate_response(&label, response, &mut errors),
            (None, Some(cyclic)) => {
                if cyclic.is_empty() {
                    warnings.push(ConfigWarning::EmptyCyclic {
                        rule: label.clone(),
                    });
                }
                for response in cyclic {
                    validate_response(&label, response, &mut errors);
                }
            }
        }

        if catch_all.is_none() && rule.is_catch_all() {
            catch_all = Some(label);
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

fn validate_response(label: &str, response: &FixtureResponse, errors: &mut Vec<String>) {
    if StatusCode::from_u16(response.status).is_err() {
        errors.push(format!(
            "rule '{label}': status {} out of range (100..=999)",
            response.status
        ));
    }
    for (name, value) in &response.headers {
        if HeaderName::try_from(name.as_str()).is_err() {
            errors.push(format!("rule '{label}': invalid response header name '{name}'"));
        }
        if HeaderValue::try_from(value.as_str()).is_err() {
            errors.push(format!(
                "rule '{label}': invalid value for response header '{name}'"
            ));
        }
    }
}

fn parse_method(method: &str) -> Result<Method, http::method::InvalidMethod> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// Overlay rules are placed before base rules so they win on overlap.
pub fn merge_configs(base: StubConfig, overlay: StubConfig) -> StubConfig {
    let mut rules = overlay.rules;
    rules.extend(base.rules);
    StubConfig {
        name: overlay.name.or(base.name),
        log_level: overlay.log_level.or(base.log_level),
        rules,
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Append one rule per fixture in `config` to `stub`, in file order.
///
/// The configuration is validated first; warnings are logged and the first
/// hard error aborts. `stub` itself is not modified.
pub fn apply_config<E: Effect>(
    config: &StubConfig,
    stub: &StubBackend<E>,
) -> Result<StubBackend<E>, ConfigError> {
    for warning in validate_config(config)? {
        warn!(target: "hs.config", %warning, "fixture warning");
    }

    let mut current = stub.clone();
    for (index, rule) in config.rules.iter().enumerate() {
        let label = rule.label(index);
        let builder = current.match_with(fixture_matcher(rule)?).labelled(label.clone());
        current = match (&rule.response, &rule.cyclic) {
            (Some(response), _) => builder.then_respond_response(fixture_response(response)?),
            (None, Some(cyclic)) => builder.then_respond_cyclic_responses(
                cyclic
                    .iter()
                    .map(fixture_response)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (None, None) => {
                return Err(invalid(format!(
                    "rule '{label}': one of 'response' or 'cyclic' is required"
                )));
            }
        };
        debug!(target: "hs.config", rule = %label, "fixture applied");
    }
    debug!(
        target: "hs.config",
        name = config.name.as_deref().unwrap_or("<unnamed>"),
        rules = config.rules.len(),
        "fixtures loaded"
    );
    Ok(current)
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::ValidationError {
        reasons: vec![reason],
    }
}

fn fixture_matcher(rule: &FixtureRule) -> Result<RequestMatcher, ConfigError> {
    let mut matcher = RequestMatcher::always();
    if let Some(method) = &rule.method {
        let method = parse_method(method).map_err(|e| invalid(e.to_string()))?;
        matcher = matcher.and(matchers::method(method));
    }
    if let Some(path) = &rule.path {
        matcher = matcher.and(matchers::path_glob(path).map_err(|e| invalid(e.to_string()))?);
    }
    for (name, value) in &rule.headers {
        matcher = matcher.and(matchers::header(name.as_str(), value.as_str()));
    }
    Ok(matcher)
}

fn fixture_response(fixture: &FixtureResponse) -> Result<Response<Body>, ConfigError> {
    let status = StatusCode::from_u16(fixture.status).map_err(|e| invalid(e.to_string()))?;
    let status_text = fixture
        .status_text
        .clone()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    let body = Body::Text(fixture.body.clone().unwrap_or_default());
    let mut response = Response::new(body, status, status_text);
    for (name, value) in &fixture.headers {
        response = response
            .try_header(name, value)
            .map_err(|e| invalid(e.to_string()))?;
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
