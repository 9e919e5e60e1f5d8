//! # Read results.
//!
//! A value read resolves every requested topic into exactly one of
//! [`ReadResult`] (success) or [`ReadFailure`] (error with a suggestion),
//! bundled in a [`ReadOutcome`]. These are plain data shapes; rendering to a
//! transport format is the caller's concern.

use serde::Serialize;
use serde_json::Value;

/// Where a successful value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Served from the persisted cache; `age_seconds` reports freshness.
    Cache,
    /// Received live during this operation; `age_seconds` is zero.
    Live,
}

/// A successfully resolved topic value.
#[derive(Clone, Debug, Serialize)]
pub struct ReadResult {
    /// Requested topic.
    pub topic: String,
    /// Decoded value (JSON-parsed when possible, string otherwise).
    pub value: Value,
    /// Cache or live.
    pub source: ValueSource,
    /// Elapsed seconds since the value was observed, rounded to 0.01s.
    pub age_seconds: f64,
}

/// A topic that could not be resolved.
#[derive(Clone, Debug, Serialize)]
pub struct ReadFailure {
    /// Requested topic.
    pub topic: String,
    /// What went wrong.
    pub error: String,
    /// A next step for the caller (discovery hint or connection check).
    pub suggestion: String,
}

/// The full result of a multi-topic read: every requested topic appears in
/// exactly one of the two lists.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReadOutcome {
    /// Topics resolved to a value.
    pub success: Vec<ReadResult>,
    /// Topics that failed, each with a suggestion.
    pub errors: Vec<ReadFailure>,
}

/// Suggestion attached when the bus connection itself failed.
pub(crate) const CONNECT_SUGGESTION: &str = "Check broker connection and credentials";

/// Builds a discovery suggestion for a topic that never published.
///
/// Derived from the topic's first two path segments, or the whole topic when
/// it has no separator.
pub(crate) fn discovery_suggestion(topic: &str) -> String {
    match topic.split_once('/') {
        Some((first, _)) => {
            let base: String = topic.splitn(3, '/').take(2).collect::<Vec<_>>().join("/");
            format!(
                "Try discovering topics with keywords='{first}' or check if topic '{base}/#' exists"
            )
        }
        None => format!("Try discovering topics with keywords='{topic}'"),
    }
}

/// Rounds to two decimals for reported ages.
pub(crate) fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
