//! # Recording data shapes.
//!
//! [`RecordSpec`] describes what to record; [`Recording`] is the result:
//! an ordered, deduplicated [`ChangeEvent`] stream plus counters and the
//! [`FilterSpec`] that produced it.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// How a topic's payload changed relative to this recording run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// First time the topic was seen in this run; `changes` holds the full
    /// decoded payload.
    New,
    /// The topic was seen before and its payload differs; `changes` holds
    /// only the diff.
    Updated,
}

/// One recorded change.
#[derive(Clone, Debug, Serialize)]
pub struct ChangeEvent {
    /// Seconds since recording start, rounded to millisecond precision.
    pub timestamp: f64,
    /// Topic the change was observed on.
    pub topic: String,
    /// Full payload (`new`) or structural diff (`updated`).
    pub changes: Value,
    /// New topic or update to a known one.
    pub change_type: ChangeType,
}

/// Which subscription mode produced a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Explicit per-topic subscriptions.
    Topics,
    /// Wildcard subscription narrowed by keyword matching.
    Keywords,
}

/// Filter descriptor carried through to the output; never mutated after
/// creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterSpec {
    /// Subscription mode.
    #[serde(rename = "type")]
    pub kind: FilterKind,
    /// The topics or keywords that were in effect.
    pub values: Vec<String>,
}

/// Parameters for a recording run.
///
/// Subscription mode is exclusive: when `topics` is set, one subscription is
/// issued per topic and `keywords` is ignored; otherwise a wildcard (`#`)
/// subscription is used, optionally narrowed by case-insensitive keyword
/// matching (OR logic) against topic names.
#[derive(Clone, Debug, Default)]
pub struct RecordSpec {
    /// Recording window; falls back to [`Config::record_timeout`] when
    /// `None`.
    ///
    /// [`Config::record_timeout`]: crate::Config::record_timeout
    pub duration: Option<Duration>,
    /// Explicit topics to subscribe to.
    pub topics: Option<Vec<String>>,
    /// Keyword filter for wildcard mode.
    pub keywords: Option<Vec<String>>,
}

impl RecordSpec {
    /// Record everything visible on the bus.
    pub fn all() -> Self {
        Self::default()
    }

    /// Record an explicit topic list.
    pub fn for_topics(topics: Vec<String>) -> Self {
        Self {
            topics: Some(topics),
            ..Self::default()
        }
    }

    /// Record the wildcard stream narrowed by keywords.
    pub fn for_keywords(keywords: Vec<String>) -> Self {
        Self {
            keywords: Some(keywords),
            ..Self::default()
        }
    }

    /// Overrides the recording window.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builds the filter descriptor for this spec.
    pub(crate) fn filter(&self) -> Option<FilterSpec> {
        match (&self.topics, &self.keywords) {
            (Some(topics), _) if !topics.is_empty() => Some(FilterSpec {
                kind: FilterKind::Topics,
                values: topics.clone(),
            }),
            (_, Some(keywords)) if !keywords.is_empty() => Some(FilterSpec {
                kind: FilterKind::Keywords,
                values: keywords.clone(),
            }),
            _ => None,
        }
    }

    /// True when recording in explicit-topics mode.
    pub(crate) fn is_explicit(&self) -> bool {
        self.topics.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// The full output of one recording window.
#[derive(Clone, Debug, Serialize)]
pub struct Recording {
    /// Actual elapsed duration in seconds (ms precision).
    pub duration: f64,
    /// The filter in effect, if any.
    pub filter: Option<FilterSpec>,
    /// Ordered event stream.
    pub events: Vec<ChangeEvent>,
    /// Number of distinct topics that produced events.
    pub unique_topics: usize,
    /// Total emitted events.
    pub total_events: usize,
    /// Messages skipped by the administrative ignore list.
    pub ignored_events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_mode_wins_over_keywords() {
        let spec = RecordSpec {
            topics: Some(vec!["a/b".to_string()]),
            keywords: Some(vec!["lamp".to_string()]),
            ..RecordSpec::default()
        };
        let filter = spec.filter().unwrap();
        assert_eq!(filter.kind, FilterKind::Topics);
        assert_eq!(filter.values, vec!["a/b".to_string()]);
    }

    #[test]
    fn test_keywords_mode() {
        let spec = RecordSpec::for_keywords(vec!["temp".to_string()]);
        assert_eq!(spec.filter().unwrap().kind, FilterKind::Keywords);
        assert!(!spec.is_explicit());
    }

    #[test]
    fn test_unfiltered_has_no_descriptor() {
        assert_eq!(RecordSpec::all().filter(), None);
    }

    #[test]
    fn test_filter_serializes_with_type_tag() {
        let spec = RecordSpec::for_topics(vec!["a".to_string()]);
        let json = serde_json::to_value(spec.filter().unwrap()).unwrap();
        assert_eq!(json["type"], "topics");
        assert_eq!(json["values"][0], "a");
    }
}
