//! # Progress events emitted by read and record operations.
//!
//! [`ProgressKind`] classifies the milestones of an operation; the
//! [`ProgressEvent`] struct carries optional metadata (topic, counts, cache
//! age). Progress is observability only — it never feeds back into the
//! operation results.

use std::sync::Arc;
use std::time::Duration;

/// Classification of progress milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    // === Value reads ===
    /// A multi-topic read started.
    ///
    /// Sets: `count` (requested topics).
    ReadStarted,

    /// A requested topic was served from the cache.
    ///
    /// Sets: `topic`, `age`.
    CacheHit,

    /// Live collection started for the topics missing from the cache.
    ///
    /// Sets: `count` (topics to collect).
    LiveCollecting,

    /// A live value arrived for a requested topic.
    ///
    /// Sets: `topic`.
    ValueReceived,

    /// A requested topic produced nothing before the deadline.
    ///
    /// Sets: `topic`.
    TopicTimedOut,

    /// The bus connection could not be established.
    ///
    /// Sets: `detail` (transport error message).
    ConnectFailed,

    /// The read finished.
    ///
    /// Sets: `count` (successes), `detail` (summary).
    ReadComplete,

    // === Recording ===
    /// A recording window opened.
    ///
    /// Sets: `detail` (subscription description).
    RecordStarted,

    /// Recording passed a progress cadence mark.
    ///
    /// Sets: `count` (events so far).
    EventsRecorded,

    /// The recording window closed.
    ///
    /// Sets: `count` (total events), `detail` (summary).
    RecordComplete,
}

/// Progress milestone with optional metadata.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    /// Milestone classification.
    pub kind: ProgressKind,
    /// Topic involved, if applicable.
    pub topic: Option<Arc<str>>,
    /// Count (topics, events) for this milestone.
    pub count: Option<usize>,
    /// Cache entry age, for [`ProgressKind::CacheHit`].
    pub age: Option<Duration>,
    /// Free-form detail (error message, summary line).
    pub detail: Option<Arc<str>>,
}

impl ProgressEvent {
    /// Creates a new event of the given kind.
    pub fn new(kind: ProgressKind) -> Self {
        Self {
            kind,
            topic: None,
            count: None,
            age: None,
            detail: None,
        }
    }

    /// Attaches a topic name.
    #[inline]
    pub fn with_topic(mut self, topic: impl Into<Arc<str>>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a cache age.
    #[inline]
    pub fn with_age(mut self, age: Duration) -> Self {
        self.age = Some(age);
        self
    }

    /// Attaches a free-form detail string.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Arc<str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
