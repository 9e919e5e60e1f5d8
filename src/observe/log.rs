//! # Built-in stderr progress reporter (feature `logging`).
//!
//! [`StderrLog`] renders progress milestones as single stderr lines. It is a
//! demo/reference observer; structured sinks implement
//! [`Observe`](crate::Observe) themselves.

use async_trait::async_trait;

use crate::observe::event::{ProgressEvent, ProgressKind};
use crate::observe::observer::Observe;

/// Writes one line per progress event to stderr.
#[derive(Debug, Default)]
pub struct StderrLog;

impl StderrLog {
    /// Creates a new reporter.
    pub fn new() -> Self {
        Self
    }

    fn render(event: &ProgressEvent) -> String {
        let topic = event.topic.as_deref().unwrap_or("?");
        match event.kind {
            ProgressKind::ReadStarted => {
                format!("Reading {} topic(s)", event.count.unwrap_or(0))
            }
            ProgressKind::CacheHit => {
                let age = event.age.map(|a| a.as_secs_f64()).unwrap_or(0.0);
                format!("Topic '{topic}' found in cache (age: {age:.1}s)")
            }
            ProgressKind::LiveCollecting => {
                format!("Collecting {} topic(s) live...", event.count.unwrap_or(0))
            }
            ProgressKind::ValueReceived => format!("Got value for topic '{topic}'"),
            ProgressKind::TopicTimedOut => format!("Timeout reading topic '{topic}'"),
            ProgressKind::ConnectFailed => {
                format!("Connection failed: {}", event.detail.as_deref().unwrap_or(""))
            }
            ProgressKind::ReadComplete => {
                format!("Read complete: {}", event.detail.as_deref().unwrap_or(""))
            }
            ProgressKind::RecordStarted => {
                format!("Recording {}", event.detail.as_deref().unwrap_or(""))
            }
            ProgressKind::EventsRecorded => {
                format!("Recorded {} events...", event.count.unwrap_or(0))
            }
            ProgressKind::RecordComplete => {
                format!("Recording complete: {}", event.detail.as_deref().unwrap_or(""))
            }
        }
    }
}

#[async_trait]
impl Observe for StderrLog {
    async fn on_event(&self, event: &ProgressEvent) {
        eprintln!("[topiclens] {}", Self::render(event));
    }

    fn name(&self) -> &'static str {
        "stderr_log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cache_hit_line_includes_age() {
        let ev = ProgressEvent::new(ProgressKind::CacheHit)
            .with_topic("home/lamp")
            .with_age(Duration::from_millis(2500));
        assert_eq!(
            StderrLog::render(&ev),
            "Topic 'home/lamp' found in cache (age: 2.5s)"
        );
    }

    #[test]
    fn test_read_started_line_counts_topics() {
        let ev = ProgressEvent::new(ProgressKind::ReadStarted).with_count(3);
        assert_eq!(StderrLog::render(&ev), "Reading 3 topic(s)");
    }
}
