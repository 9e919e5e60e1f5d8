//! # Collector: cached reads plus multi-topic live collection.
//!
//! [`Collector`] resolves a set of topics to their current values. Cached
//! topics are served immediately with their age; the rest are collected live
//! over **one** bus connection with **one** subscription per topic, until
//! every topic has been seen once or the deadline expires.
//!
//! ## Collection states
//! ```text
//! Idle ──connect──► Connected ──subscribe*──► Collecting
//!   │                   │                        │
//!   │ connect error     │ subscribe error        ├─ all satisfied ─► Completed
//!   ▼                   ▼                        ├─ deadline      ─► TimedOut
//! ConnectionFailed ◄────┘                        └─ cancelled     ─► (persist, Canceled)
//! ```
//!
//! ## Rules
//! - **At most one read per topic**: the first message for a waiting topic
//!   satisfies it; later messages for the same topic are ignored.
//! - **Early exit**: the instant every topic is satisfied, the loop stops
//!   and the connection is released — latency is bounded by the slowest
//!   topic, not the deadline.
//! - **One cancellable wait**: next-message, deadline, and cancellation are
//!   raced in a single `select!`, so the deadline cancels the read exactly.
//! - **Persistence always runs**: every live value is written into the cache
//!   session, and the session is flushed on every path, including transport
//!   failure and cancellation.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use topiclens::{Collector, Config, MemoryBackend, MemoryBus, ValueSource};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = MemoryBus::new(64);
//!     let mut cfg = Config::default();
//!     cfg.read_timeout = Duration::from_millis(200);
//!     let collector = Collector::new(Arc::new(bus.clone()), Arc::new(MemoryBackend::new()), cfg);
//!
//!     let feeder = bus.clone();
//!     tokio::spawn(async move {
//!         loop {
//!             feeder.publish("home/lamp", b"ON");
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!         }
//!     });
//!
//!     let outcome = collector
//!         .read_values(&["home/lamp".to_string()], CancellationToken::new())
//!         .await
//!         .unwrap();
//!     assert_eq!(outcome.success[0].source, ValueSource::Live);
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::bus::{BusClient, BusConnection};
use crate::cache::{CacheBackend, CacheSession};
use crate::codec::{decode, decode_str};
use crate::collect::result::{
    discovery_suggestion, round2, ReadFailure, ReadOutcome, ReadResult, ValueSource,
    CONNECT_SUGGESTION,
};
use crate::config::Config;
use crate::error::LensError;
use crate::observe::{Observe, ProgressEvent, ProgressKind};

/// Resolves topic values from cache and live collection.
pub struct Collector {
    bus: Arc<dyn BusClient>,
    cache: Arc<dyn CacheBackend>,
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
}

impl Collector {
    /// Creates a collector over the given transport and cache backend.
    pub fn new(bus: Arc<dyn BusClient>, cache: Arc<dyn CacheBackend>, cfg: Config) -> Self {
        Self {
            bus,
            cache,
            cfg,
            observers: Vec::new(),
        }
    }

    /// Attaches progress observers.
    #[must_use]
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Reads the current values of `topics` using the configured deadline.
    ///
    /// See [`Collector::read_values_within`].
    pub async fn read_values(
        &self,
        topics: &[String],
        ctx: CancellationToken,
    ) -> Result<ReadOutcome, LensError> {
        self.read_values_within(topics, self.cfg.read_timeout, ctx)
            .await
    }

    /// Reads the current values of `topics` with an explicit live-collection
    /// deadline.
    ///
    /// Cached topics are served as authoritative results with their age
    /// (`source: Cache`); only misses are collected live, and live values
    /// update the cache for future calls. The outcome covers every requested
    /// topic exactly once (duplicates in `topics` are collapsed).
    ///
    /// # Errors
    /// - [`LensError::Canceled`] when `ctx` fires; values already collected
    ///   are persisted first.
    /// - [`LensError::Cache`] when the cache cannot be persisted.
    ///
    /// Transport failures are **not** errors here: they resolve into
    /// per-topic [`ReadFailure`] entries.
    pub async fn read_values_within(
        &self,
        topics: &[String],
        deadline: Duration,
        ctx: CancellationToken,
    ) -> Result<ReadOutcome, LensError> {
        let requested = dedup_preserving_order(topics);
        let mut session = CacheSession::open(self.cache.clone());
        let mut outcome = ReadOutcome::default();

        self.emit(ProgressEvent::new(ProgressKind::ReadStarted).with_count(requested.len()))
            .await;

        let mut pending = Vec::new();
        for topic in requested {
            match session.get(&topic) {
                Some((raw, age)) => {
                    self.emit(
                        ProgressEvent::new(ProgressKind::CacheHit)
                            .with_topic(topic.as_str())
                            .with_age(age),
                    )
                    .await;
                    outcome.success.push(ReadResult {
                        value: decode_str(raw).to_json(),
                        source: ValueSource::Cache,
                        age_seconds: round2(age.as_secs_f64()),
                        topic,
                    });
                }
                None => pending.push(topic),
            }
        }

        let collected = if pending.is_empty() {
            Ok(())
        } else {
            self.collect_live(&mut session, &mut outcome, pending, deadline, &ctx)
                .await
        };

        self.emit(ProgressEvent::new(ProgressKind::ReadComplete)
            .with_count(outcome.success.len())
            .with_detail(format!(
                "{} success, {} errors",
                outcome.success.len(),
                outcome.errors.len()
            )))
        .await;

        // Persist before surfacing cancellation: values already fetched must
        // not be lost.
        let closed = session.close();
        collected?;
        closed?;
        Ok(outcome)
    }

    /// Runs the connect → subscribe → collect state machine for the topics
    /// missing from the cache.
    ///
    /// Transport failures resolve every pending topic into an error entry;
    /// only cancellation is returned as `Err`.
    async fn collect_live(
        &self,
        session: &mut CacheSession,
        outcome: &mut ReadOutcome,
        pending: Vec<String>,
        deadline: Duration,
        ctx: &CancellationToken,
    ) -> Result<(), LensError> {
        self.emit(ProgressEvent::new(ProgressKind::LiveCollecting).with_count(pending.len()))
            .await;

        let mut conn = match self.connect(ctx).await {
            Ok(conn) => conn,
            Err(LensError::Canceled) => return Err(LensError::Canceled),
            Err(err) => {
                self.emit(
                    ProgressEvent::new(ProgressKind::ConnectFailed)
                        .with_detail(err.as_message()),
                )
                .await;
                fail_all(outcome, pending, &err.to_string(), CONNECT_SUGGESTION);
                return Ok(());
            }
        };

        for topic in &pending {
            if let Err(err) = conn.subscribe(topic).await {
                conn.close().await;
                fail_all(outcome, pending, &err.to_string(), CONNECT_SUGGESTION);
                return Ok(());
            }
        }

        let mut waiting: HashSet<&str> = pending.iter().map(String::as_str).collect();
        let mut connection_lost = false;
        let mut cancelled = false;

        let expiry = tokio::time::sleep(deadline);
        tokio::pin!(expiry);

        while !waiting.is_empty() {
            tokio::select! {
                maybe = conn.next_message() => match maybe {
                    Some(msg) => {
                        if !waiting.remove(msg.topic.as_str()) {
                            continue;
                        }
                        let decoded = decode(&msg.payload);
                        session.set(&msg.topic, decoded.to_raw());
                        self.emit(
                            ProgressEvent::new(ProgressKind::ValueReceived)
                                .with_topic(msg.topic.as_str()),
                        )
                        .await;
                        outcome.success.push(ReadResult {
                            topic: msg.topic,
                            value: decoded.to_json(),
                            source: ValueSource::Live,
                            age_seconds: 0.0,
                        });
                    }
                    None => {
                        connection_lost = true;
                        break;
                    }
                },
                _ = &mut expiry => break,
                _ = ctx.cancelled() => {
                    cancelled = true;
                    break;
                }
            }
        }

        conn.close().await;

        let leftover: Vec<&String> = pending
            .iter()
            .filter(|t| waiting.contains(t.as_str()))
            .collect();
        for topic in leftover {
            if !cancelled {
                self.emit(
                    ProgressEvent::new(ProgressKind::TopicTimedOut).with_topic(topic.as_str()),
                )
                .await;
            }
            let error = if connection_lost {
                "Connection lost before a value arrived".to_string()
            } else if cancelled {
                "Operation cancelled before a value arrived".to_string()
            } else {
                format!(
                    "No message received within {}s timeout",
                    deadline.as_secs()
                )
            };
            outcome.errors.push(ReadFailure {
                topic: topic.clone(),
                error,
                suggestion: discovery_suggestion(topic),
            });
        }

        if cancelled {
            Err(LensError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Opens the bus connection, racing the handshake against cancellation.
    async fn connect(&self, ctx: &CancellationToken) -> Result<Box<dyn BusConnection>, LensError> {
        tokio::select! {
            res = self.bus.connect(self.cfg.connect_timeout) => res,
            _ = ctx.cancelled() => Err(LensError::Canceled),
        }
    }

    async fn emit(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(&event).await;
        }
    }
}

fn dedup_preserving_order(topics: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    topics
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

fn fail_all(outcome: &mut ReadOutcome, pending: Vec<String>, error: &str, suggestion: &str) {
    for topic in pending {
        outcome.errors.push(ReadFailure {
            topic,
            error: error.to_string(),
            suggestion: suggestion.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusClient, MemoryBus};
    use crate::cache::MemoryBackend;
    use async_trait::async_trait;
    use serde_json::json;

    fn collector_with(bus: MemoryBus, backend: Arc<MemoryBackend>) -> Collector {
        let mut cfg = Config::default();
        cfg.read_timeout = Duration::from_secs(5);
        Collector::new(Arc::new(bus), backend, cfg)
    }

    fn topics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Transport whose connect always fails.
    struct DeadBus;

    #[async_trait]
    impl BusClient for DeadBus {
        async fn connect(
            &self,
            _timeout: Duration,
        ) -> Result<Box<dyn BusConnection>, LensError> {
            Err(LensError::Connect {
                reason: "refused".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_timeout_bounded_by_deadline() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend);

        // t1 publishes shortly after subscription; t2 never publishes.
        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            feeder.publish("fast/topic", b"42");
        });

        let started = tokio::time::Instant::now();
        let outcome = collector
            .read_values_within(
                &topics(&["fast/topic", "silent/topic"]),
                Duration::from_secs(3),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3500));

        assert_eq!(outcome.success.len(), 1);
        assert_eq!(outcome.success[0].topic, "fast/topic");
        assert_eq!(outcome.success[0].source, ValueSource::Live);
        assert_eq!(outcome.success[0].value, json!(42));

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].topic, "silent/topic");
        assert!(outcome.errors[0].error.contains("3s timeout"));
        assert!(outcome.errors[0].suggestion.contains("keywords='silent'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_exit_when_all_topics_satisfied() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend);

        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            feeder.publish("a/one", b"1");
            feeder.publish("a/two", b"2");
        });

        let started = tokio::time::Instant::now();
        let outcome = collector
            .read_values_within(
                &topics(&["a/one", "a/two"]),
                Duration::from_secs(10),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        // Both arrived at ~100ms; the full 10s deadline is never waited out.
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(outcome.success.len(), 2);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_read_per_topic() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend);

        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            feeder.publish("t/x", b"first");
            feeder.publish("t/x", b"second");
            tokio::time::sleep(Duration::from_millis(20)).await;
            feeder.publish("t/y", b"done");
        });

        let outcome = collector
            .read_values_within(
                &topics(&["t/x", "t/y"]),
                Duration::from_secs(5),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.success.len(), 2);
        let x = outcome.success.iter().find(|r| r.topic == "t/x").unwrap();
        assert_eq!(x.value, json!("first"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_live_read() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());

        let mut warm = CacheSession::open(backend.clone() as Arc<dyn CacheBackend>);
        warm.set("home/lamp", r#"{"state":"ON"}"#);
        warm.close().unwrap();

        let collector = collector_with(bus, backend);
        // Nothing ever publishes: a cache hit must resolve without the bus.
        let outcome = collector
            .read_values_within(
                &topics(&["home/lamp"]),
                Duration::from_secs(2),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.success.len(), 1);
        assert_eq!(outcome.success[0].source, ValueSource::Cache);
        assert_eq!(outcome.success[0].value, json!({"state": "ON"}));
        assert!(outcome.success[0].age_seconds >= 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_value_updates_cache() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend.clone());

        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            feeder.publish("sensor/temp", b"21.5");
        });

        collector
            .read_values_within(
                &topics(&["sensor/temp"]),
                Duration::from_secs(5),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let store = backend.load();
        assert_eq!(store.get("sensor/temp").unwrap().0, "21.5");
    }

    #[tokio::test]
    async fn test_connection_failure_fails_every_topic() {
        let backend = Arc::new(MemoryBackend::new());
        let collector = Collector::new(Arc::new(DeadBus), backend, Config::default());

        let outcome = collector
            .read_values(&topics(&["a/b", "c/d"]), CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.success.is_empty());
        assert_eq!(outcome.errors.len(), 2);
        for failure in &outcome.errors {
            assert!(failure.error.contains("refused"));
            assert_eq!(failure.suggestion, CONNECT_SUGGESTION);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_persists_collected_values() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend.clone());

        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            feeder.publish("seen/topic", b"here");
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let res = collector
            .read_values_within(
                &topics(&["seen/topic", "never/topic"]),
                Duration::from_secs(60),
                ctx,
            )
            .await;

        assert!(matches!(res, Err(LensError::Canceled)));
        // The value received before cancellation reached the backend.
        assert_eq!(backend.load().get("seen/topic").unwrap().0, "here");
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_request_topics_collapsed() {
        let bus = MemoryBus::new(64);
        let backend = Arc::new(MemoryBackend::new());
        let collector = collector_with(bus.clone(), backend);

        let feeder = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            feeder.publish("dup/topic", b"once");
        });

        let outcome = collector
            .read_values_within(
                &topics(&["dup/topic", "dup/topic"]),
                Duration::from_secs(5),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.success.len() + outcome.errors.len(), 1);
    }
}
