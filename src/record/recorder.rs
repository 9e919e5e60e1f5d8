//! # Recorder: time-boxed diffed event capture.
//!
//! [`Recorder`] subscribes wide (explicit topic list or `#`), then consumes
//! the stream for exactly the configured window. Expiry is the normal
//! termination condition, not an error.
//!
//! ## Per-message pipeline
//! ```text
//! message ─► ignore-prefix filter ─► keyword filter (wildcard mode only)
//!         ─► decode ─► first sighting?  ─ yes ─► emit "new" (full payload)
//!                          │
//!                          no ─► diff(previous, current)
//!                                   ├─ empty    ─► suppress
//!                                   └─ changed  ─► emit "updated" (diff only)
//! ```
//!
//! The last-seen payload is refreshed on every accepted message regardless
//! of emission, and the topic's raw value is written into the cache session
//! so later reads can be served from cache.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use topiclens::{Config, MemoryBackend, MemoryBus, Recorder, RecordSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = MemoryBus::new(64);
//!     let recorder = Recorder::new(
//!         Arc::new(bus.clone()),
//!         Arc::new(MemoryBackend::new()),
//!         Config::default(),
//!     );
//!
//!     let feeder = bus.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         feeder.publish("home/lamp", br#"{"state":"ON"}"#.as_slice());
//!     });
//!
//!     let spec = RecordSpec::all().with_duration(Duration::from_millis(200));
//!     let recording = recorder.record(spec, CancellationToken::new()).await.unwrap();
//!     assert_eq!(recording.total_events, 1);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bus::{BusClient, BusConnection};
use crate::cache::{CacheBackend, CacheSession};
use crate::codec::{decode, DecodedValue};
use crate::config::Config;
use crate::diff::diff;
use crate::error::LensError;
use crate::observe::{Observe, ProgressEvent, ProgressKind};
use crate::record::event::{ChangeEvent, ChangeType, RecordSpec, Recording};

/// Captures a window of live traffic as a deduplicated change stream.
pub struct Recorder {
    bus: Arc<dyn BusClient>,
    cache: Arc<dyn CacheBackend>,
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
}

impl Recorder {
    /// Creates a recorder over the given transport and cache backend.
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

    /// Records for the spec's window (or [`Config::record_timeout`]).
    ///
    /// Deadline expiry and cancellation both terminate the recording
    /// normally; everything captured so far is returned and the cache
    /// session is flushed.
    ///
    /// # Errors
    /// - [`LensError::Connect`] / [`LensError::Subscribe`] when the bus
    ///   cannot be reached or the subscriptions cannot be issued.
    /// - [`LensError::Cache`] when the cache cannot be persisted.
    ///
    /// [`Config::record_timeout`]: crate::Config::record_timeout
    pub async fn record(
        &self,
        spec: RecordSpec,
        ctx: CancellationToken,
    ) -> Result<Recording, LensError> {
        let window = spec.duration.unwrap_or(self.cfg.record_timeout);
        let mut session = CacheSession::open(self.cache.clone());

        let mut conn = tokio::select! {
            res = self.bus.connect(self.cfg.connect_timeout) => res?,
            _ = ctx.cancelled() => return Err(LensError::Canceled),
        };

        if let Err(err) = self.subscribe_all(conn.as_mut(), &spec).await {
            conn.close().await;
            return Err(err);
        }
        self.emit(
            ProgressEvent::new(ProgressKind::RecordStarted).with_detail(describe(&spec)),
        )
        .await;

        let started = tokio::time::Instant::now();
        let expiry = tokio::time::sleep(window);
        tokio::pin!(expiry);

        let mut events: Vec<ChangeEvent> = Vec::new();
        let mut last_payload: HashMap<String, DecodedValue> = HashMap::new();
        let mut ignored = 0usize;

        loop {
            let msg = tokio::select! {
                maybe = conn.next_message() => match maybe {
                    Some(msg) => msg,
                    // Stream spent; the window ends early with what we have.
                    None => break,
                },
                _ = &mut expiry => break,
                _ = ctx.cancelled() => break,
            };

            if self.cfg.is_ignored(&msg.topic) {
                ignored += 1;
                continue;
            }
            if !spec.is_explicit() && !matches_keywords(&msg.topic, spec.keywords.as_deref()) {
                continue;
            }

            let decoded = decode(&msg.payload);
            let timestamp = round_ms(started.elapsed().as_secs_f64());

            match last_payload.get(&msg.topic) {
                None => {
                    events.push(ChangeEvent {
                        timestamp,
                        topic: msg.topic.clone(),
                        changes: decoded.to_json(),
                        change_type: ChangeType::New,
                    });
                }
                Some(previous) => {
                    if let Some(changes) = diff(previous, &decoded) {
                        events.push(ChangeEvent {
                            timestamp,
                            topic: msg.topic.clone(),
                            changes: changes.to_json(),
                            change_type: ChangeType::Updated,
                        });
                    }
                }
            }

            // Refreshed even when the event was suppressed.
            session.set(&msg.topic, decoded.to_raw());
            last_payload.insert(msg.topic, decoded);

            if self.cfg.progress_every > 0 && events.len() % self.cfg.progress_every == 0 {
                self.emit(
                    ProgressEvent::new(ProgressKind::EventsRecorded).with_count(events.len()),
                )
                .await;
            }
        }

        conn.close().await;

        let duration = round_ms(started.elapsed().as_secs_f64());
        let recording = Recording {
            duration,
            filter: spec.filter(),
            unique_topics: last_payload.len(),
            total_events: events.len(),
            ignored_events: ignored,
            events,
        };

        self.emit(
            ProgressEvent::new(ProgressKind::RecordComplete)
                .with_count(recording.total_events)
                .with_detail(format!(
                    "{} events from {} topics ({} ignored)",
                    recording.total_events, recording.unique_topics, recording.ignored_events
                )),
        )
        .await;

        session.close()?;
        Ok(recording)
    }

    /// Issues the spec's subscriptions: one per explicit topic, or `#`.
    async fn subscribe_all(
        &self,
        conn: &mut dyn BusConnection,
        spec: &RecordSpec,
    ) -> Result<(), LensError> {
        match &spec.topics {
            Some(topics) if !topics.is_empty() => {
                for topic in topics {
                    conn.subscribe(topic).await?;
                }
            }
            _ => conn.subscribe("#").await?,
        }
        Ok(())
    }

    async fn emit(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(&event).await;
        }
    }
}

/// True if the topic contains any keyword, case-insensitively (OR logic).
/// An absent or empty keyword list matches everything.
fn matches_keywords(topic: &str, keywords: Option<&[String]>) -> bool {
    match keywords {
        None => true,
        Some(list) if list.is_empty() => true,
        Some(list) => {
            let lowered = topic.to_lowercase();
            list.iter().any(|k| lowered.contains(&k.to_lowercase()))
        }
    }
}

/// Rounds seconds to millisecond precision.
fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Human-readable subscription description for progress output.
fn describe(spec: &RecordSpec) -> String {
    match (&spec.topics, &spec.keywords) {
        (Some(topics), _) if !topics.is_empty() => {
            format!("from {} specific topics", topics.len())
        }
        (_, Some(keywords)) if !keywords.is_empty() => {
            format!("all topics filtered by keywords: {}", keywords.join(", "))
        }
        _ => "all topics".to_string(),
    }
}
