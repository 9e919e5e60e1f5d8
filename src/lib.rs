//! # topiclens
//!
//! **Topiclens** is a lightweight observation bridge for pub/sub message
//! buses: it reads the current values of named topics through a disk-backed
//! cache, and records windows of live traffic as deduplicated change
//! streams. It is designed as a building block for higher-level tooling
//! (CLIs, agents, diagnostics) that needs query-style access to a bus.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            ┌─────────────────┐        ┌─────────────────┐
//!            │    Collector    │        │     Recorder    │
//!            │  (value reads)  │        │ (change stream) │
//!            └──┬─────┬─────┬──┘        └──┬─────┬─────┬──┘
//!               │     │     │              │     │     │
//!        decode │     │     │ one conn,    │     │     │ diff +
//!               ▼     │     │ N subs       │     │     ▼ dedup
//!        ┌──────────┐ │     ▼              │     │ ┌──────────┐
//!        │ Payload  │ │  ┌─────────────────┴──┐  │ │   Diff   │
//!        │ codec    │ │  │ BusClient /        │  │ │  engine  │
//!        └──────────┘ │  │ BusConnection seam │  │ └──────────┘
//!                     │  │ (MemoryBus, MQTT)  │  │
//!                     │  └────────────────────┘  │
//!                     ▼                          ▼
//!              ┌──────────────────────────────────────┐
//!              │ CacheSession (load → mutate → flush) │
//!              │   over CacheBackend (file / memory)  │
//!              └──────────────────────────────────────┘
//! ```
//!
//! ### Value-read lifecycle
//! ```text
//! read_values(topics)
//!   ├─► open cache session (absent/corrupt file = empty store)
//!   ├─► serve cached topics (source=cache, age reported)
//!   ├─► collect the rest live:
//!   │     connect ─► subscribe each ─► select { message | deadline | cancel }
//!   │       ├─ message for a waiting topic ─► record once, mark satisfied
//!   │       ├─ all satisfied               ─► early exit (close connection)
//!   │       └─ deadline                    ─► per-topic timeout errors
//!   └─► flush cache session (always, even on failure paths)
//! ```
//!
//! ## Features
//! | Area           | Description                                             | Key types / traits                  |
//! |----------------|---------------------------------------------------------|-------------------------------------|
//! | **Reads**      | Cached + live multi-topic value resolution.             | [`Collector`], [`ReadOutcome`]      |
//! | **Recording**  | Time-boxed diffed capture of live traffic.              | [`Recorder`], [`RecordSpec`]        |
//! | **Transport**  | Pluggable pub/sub seam with bundled implementations.    | [`BusClient`], [`MemoryBus`]        |
//! | **Cache**      | Disk-backed topic values with freshness.                | [`CacheBackend`], [`CacheSession`]  |
//! | **Decoding**   | JSON-or-string payload codec and structural diff.       | [`DecodedValue`], [`PayloadDiff`]   |
//! | **Errors**     | Typed operation errors.                                 | [`LensError`]                       |
//! | **Progress**   | Observer hooks for operation milestones.                | [`Observe`], [`ProgressEvent`]      |
//!
//! ## Optional features
//! - `mqtt`: exports [`MqttBus`], a `rumqttc`-backed transport adapter.
//! - `logging`: exports a simple built-in [`StderrLog`] observer
//!   _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use topiclens::{Collector, Config, MemoryBackend, MemoryBus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = MemoryBus::new(64);
//!     let backend = Arc::new(MemoryBackend::new());
//!
//!     let mut cfg = Config::default();
//!     cfg.read_timeout = Duration::from_millis(250);
//!
//!     // Something publishing on the bus.
//!     let feeder = bus.clone();
//!     tokio::spawn(async move {
//!         loop {
//!             feeder.publish("home/kitchen/temperature", br#"{"celsius": 21.5}"#.as_slice());
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!         }
//!     });
//!
//!     let collector = Collector::new(Arc::new(bus), backend, cfg);
//!     let outcome = collector
//!         .read_values(
//!             &["home/kitchen/temperature".to_string()],
//!             CancellationToken::new(),
//!         )
//!         .await?;
//!
//!     assert_eq!(outcome.success.len(), 1);
//!     Ok(())
//! }
//! ```

mod bus;
mod cache;
mod codec;
mod collect;
mod config;
mod diff;
mod error;
mod observe;
mod record;

// ---- Public re-exports ----

pub use bus::{BusClient, BusConnection, MemoryBus, Message};
pub use cache::{CacheBackend, CacheEntry, CacheSession, CacheStore, FileBackend, MemoryBackend};
pub use codec::{decode, decode_str, DecodedValue};
pub use collect::{Collector, ReadFailure, ReadOutcome, ReadResult, ValueSource};
pub use config::Config;
pub use diff::{diff, FieldChange, PayloadDiff};
pub use error::LensError;
pub use observe::{Observe, ProgressEvent, ProgressKind};
pub use record::{ChangeEvent, ChangeType, FilterKind, FilterSpec, RecordSpec, Recorder, Recording};

// Optional: expose the MQTT transport adapter.
// Enable with: `--features mqtt`
#[cfg(feature = "mqtt")]
pub use bus::MqttBus;

// Optional: expose a simple built-in stderr observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observe::StderrLog;
