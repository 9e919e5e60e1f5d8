//! Progress observation: event types, the observer trait, and a built-in
//! stderr reporter (feature `logging`).

mod event;
mod observer;

#[cfg(feature = "logging")]
mod log;

pub use event::{ProgressEvent, ProgressKind};
pub use observer::Observe;

#[cfg(feature = "logging")]
pub use log::StderrLog;
