//! # Observer trait.
//!
//! `Observe` is the extension point for progress reporting. Observers are
//! awaited inline between collection steps, so implementations should stay
//! cheap; heavier sinks should hand the event off internally.

use async_trait::async_trait;

use crate::observe::event::ProgressEvent;

/// Contract for progress observers.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handle a single progress event.
    async fn on_event(&self, event: &ProgressEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
