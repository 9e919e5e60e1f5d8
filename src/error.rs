//! Error types used by the topiclens operations.
//!
//! This module defines one error enum:
//!
//! - [`LensError`] — failures of a whole read/record operation.
//!
//! Per-topic timeouts, payload decode fallbacks, and cache corruption are
//! deliberately **not** errors: they resolve into structured result entries
//! (see [`ReadFailure`](crate::ReadFailure)) or into a cold-start cache.
//! `LensError` covers the cases where the operation itself cannot proceed or
//! cannot honor its persistence contract.

use thiserror::Error;

/// # Errors produced by a read or record operation.
///
/// Connection-level failures are fatal for the operation that hit them; the
/// live collector converts them into per-topic error entries, while the
/// recorder surfaces them directly.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LensError {
    /// Bus unreachable or handshake failed within the connect timeout.
    #[error("bus connection failed: {reason}")]
    Connect {
        /// The underlying transport error message.
        reason: String,
    },

    /// A subscription could not be issued on an established connection.
    #[error("subscribe to '{pattern}' failed: {reason}")]
    Subscribe {
        /// The topic pattern that was being subscribed.
        pattern: String,
        /// The underlying transport error message.
        reason: String,
    },

    /// Persisting the topic cache failed.
    #[error("cache persistence failed: {reason}")]
    Cache {
        /// The underlying I/O error message.
        reason: String,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Canceled,
}

impl LensError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use topiclens::LensError;
    ///
    /// let err = LensError::Connect { reason: "refused".into() };
    /// assert_eq!(err.as_label(), "bus_connect_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LensError::Connect { .. } => "bus_connect_failed",
            LensError::Subscribe { .. } => "bus_subscribe_failed",
            LensError::Cache { .. } => "cache_persist_failed",
            LensError::Canceled => "operation_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LensError::Connect { reason } => format!("connect: {reason}"),
            LensError::Subscribe { pattern, reason } => {
                format!("subscribe '{pattern}': {reason}")
            }
            LensError::Cache { reason } => format!("cache: {reason}"),
            LensError::Canceled => "cancelled".to_string(),
        }
    }

    /// Indicates whether the error is a connection-level transport failure.
    ///
    /// The live collector uses this to decide between reporting every
    /// requested topic as failed (transport down) and surfacing the error
    /// as-is (cache persistence, cancellation).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LensError::Connect { .. } | LensError::Subscribe { .. }
        )
    }
}
