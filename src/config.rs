//! # Global operation configuration.
//!
//! [`Config`] defines the defaults shared by the live collector and the
//! recorder: connect timeout, per-operation deadlines, the administrative
//! ignore list, and the progress reporting cadence.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use topiclens::Config;
//!
//! let mut cfg = Config::default();
//! cfg.read_timeout = Duration::from_secs(10);
//! cfg.ignored_prefixes.push("sys/".to_string());
//!
//! assert_eq!(cfg.read_timeout, Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Configuration shared by read and record operations.
///
/// Controls transport timeouts, recording windows, the administrative topic
/// filter, and progress cadence.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for the bus connection handshake.
    pub connect_timeout: Duration,
    /// Default deadline for a multi-topic live read.
    pub read_timeout: Duration,
    /// Default duration of a recording window.
    pub record_timeout: Duration,
    /// Topic prefixes skipped by the recorder (bridge/administrative
    /// housekeeping traffic). Empty list disables the filter.
    pub ignored_prefixes: Vec<String>,
    /// Emit a progress event every N recorded events (0 = never).
    pub progress_every: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `connect_timeout = 5s`
    /// - `read_timeout = 5s`
    /// - `record_timeout = 30s`
    /// - `ignored_prefixes = ["zigbee2mqtt/bridge/", "homeassistant/"]`
    /// - `progress_every = 100`
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            record_timeout: Duration::from_secs(30),
            ignored_prefixes: vec![
                "zigbee2mqtt/bridge/".to_string(),
                "homeassistant/".to_string(),
            ],
            progress_every: 100,
        }
    }
}

impl Config {
    /// True if `topic` starts with any of the configured ignore prefixes.
    pub fn is_ignored(&self, topic: &str) -> bool {
        self.ignored_prefixes.iter().any(|p| topic.starts_with(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ignores_administrative_topics() {
        let cfg = Config::default();
        assert!(cfg.is_ignored("zigbee2mqtt/bridge/state"));
        assert!(cfg.is_ignored("homeassistant/sensor/kitchen/config"));
        assert!(!cfg.is_ignored("zigbee2mqtt/lamp"));
    }

    #[test]
    fn test_empty_ignore_list_disables_filter() {
        let mut cfg = Config::default();
        cfg.ignored_prefixes.clear();
        assert!(!cfg.is_ignored("homeassistant/anything"));
    }
}
