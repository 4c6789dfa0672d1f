use std::time::Duration;

use super::{
    backoff::{RECONNECT_DELAY_MAX, RECONNECT_DELAY_START},
    watchdog::{IDLE_TIMEOUT, PROBE_TIMEOUT},
};
use crate::ws::subscription::STREAMING_PATH;

/// connect attempts taking longer than this count as failed
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// close handshakes are abandoned after this
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Tunables of a [`Listener`](super::Listener)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// streaming endpoint path, relative to the instance base url
    pub streaming_path: String,
    /// silence after which the watchdog sends a ping
    pub idle_timeout: Duration,
    /// time the watchdog ping may stay unanswered
    pub probe_timeout: Duration,
    /// first reconnect delay
    pub reconnect_delay_start: Duration,
    /// reconnect delay upper bound
    pub reconnect_delay_max: Duration,
    /// connect attempt timeout
    pub connect_timeout: Duration,
    /// close handshake timeout
    pub close_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            streaming_path: STREAMING_PATH.to_string(),
            idle_timeout: IDLE_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            reconnect_delay_start: RECONNECT_DELAY_START,
            reconnect_delay_max: RECONNECT_DELAY_MAX,
            connect_timeout: CONNECT_TIMEOUT,
            close_timeout: CLOSE_TIMEOUT,
        }
    }
}

impl ListenerConfig {
    /// Use another streaming endpoint path
    pub fn with_streaming_path<S: Into<String>>(mut self, path: S) -> Self {
        self.streaming_path = path.into();
        self
    }

    /// Change the watchdog windows
    pub fn with_watchdog(mut self, idle_timeout: Duration, probe_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self.probe_timeout = probe_timeout;
        self
    }

    /// Change the reconnect delay bounds
    pub fn with_reconnect_delay(mut self, start: Duration, max: Duration) -> Self {
        self.reconnect_delay_start = start;
        self.reconnect_delay_max = max.max(start);
        self
    }

    /// Change the connect attempt timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
