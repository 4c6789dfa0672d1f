use std::time::Duration;

/// first reconnect delay
pub const RECONNECT_DELAY_START: Duration = Duration::from_millis(500);
/// reconnect delay upper bound
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(15);

/// Exponential reconnect delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    start: Duration,
    max: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RECONNECT_DELAY_START, RECONNECT_DELAY_MAX)
    }
}

impl Backoff {
    /// `max` below `start` is raised to `start`
    pub fn new(start: Duration, max: Duration) -> Self {
        Self {
            start,
            max: max.max(start),
            current: start,
        }
    }

    /// delay to wait before the next reconnect
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// an unsuccessful cycle, double the delay
    pub fn advance(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.max);
    }

    pub fn reset(&mut self) {
        self.current = self.start;
    }
}
