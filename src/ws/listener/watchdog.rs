use std::time::Duration;

use tokio::time::Instant;

/// silence after which a ping probe is sent
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// time a probe may stay unanswered before the connection is declared dead
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Two tier liveness monitor of one connection.
///
/// `idle` is armed while data flows, `probe` only after a ping was sent. At most one of
/// them is armed at any time.
#[derive(Debug, Clone)]
pub(crate) struct Watchdog {
    idle_timeout: Duration,
    probe_timeout: Duration,
    idle: Option<Instant>,
    probe: Option<Instant>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(IDLE_TIMEOUT, PROBE_TIMEOUT)
    }
}

impl Watchdog {
    pub fn new(idle_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            probe_timeout,
            idle: None,
            probe: None,
        }
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle
    }

    pub fn probe_deadline(&self) -> Option<Instant> {
        self.probe
    }

    /// connection showed life, cancel a pending probe and re-arm the idle window
    pub fn reset(&mut self, now: Instant) {
        self.probe = None;
        self.idle = Some(now + self.idle_timeout);
        log::trace!("Watchdog was reset");
    }

    /// idle window passed, the caller sends a probe
    pub fn release(&mut self, now: Instant) {
        self.idle = None;
        self.probe = Some(now + self.probe_timeout);
        log::debug!("Watchdog was released, probe deadline {:?}", self.probe);
    }

    pub fn disarm(&mut self) {
        self.idle = None;
        self.probe = None;
    }

    pub fn is_armed(&self) -> bool {
        self.idle.is_some() || self.probe.is_some()
    }
}
