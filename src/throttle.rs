use std::time::{Duration, Instant};

/// Rate limiter for scroll handling
///
/// Fires at most once per interval. An event inside the interval is not
/// queued; it only marks a trailing invocation as pending, so a burst of
/// events collapses into one run that sees the latest state.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum time between two runs
    interval: Duration,
    /// When the action last ran
    last_fired: Option<Instant>,
    /// Whether a trailing run is owed
    pending: bool,
}

impl Throttle {
    /// Create a throttle with the interval in milliseconds
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            last_fired: None,
            pending: false,
        }
    }

    /// Register an event; returns true if the action should run now
    pub fn submit(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.fire(now);
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Check for a pending trailing run whose interval has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.pending && self.ready(now) {
            self.fire(now);
            return true;
        }
        false
    }

    /// Time until a pending run may fire; None if nothing is pending
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        if !self.pending {
            return None;
        }

        Some(match self.last_fired {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        })
    }

    /// Drop a pending run
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_fired
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    fn fire(&mut self, now: Instant) {
        self.last_fired = Some(now);
        self.pending = false;
    }
}
