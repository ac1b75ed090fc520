use embassy_time::{Duration, Instant};

/// Minimum time between two clock refreshes
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Throttles the clock refresh to once per interval, unless forced.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    interval: Duration,
    last_refresh: Instant,
    forced: bool,
}

impl RefreshGate {
    /// The first refresh is due one `interval` after `now`.
    pub const fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_refresh: now,
            forced: false,
        }
    }

    /// Let the next [`poll`](Self::poll) trigger regardless of elapsed time.
    pub fn force(&mut self) {
        self.forced = true;
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn last_refresh(&self) -> Instant {
        self.last_refresh
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.forced || now.saturating_duration_since(self.last_refresh) >= self.interval
    }

    /// Returns `true` when a refresh should run now.
    ///
    /// Triggering resets the timestamp to `now` and clears the force flag.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.last_refresh = now;
        self.forced = false;
        true
    }
}

/// Deadline that moves forward with every sign of activity
///
/// Expires once `timeout` has passed since the later of its creation and
/// the last [`touch`](Self::touch).
#[derive(Debug, Clone)]
pub struct IdleWatch {
    timeout: Duration,
    last_activity: Instant,
}

impl IdleWatch {
    pub const fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            last_activity: now,
        }
    }

    /// Record activity at `at`; older timestamps are ignored.
    pub fn touch(&mut self, at: Instant) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    pub fn deadline(&self) -> Instant {
        self.last_activity + self.timeout
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline()
    }
}
