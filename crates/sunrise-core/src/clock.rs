use embassy_time::Instant;

/// Wall clock kept by periodic network time samples.
///
/// Between samples the time is extrapolated from the monotonic clock.
#[derive(Debug, Clone)]
pub struct WallClock {
    utc_offset_secs: i64,
    synced: Option<Sample>,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    unix_secs: u64,
    at: Instant,
}

impl WallClock {
    pub const fn new(utc_offset_secs: i64) -> Self {
        Self {
            utc_offset_secs,
            synced: None,
        }
    }

    /// Record that it was `unix_secs` UTC at monotonic instant `at`.
    pub fn synchronize(&mut self, unix_secs: u64, at: Instant) {
        self.synced = Some(Sample { unix_secs, at });
    }

    pub fn is_synchronized(&self) -> bool {
        self.synced.is_some()
    }

    /// Seconds since the Unix epoch, UTC
    pub fn unix_time(&self, now: Instant) -> Option<u64> {
        let sync = self.synced?;
        Some(sync.unix_secs + now.saturating_duration_since(sync.at).as_secs())
    }

    /// Seconds since the Unix epoch with the UTC offset applied
    pub fn local_time(&self, now: Instant) -> Option<u64> {
        let utc = self.unix_time(now)?;
        Some(utc.saturating_add_signed(self.utc_offset_secs))
    }
}
