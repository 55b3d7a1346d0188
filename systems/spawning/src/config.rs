//! Scheduler settings.

use std::time::Duration;

/// Interval at which a wave awaiting clearance re-checks its live count.
pub const DEFAULT_CLEARANCE_POLL_INTERVAL: Duration = Duration::from_millis(500);

const MIN_CLEARANCE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    auto_start: bool,
    auto_progress: bool,
    loop_waves: bool,
    clearance_poll_interval: Duration,
    stall_timeout: Option<Duration>,
}

impl Config {
    /// Creates the default configuration: auto start and auto progression on,
    /// looping off, half-second clearance polling and no stall watchdog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_start: true,
            auto_progress: true,
            loop_waves: false,
            clearance_poll_interval: DEFAULT_CLEARANCE_POLL_INTERVAL,
            stall_timeout: None,
        }
    }

    /// Sets whether [`crate::WaveScheduler::start`] begins the first wave.
    #[must_use]
    pub const fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Sets whether a cleared wave automatically starts the next one.
    #[must_use]
    pub const fn with_auto_progress(mut self, auto_progress: bool) -> Self {
        self.auto_progress = auto_progress;
        self
    }

    /// Sets whether the campaign restarts from the first wave after the last.
    #[must_use]
    pub const fn with_loop_waves(mut self, loop_waves: bool) -> Self {
        self.loop_waves = loop_waves;
        self
    }

    /// Sets the clearance polling interval. Intervals shorter than one
    /// millisecond are raised to one millisecond.
    #[must_use]
    pub fn with_clearance_poll_interval(mut self, interval: Duration) -> Self {
        self.clearance_poll_interval = interval.max(MIN_CLEARANCE_POLL_INTERVAL);
        self
    }

    /// Enables the stall watchdog with the provided idle timeout.
    #[must_use]
    pub const fn with_stall_timeout(mut self, stall_timeout: Option<Duration>) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    /// Whether the first wave starts automatically.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Whether cleared waves start the next wave automatically.
    #[must_use]
    pub const fn auto_progress(&self) -> bool {
        self.auto_progress
    }

    /// Whether the campaign loops after the last wave.
    #[must_use]
    pub const fn loop_waves(&self) -> bool {
        self.loop_waves
    }

    /// Interval between clearance checks.
    #[must_use]
    pub const fn clearance_poll_interval(&self) -> Duration {
        self.clearance_poll_interval
    }

    /// Idle period after which a wave awaiting clearance is flagged as stalled.
    #[must_use]
    pub const fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
