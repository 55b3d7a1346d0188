//! Liveness gate that holds wave completion until every unit has reported.

use std::{sync::Arc, time::Duration};

use wave_defence_core::{CompletionToken, LivenessCounter, LivenessTally, WaveNumber};

/// Live count that stopped moving for longer than the stall timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stall {
    pub(crate) alive: u32,
    pub(crate) idle: Duration,
}

/// Per-wave liveness gate with a watchdog over the live count.
#[derive(Debug)]
pub(crate) struct LivenessGate {
    counter: Arc<LivenessCounter>,
    last_observed: u32,
    last_change_at: Duration,
    stall_reported: bool,
}

impl LivenessGate {
    pub(crate) fn new(wave: WaveNumber, expected: u32, now: Duration) -> Self {
        Self {
            counter: LivenessCounter::new(wave, expected),
            last_observed: expected,
            last_change_at: now,
            stall_reported: false,
        }
    }

    pub(crate) fn alive(&self) -> u32 {
        self.counter.alive()
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.counter.is_drained()
    }

    pub(crate) fn issue_token(&self) -> Option<CompletionToken> {
        self.counter.issue_token()
    }

    pub(crate) fn skip(&self, units: u32) -> u32 {
        self.counter.skip(units)
    }

    pub(crate) fn tally(&self) -> LivenessTally {
        self.counter.tally()
    }

    /// Restarts the idle clock at `now`; spawn activity counts as progress.
    pub(crate) fn rearm(&mut self, now: Duration) {
        self.last_observed = self.counter.alive();
        self.last_change_at = now;
        self.stall_reported = false;
    }

    /// Samples the live count and reports a stall once per idle stretch.
    pub(crate) fn observe(&mut self, now: Duration, stall_timeout: Option<Duration>) -> Option<Stall> {
        let alive = self.counter.alive();
        if alive != self.last_observed {
            self.last_observed = alive;
            self.last_change_at = now;
            self.stall_reported = false;
            return None;
        }

        let timeout = stall_timeout?;
        let idle = now.saturating_sub(self.last_change_at);
        if self.stall_reported || idle < timeout {
            return None;
        }

        self.stall_reported = true;
        Some(Stall { alive, idle })
    }
}
