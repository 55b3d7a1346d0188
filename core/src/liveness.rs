//! Liveness accounting shared between the scheduler and spawned units.
//!
//! A [`LivenessCounter`] is created per wave with the number of units the wave
//! expects. Every unit slot is claimed exactly once, either by issuing a
//! [`CompletionToken`] to a spawned unit or by skipping the slot outright, so
//! the live count can only ever fall to zero and never below it.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crate::WaveNumber;

/// Terminal outcome recorded for a unit slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// The unit was defeated or otherwise removed from the world.
    Removed,
    /// The unit walked its full path without being defeated.
    ReachedEnd,
    /// The unit never entered the world.
    Cancelled,
    /// The unit's token was dropped without an explicit report.
    Abandoned,
}

/// Breakdown of how a wave's unit slots have completed so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LivenessTally {
    /// Units the wave expected when it started.
    pub expected: u32,
    /// Units that have not reported completion yet.
    pub alive: u32,
    /// Units reported as removed.
    pub removed: u32,
    /// Units reported as having reached the end of their path.
    pub reached_end: u32,
    /// Units that were skipped before entering the world.
    pub cancelled: u32,
    /// Units whose tokens were dropped without a report.
    pub abandoned: u32,
}

/// Atomic countdown of units still alive for one wave.
#[derive(Debug)]
pub struct LivenessCounter {
    wave: WaveNumber,
    expected: u32,
    unclaimed: AtomicU32,
    alive: AtomicU32,
    removed: AtomicU32,
    reached_end: AtomicU32,
    cancelled: AtomicU32,
    abandoned: AtomicU32,
}

impl LivenessCounter {
    /// Creates a counter expecting `expected` units for the provided wave.
    #[must_use]
    pub fn new(wave: WaveNumber, expected: u32) -> Arc<Self> {
        Arc::new(Self {
            wave,
            expected,
            unclaimed: AtomicU32::new(expected),
            alive: AtomicU32::new(expected),
            removed: AtomicU32::new(0),
            reached_end: AtomicU32::new(0),
            cancelled: AtomicU32::new(0),
            abandoned: AtomicU32::new(0),
        })
    }

    /// Wave the counter tracks.
    #[must_use]
    pub const fn wave(&self) -> WaveNumber {
        self.wave
    }

    /// Units the wave expected when the counter was created.
    #[must_use]
    pub const fn expected(&self) -> u32 {
        self.expected
    }

    /// Units that have not reported completion yet.
    #[must_use]
    pub fn alive(&self) -> u32 {
        self.alive.load(Ordering::Acquire)
    }

    /// Unit slots that were neither issued a token nor skipped.
    #[must_use]
    pub fn unclaimed(&self) -> u32 {
        self.unclaimed.load(Ordering::Acquire)
    }

    /// Reports whether every expected unit has completed.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.alive() == 0
    }

    /// Claims one unit slot and returns the token the spawned unit must consume.
    ///
    /// Returns `None` once every expected slot has been claimed.
    #[must_use]
    pub fn issue_token(self: &Arc<Self>) -> Option<CompletionToken> {
        if !self.claim() {
            return None;
        }

        Some(CompletionToken {
            wave: self.wave,
            counter: Some(Arc::clone(self)),
        })
    }

    /// Claims up to `units` slots and completes them as cancelled.
    ///
    /// Returns the number of slots actually skipped, which is lower than
    /// `units` only when fewer slots remained unclaimed.
    pub fn skip(&self, units: u32) -> u32 {
        let mut skipped = 0;
        while skipped < units && self.claim() {
            self.record(Completion::Cancelled);
            skipped += 1;
        }
        skipped
    }

    /// Captures the current completion breakdown.
    #[must_use]
    pub fn tally(&self) -> LivenessTally {
        LivenessTally {
            expected: self.expected,
            alive: self.alive(),
            removed: self.removed.load(Ordering::Acquire),
            reached_end: self.reached_end.load(Ordering::Acquire),
            cancelled: self.cancelled.load(Ordering::Acquire),
            abandoned: self.abandoned.load(Ordering::Acquire),
        }
    }

    fn claim(&self) -> bool {
        self.unclaimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .is_ok()
    }

    fn record(&self, completion: Completion) {
        let decremented = self
            .alive
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });

        if let Err(count) = decremented {
            tracing::error!(
                wave = self.wave.get(),
                ?completion,
                "liveness counter underflow; completion reported for an unclaimed unit"
            );
            debug_assert!(
                count > 0,
                "liveness counter for wave {} would go negative",
                self.wave
            );
            return;
        }

        let bucket = match completion {
            Completion::Removed => &self.removed,
            Completion::ReachedEnd => &self.reached_end,
            Completion::Cancelled => &self.cancelled,
            Completion::Abandoned => &self.abandoned,
        };
        let _ = bucket.fetch_add(1, Ordering::AcqRel);
    }
}

/// Single-use handle a spawned unit consumes to report leaving the world.
///
/// Every reporting method takes the token by value, so a unit cannot report
/// twice. A token dropped without a report counts the unit as removed and logs
/// a warning, which keeps the wave from stalling on a unit that vanished.
#[must_use = "a spawned unit must report its completion exactly once"]
#[derive(Debug)]
pub struct CompletionToken {
    wave: WaveNumber,
    counter: Option<Arc<LivenessCounter>>,
}

impl CompletionToken {
    /// Wave the unit belongs to.
    #[must_use]
    pub const fn wave(&self) -> WaveNumber {
        self.wave
    }

    /// Reports that the unit was defeated or otherwise removed.
    pub fn removed(mut self) {
        self.complete(Completion::Removed);
    }

    /// Reports that the unit walked its full path without being defeated.
    pub fn reached_end(mut self) {
        self.complete(Completion::ReachedEnd);
    }

    /// Reports that the unit never entered the world.
    pub fn cancel(mut self) {
        self.complete(Completion::Cancelled);
    }

    fn complete(&mut self, completion: Completion) {
        if let Some(counter) = self.counter.take() {
            counter.record(completion);
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if self.counter.is_some() {
            tracing::warn!(
                wave = self.wave.get(),
                "completion token dropped without a report; counting the unit as removed"
            );
            self.complete(Completion::Abandoned);
        }
    }
}
