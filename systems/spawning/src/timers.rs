//! Cooperative timer queue that replaces suspended spawn sequences.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

/// Deferred work resumed when the scheduler clock reaches a timer's due time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    /// Release one unit of a group and queue the next one.
    SpawnUnit { set: usize, group: usize, ordinal: u32 },
    /// The slowest group of a set released its last unit.
    SetSpawningFinished { set: usize },
    /// Post-set delay elapsed; start the set at `next` or hand off to clearance.
    AdvanceSet { next: usize },
    /// Check whether the liveness gate drained.
    PollClearance,
    /// Inter-wave delay elapsed.
    StartNextWave,
}

impl Task {
    // Spawns due at an instant run before the bookkeeping that observes them.
    fn rank(self) -> u8 {
        match self {
            Self::SpawnUnit { .. } => 0,
            Self::SetSpawningFinished { .. } => 1,
            Self::AdvanceSet { .. } | Self::PollClearance | Self::StartNextWave => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Timer {
    pub(crate) due: Duration,
    pub(crate) epoch: u64,
    pub(crate) task: Task,
    sequence: u64,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.task.rank().cmp(&other.task.rank()))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of timers ordered by due time, task rank and insertion order.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<Reverse<Timer>>,
    next_sequence: u64,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, due: Duration, epoch: u64, task: Task) {
        let timer = Timer {
            due,
            epoch,
            task,
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.heap.push(Reverse(timer));
    }

    /// Removes the earliest timer if it is due at or before `deadline`.
    pub(crate) fn pop_due(&mut self, deadline: Duration) -> Option<Timer> {
        match self.heap.peek() {
            Some(Reverse(timer)) if timer.due <= deadline => {
                self.heap.pop().map(|Reverse(timer)| timer)
            }
            _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
