#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wave Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the wave scheduler. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point and broadcasts [`Event`] values. The scheduler
//! consumes those events, instantiates units through a [`UnitFactory`], and
//! publishes its own progress as further events.
//!
//! Liveness flows the other way: every spawned unit carries a
//! [`CompletionToken`] that must be consumed exactly once when the unit leaves
//! the world, and the scheduler gates wave progression on the shared
//! [`LivenessCounter`] draining to zero.

use std::{fmt, time::Duration};

mod factory;
mod liveness;
mod wave;

pub use factory::{SpawnError, SpawnFailure, SpawnRequest, UnitFactory};
pub use liveness::{Completion, CompletionToken, LivenessCounter, LivenessTally};
pub use wave::{
    Campaign, SetMode, SpawnGroup, SpawnPoint, SpawnSet, Transform, UnitTemplateId,
    WaveDefinition,
};

/// Commands that express all permissible simulation mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a unit be removed from the world as defeated.
    DefeatUnit {
        /// Identifier of the unit to remove.
        unit: UnitId,
    },
    /// Requests that the scheduler begin the next wave.
    ///
    /// Ignored while a wave is still spawning or awaiting clearance.
    StartNextWave,
}

/// Events broadcast by the world and the scheduler after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// One-based number of the wave.
        wave: WaveNumber,
        /// Display name of the wave.
        name: String,
        /// Total number of units the wave is expected to spawn.
        expected_units: u32,
        /// Execution policy applied to the wave's sets.
        mode: SetMode,
        /// Scheduler time at which the wave started.
        at: Duration,
    },
    /// Announces that every group of a set was started.
    SetStarted {
        /// Wave that owns the set.
        wave: WaveNumber,
        /// Zero-based index of the set within its wave.
        set: usize,
        /// Scheduler time at which the set started.
        at: Duration,
    },
    /// Reports that a set's estimated spawning duration elapsed.
    SetSpawningFinished {
        /// Wave that owns the set.
        wave: WaveNumber,
        /// Zero-based index of the set within its wave.
        set: usize,
        /// Scheduler time at which spawning finished.
        at: Duration,
    },
    /// Confirms that a unit was instantiated by the unit factory.
    UnitSpawned {
        /// Identifier assigned to the unit by the factory.
        unit: UnitId,
        /// Wave the unit belongs to.
        wave: WaveNumber,
        /// Zero-based index of the set within its wave.
        set: usize,
        /// Zero-based index of the group within its set.
        group: usize,
        /// Zero-based position of the unit within its group's burst.
        ordinal: u32,
        /// Scheduler time at which the unit was created.
        at: Duration,
    },
    /// Reports that units expected by a wave were skipped instead of spawned.
    SpawnSkipped {
        /// Wave the skipped units belonged to.
        wave: WaveNumber,
        /// Zero-based index of the set within its wave.
        set: usize,
        /// Zero-based index of the group within its set.
        group: usize,
        /// Number of units removed from the wave's expected total.
        units: u32,
        /// Reason the units could not be spawned.
        reason: SkipReason,
        /// Scheduler time at which the skip happened.
        at: Duration,
    },
    /// Announces that all spawning work was handed to the liveness gate.
    WaitingForClearance {
        /// Wave awaiting clearance.
        wave: WaveNumber,
        /// Scheduler time at which the wait began.
        at: Duration,
    },
    /// Announces that every unit expected by the wave reported completion.
    WaveCleared {
        /// Wave that cleared.
        wave: WaveNumber,
        /// Breakdown of how the wave's units completed.
        tally: LivenessTally,
        /// Scheduler time at which clearance was observed.
        at: Duration,
    },
    /// Diagnostic raised when a wave's live count stopped moving.
    WaveStalled {
        /// Wave that appears stuck.
        wave: WaveNumber,
        /// Units still counted as alive.
        alive: u32,
        /// Time elapsed since the live count last changed.
        idle: Duration,
    },
    /// Announces that the final wave cleared and looping restarted from the first.
    CampaignRestarted {
        /// Scheduler time at which the campaign restarted.
        at: Duration,
    },
    /// Announces that all configured waves completed and progression halted.
    CampaignFinished {
        /// Number of waves configured in the campaign.
        waves: usize,
        /// Scheduler time at which progression halted.
        at: Duration,
    },
    /// Confirms that a unit completed its path without being defeated.
    UnitReachedEnd {
        /// Identifier of the unit that leaked through.
        unit: UnitId,
        /// Lives deducted from the player for the leak.
        lives_lost: u32,
    },
    /// Confirms that a unit was removed from the world as defeated.
    UnitDefeated {
        /// Identifier of the defeated unit.
        unit: UnitId,
    },
    /// Announces that the player ran out of lives.
    LivesDepleted,
}

/// Reasons a scheduled unit was skipped rather than spawned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The group referenced a spawn point that is not registered.
    UnknownSpawnPoint {
        /// Index requested by the group.
        index: SpawnPointIndex,
    },
    /// The group did not name a unit template.
    MissingTemplate,
    /// The unit factory declined to instantiate the unit.
    FactoryRejected(SpawnError),
    /// The wave already issued every completion token it expected.
    ExpectedCountExceeded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSpawnPoint { index } => write!(f, "spawn point {index} is not registered"),
            Self::MissingTemplate => f.write_str("group has no unit template"),
            Self::FactoryRejected(error) => write!(f, "unit factory rejected spawn: {error}"),
            Self::ExpectedCountExceeded => f.write_str("wave exceeded its expected unit count"),
        }
    }
}

/// Lifecycle phase of the wave driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SchedulePhase {
    /// No wave is active; the driver may be counting down to the next one.
    #[default]
    Idle,
    /// Sets of the current wave are still being started.
    Spawning,
    /// Spawning finished; the driver waits for every unit to report completion.
    WaitingForClearance,
    /// All waves completed and looping is disabled.
    Finished,
}

/// Read-only snapshot of wave progress for UI and telemetry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// One-based number of the current wave, or zero before the first wave.
    pub wave_number: u32,
    /// Number of waves configured in the campaign.
    pub total_waves: usize,
    /// Units of the current wave that have not yet reported completion.
    pub units_alive: u32,
    /// Indicates whether the driver is still starting sets for the wave.
    pub is_spawning: bool,
    /// Display name of the current wave, if one has started.
    pub wave_name: Option<String>,
    /// Current lifecycle phase of the driver.
    pub phase: SchedulePhase,
}

/// Unique identifier assigned to a unit by the unit factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One-based wave number as presented to players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a wave number from its one-based value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Converts a zero-based wave index into its one-based number.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).map_or(u32::MAX, |index| index.saturating_add(1)))
    }

    /// Retrieves the one-based value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the campaign's spawn point table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnPointIndex(usize);

impl SpawnPointIndex {
    /// Creates a new spawn point index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SpawnPointIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
