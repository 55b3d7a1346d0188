#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawn scheduler that turns static wave definitions into timed unit
//! creation and gates wave progression on unit liveness.
//!
//! The scheduler runs on a single logical context against its own monotonic
//! clock. Every suspension point of a wave (inter-spawn delays, post-set
//! delays, the clearance wait and the inter-wave delay) is an explicit timer
//! in a cooperative queue, resumed when [`WaveScheduler::advance`] moves the
//! clock past its due time. Timers carry the epoch of the wave that queued
//! them, so work left over from a superseded wave is discarded instead of
//! resumed.

use std::time::Duration;

use tracing::{debug, info, warn};
use wave_defence_core::{
    Campaign, Command, Event, LivenessTally, SchedulePhase, SetMode, SkipReason, UnitFactory,
    WaveDefinition, WaveNumber, WaveProgress,
};

mod config;
mod gate;
mod group;
mod registry;
mod set;
mod timers;

pub use config::{Config, DEFAULT_CLEARANCE_POLL_INTERVAL};
pub use registry::{SpawnPointError, SpawnPointRegistry};

use gate::LivenessGate;
use group::SpawnOutcome;
use timers::{Task, TimerQueue};

/// Result of asking the scheduler to begin the next wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A wave began spawning.
    Started {
        /// Number of the wave that started.
        wave: WaveNumber,
        /// Indicates that the campaign wrapped around to its first wave.
        restarted: bool,
    },
    /// A wave is still spawning or awaiting clearance; the request was ignored.
    AlreadyActive,
    /// Every wave has been played and looping is disabled.
    Finished,
}

#[derive(Debug, Default)]
struct ScheduleState {
    wave_index: Option<usize>,
    phase: SchedulePhase,
    epoch: u64,
    waves_started: u64,
    sets_spawning: usize,
    gate: Option<LivenessGate>,
}

/// Drives waves through spawning, clearance and progression.
#[derive(Debug)]
pub struct WaveScheduler {
    config: Config,
    registry: SpawnPointRegistry,
    waves: Vec<WaveDefinition>,
    now: Duration,
    timers: TimerQueue,
    state: ScheduleState,
}

impl WaveScheduler {
    /// Creates a scheduler for the provided campaign. No wave starts until
    /// [`WaveScheduler::start`] or [`WaveScheduler::start_next_wave`] is called.
    #[must_use]
    pub fn new(campaign: Campaign, config: Config) -> Self {
        let (spawn_points, waves) = campaign.into_parts();
        Self {
            config,
            registry: SpawnPointRegistry::new(spawn_points),
            waves,
            now: Duration::ZERO,
            timers: TimerQueue::default(),
            state: ScheduleState::default(),
        }
    }

    /// Begins the first wave when auto start is enabled. A campaign without
    /// waves finishes immediately.
    pub fn start(&mut self, out: &mut Vec<Event>) {
        if self.config.auto_start() {
            let _ = self.start_next_wave(out);
        }
    }

    /// Consumes world events and commands, then advances the scheduler clock.
    ///
    /// `Command::StartNextWave` entries are applied before the clock moves;
    /// the clock advances by the sum of every `Event::TimeAdvanced` observed.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        commands: &[Command],
        factory: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: UnitFactory + ?Sized,
    {
        for command in commands {
            if matches!(command, Command::StartNextWave) {
                let _ = self.start_next_wave(out);
            }
        }

        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        self.advance(elapsed, factory, out);
    }

    /// Moves the scheduler clock forward by `dt`, resuming every timer that
    /// falls due. Timers due exactly now run even when `dt` is zero.
    ///
    /// A wave that starts and clears within the same instant does not chain
    /// into another start at that instant: the follow-up start is held back
    /// until the next call, so a looping campaign of waves that clear at once
    /// advances one wave per call instead of never returning.
    pub fn advance<F>(&mut self, dt: Duration, factory: &mut F, out: &mut Vec<Event>)
    where
        F: UnitFactory + ?Sized,
    {
        let deadline = self.now.saturating_add(dt);
        let mut started_at = None;
        let mut held = Vec::new();
        while let Some(timer) = self.timers.pop_due(deadline) {
            self.now = self.now.max(timer.due);
            if timer.epoch != self.state.epoch {
                continue;
            }
            if matches!(timer.task, Task::StartNextWave) && started_at == Some(self.now) {
                held.push(timer);
                continue;
            }
            let started_before = self.state.waves_started;
            self.run(timer.task, factory, out);
            if self.state.waves_started != started_before {
                started_at = Some(self.now);
            }
        }
        for timer in held {
            self.timers.schedule(timer.due, timer.epoch, timer.task);
        }
        self.now = deadline;
    }

    /// Begins the next wave, wrapping or finishing when the waves run out.
    ///
    /// The request is ignored, not queued, while a wave is spawning or
    /// awaiting clearance, and after the campaign finished.
    pub fn start_next_wave(&mut self, out: &mut Vec<Event>) -> StartOutcome {
        match self.state.phase {
            SchedulePhase::Spawning | SchedulePhase::WaitingForClearance => {
                debug!(phase = ?self.state.phase, "ignoring start request while wave is active");
                return StartOutcome::AlreadyActive;
            }
            SchedulePhase::Finished => return StartOutcome::Finished,
            SchedulePhase::Idle => {}
        }

        let next = self.state.wave_index.map_or(0, |index| index + 1);
        let mut restarted = false;
        if next >= self.waves.len() {
            if !self.config.loop_waves() || self.waves.is_empty() {
                self.finish(out);
                return StartOutcome::Finished;
            }
            info!("all waves complete, restarting from wave 1");
            out.push(Event::CampaignRestarted { at: self.now });
            restarted = true;
        }

        let index = if restarted { 0 } else { next };
        self.begin_wave(index, out);
        StartOutcome::Started {
            wave: WaveNumber::from_index(index),
            restarted,
        }
    }

    /// One-based number of the current wave, or zero before the first wave.
    #[must_use]
    pub fn current_wave_number(&self) -> u32 {
        self.state
            .wave_index
            .map_or(0, |index| WaveNumber::from_index(index).get())
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.waves.len()
    }

    /// Units of the current wave that have not yet reported completion.
    #[must_use]
    pub fn units_alive(&self) -> u32 {
        self.state.gate.as_ref().map_or(0, LivenessGate::alive)
    }

    /// Whether the driver is still starting sets for the current wave.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.state.phase == SchedulePhase::Spawning
    }

    /// Display name of the current wave, if one has started.
    #[must_use]
    pub fn current_wave_name(&self) -> Option<&str> {
        self.current_wave().map(WaveDefinition::name)
    }

    /// Current lifecycle phase of the driver.
    #[must_use]
    pub fn phase(&self) -> SchedulePhase {
        self.state.phase
    }

    /// Current scheduler time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Completion breakdown of the current wave, if one has started.
    #[must_use]
    pub fn liveness(&self) -> Option<LivenessTally> {
        self.state.gate.as_ref().map(LivenessGate::tally)
    }

    /// Number of timers waiting to resume, stale ones included.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Captures a snapshot of wave progress for presentation.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        WaveProgress {
            wave_number: self.current_wave_number(),
            total_waves: self.total_waves(),
            units_alive: self.units_alive(),
            is_spawning: self.is_spawning(),
            wave_name: self.current_wave_name().map(str::to_owned),
            phase: self.phase(),
        }
    }

    fn current_wave(&self) -> Option<&WaveDefinition> {
        self.state
            .wave_index
            .and_then(|index| self.waves.get(index))
    }

    fn current_wave_number_typed(&self) -> WaveNumber {
        WaveNumber::from_index(self.state.wave_index.unwrap_or(0))
    }

    fn schedule(&mut self, delay: Duration, task: Task) {
        let due = self.now.saturating_add(delay);
        self.timers.schedule(due, self.state.epoch, task);
    }

    fn finish(&mut self, out: &mut Vec<Event>) {
        info!(waves = self.waves.len(), "all waves complete");
        self.state.phase = SchedulePhase::Finished;
        self.state.epoch = self.state.epoch.wrapping_add(1);
        self.timers.clear();
        out.push(Event::CampaignFinished {
            waves: self.waves.len(),
            at: self.now,
        });
    }

    fn begin_wave(&mut self, index: usize, out: &mut Vec<Event>) {
        let Some(wave) = self.waves.get(index) else {
            return;
        };

        let number = WaveNumber::from_index(index);
        let expected = wave.unit_count();
        let mode = wave.set_mode();
        let set_count = wave.sets().len();

        info!(
            wave = %wave.name(),
            number = number.get(),
            total = self.waves.len(),
            expected_units = expected,
            "starting wave; sets spawning {mode}"
        );
        out.push(Event::WaveStarted {
            wave: number,
            name: wave.name().to_owned(),
            expected_units: expected,
            mode,
            at: self.now,
        });

        self.state.epoch = self.state.epoch.wrapping_add(1);
        self.state.waves_started = self.state.waves_started.wrapping_add(1);
        self.state.sets_spawning = 0;
        self.state.wave_index = Some(index);
        self.state.gate = Some(LivenessGate::new(number, expected, self.now));
        self.state.phase = SchedulePhase::Spawning;

        match mode {
            SetMode::Sequential => self.advance_set(0, out),
            SetMode::Simultaneous => {
                for set in 0..set_count {
                    self.start_set(set, out);
                }
                self.enter_clearance(out);
            }
        }
    }

    fn run<F>(&mut self, task: Task, factory: &mut F, out: &mut Vec<Event>)
    where
        F: UnitFactory + ?Sized,
    {
        match task {
            Task::SpawnUnit {
                set,
                group,
                ordinal,
            } => self.spawn_unit(set, group, ordinal, factory, out),
            Task::SetSpawningFinished { set } => self.finish_set(set, out),
            Task::AdvanceSet { next } => self.advance_set(next, out),
            Task::PollClearance => self.poll_clearance(out),
            Task::StartNextWave => {
                let _ = self.start_next_wave(out);
            }
        }
    }

    fn advance_set(&mut self, next: usize, out: &mut Vec<Event>) {
        let set_count = self.current_wave().map_or(0, |wave| wave.sets().len());
        if next < set_count {
            self.start_set(next, out);
        } else {
            self.enter_clearance(out);
        }
    }

    fn start_set(&mut self, set_index: usize, out: &mut Vec<Event>) {
        let wave_number = self.current_wave_number_typed();
        let Some(wave) = self.state.wave_index.and_then(|index| self.waves.get(index)) else {
            return;
        };
        let Some(set) = wave.sets().get(set_index) else {
            return;
        };
        let Some(gate) = self.state.gate.as_ref() else {
            return;
        };

        let plan = set::plan_set(set, &self.registry);
        debug!(
            wave = wave_number.get(),
            set = %set.name(),
            groups = plan.startable.len(),
            spawn_duration = ?plan.spawn_duration,
            "starting set"
        );
        out.push(Event::SetStarted {
            wave: wave_number,
            set: set_index,
            at: self.now,
        });

        for (group_index, error) in &plan.unresolved {
            let requested = set.groups()[*group_index].count();
            let units = gate.skip(requested);
            warn!(
                wave = wave_number.get(),
                set = %set.name(),
                group = group_index,
                units,
                "{error}; skipping group"
            );
            let SpawnPointError::Unregistered { index, .. } = *error;
            out.push(Event::SpawnSkipped {
                wave: wave_number,
                set: set_index,
                group: *group_index,
                units,
                reason: SkipReason::UnknownSpawnPoint { index },
                at: self.now,
            });
        }

        for group in plan.startable {
            self.schedule(
                Duration::ZERO,
                Task::SpawnUnit {
                    set: set_index,
                    group,
                    ordinal: 0,
                },
            );
        }
        self.state.sets_spawning += 1;
        self.schedule(plan.spawn_duration, Task::SetSpawningFinished { set: set_index });
    }

    fn spawn_unit<F>(
        &mut self,
        set_index: usize,
        group_index: usize,
        ordinal: u32,
        factory: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: UnitFactory + ?Sized,
    {
        let wave_number = self.current_wave_number_typed();
        let Some(wave) = self.state.wave_index.and_then(|index| self.waves.get(index)) else {
            return;
        };
        let Some(group) = wave
            .sets()
            .get(set_index)
            .and_then(|set| set.groups().get(group_index))
        else {
            return;
        };
        let Some(gate) = self.state.gate.as_ref() else {
            return;
        };
        let Ok(point) = self.registry.resolve(group.spawn_point()) else {
            return;
        };

        let outcome = group::spawn_one(group, point, gate, wave_number, self.now, factory);
        if let Some(gate) = self.state.gate.as_mut() {
            gate.rearm(self.now);
        }
        match outcome {
            SpawnOutcome::Spawned(unit) => {
                debug!(
                    wave = wave_number.get(),
                    unit = %unit,
                    spawn_point = %point.name(),
                    ordinal,
                    "spawned unit"
                );
                out.push(Event::UnitSpawned {
                    unit,
                    wave: wave_number,
                    set: set_index,
                    group: group_index,
                    ordinal,
                    at: self.now,
                });
            }
            SpawnOutcome::Skipped(reason) => {
                warn!(
                    wave = wave_number.get(),
                    set = set_index,
                    group = group_index,
                    ordinal,
                    "{reason}; skipping unit"
                );
                out.push(Event::SpawnSkipped {
                    wave: wave_number,
                    set: set_index,
                    group: group_index,
                    units: 1,
                    reason,
                    at: self.now,
                });
            }
        }

        let next = ordinal.saturating_add(1);
        if next < group.count() {
            let delay = group.inter_spawn_delay();
            self.schedule(
                delay,
                Task::SpawnUnit {
                    set: set_index,
                    group: group_index,
                    ordinal: next,
                },
            );
        }
    }

    fn finish_set(&mut self, set_index: usize, out: &mut Vec<Event>) {
        self.state.sets_spawning = self.state.sets_spawning.saturating_sub(1);
        let wave_number = self.current_wave_number_typed();
        let Some(wave) = self.current_wave() else {
            return;
        };
        let mode = wave.set_mode();
        let post_set_delay = wave
            .sets()
            .get(set_index)
            .map_or(Duration::ZERO, |set| set.post_set_delay());

        debug!(wave = wave_number.get(), set = set_index, "set finished spawning");
        out.push(Event::SetSpawningFinished {
            wave: wave_number,
            set: set_index,
            at: self.now,
        });

        if mode == SetMode::Sequential {
            self.schedule(
                post_set_delay,
                Task::AdvanceSet {
                    next: set_index + 1,
                },
            );
        }
    }

    fn enter_clearance(&mut self, out: &mut Vec<Event>) {
        let wave_number = self.current_wave_number_typed();
        self.state.phase = SchedulePhase::WaitingForClearance;
        let now = self.now;
        if let Some(gate) = self.state.gate.as_mut() {
            gate.rearm(now);
        }
        debug!(
            wave = wave_number.get(),
            alive = self.units_alive(),
            "waiting for clearance"
        );
        out.push(Event::WaitingForClearance {
            wave: wave_number,
            at: self.now,
        });
        self.schedule(Duration::ZERO, Task::PollClearance);
    }

    fn poll_clearance(&mut self, out: &mut Vec<Event>) {
        if self.state.phase != SchedulePhase::WaitingForClearance {
            return;
        }

        let wave_number = self.current_wave_number_typed();
        let stall_timeout = self.config.stall_timeout();
        let now = self.now;
        let still_spawning = self.state.sets_spawning > 0;
        let Some(gate) = self.state.gate.as_mut() else {
            return;
        };

        if gate.is_drained() {
            self.clear_wave(out);
            return;
        }

        if still_spawning {
            gate.rearm(now);
        } else if let Some(stall) = gate.observe(now, stall_timeout) {
            warn!(
                wave = wave_number.get(),
                alive = stall.alive,
                idle = ?stall.idle,
                "wave appears stuck awaiting clearance"
            );
            out.push(Event::WaveStalled {
                wave: wave_number,
                alive: stall.alive,
                idle: stall.idle,
            });
        }

        let interval = self.config.clearance_poll_interval();
        self.schedule(interval, Task::PollClearance);
    }

    fn clear_wave(&mut self, out: &mut Vec<Event>) {
        let wave_number = self.current_wave_number_typed();
        let tally = self.liveness().unwrap_or_default();
        let (name, delay) = self.current_wave().map_or(("", Duration::ZERO), |wave| {
            (wave.name(), wave.pre_next_wave_delay())
        });

        info!(
            wave = %name,
            removed = tally.removed,
            reached_end = tally.reached_end,
            skipped = tally.cancelled,
            "wave complete"
        );
        out.push(Event::WaveCleared {
            wave: wave_number,
            tally,
            at: self.now,
        });

        self.state.phase = SchedulePhase::Idle;
        if self.config.auto_progress() {
            self.schedule(delay, Task::StartNextWave);
        }
    }
}
