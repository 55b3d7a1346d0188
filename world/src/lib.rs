#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless authoritative world for Wave Defence.
//!
//! The world owns every spawned unit together with its completion token and
//! walks units along their spawn point's waypoints. Units that walk off the end
//! of their path cost the player lives; units defeated through
//! [`Command::DefeatUnit`] simply leave. Either way the unit's token is
//! consumed exactly once.

use std::{collections::HashMap, time::Duration};

use glam::{Quat, Vec3};
use tracing::{debug, warn};
use wave_defence_core::{
    Command, CompletionToken, Event, SpawnError, SpawnFailure, SpawnRequest, UnitFactory, UnitId,
    UnitTemplateId, WaveNumber,
};

/// Distance under which a unit counts as standing on its waypoint.
pub const WAYPOINT_TOLERANCE: f32 = 0.1;

/// Default number of lives the player starts with.
pub const DEFAULT_STARTING_LIVES: u32 = 200;

/// Movement and durability parameters shared by every unit of a template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTemplate {
    speed: f32,
    health: f32,
}

impl UnitTemplate {
    /// Creates a template that moves `speed` world units per second and
    /// carries `health` hit points.
    #[must_use]
    pub const fn new(speed: f32, health: f32) -> Self {
        Self { speed, health }
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Hit points carried by fresh units.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    fn lives_cost(&self) -> u32 {
        // Finite positive health; the float-to-int cast saturates.
        self.health.ceil() as u32
    }
}

#[derive(Debug)]
struct Unit {
    id: UnitId,
    template: UnitTemplateId,
    wave: WaveNumber,
    position: Vec3,
    rotation: Quat,
    path: Vec<Vec3>,
    next_waypoint: usize,
    speed: f32,
    lives_cost: u32,
    health: f32,
    token: CompletionToken,
}

impl Unit {
    /// Moves the unit toward its remaining waypoints and reports whether it
    /// passed the final one.
    fn advance(&mut self, dt: Duration) -> bool {
        let mut budget = self.speed * dt.as_secs_f32();

        while let Some(target) = self.path.get(self.next_waypoint).copied() {
            let offset = target - self.position;
            let distance = offset.length();
            if distance <= WAYPOINT_TOLERANCE {
                self.next_waypoint += 1;
                continue;
            }

            let heading = offset / distance;
            self.rotation = Quat::from_rotation_y(heading.x.atan2(heading.z));
            if budget >= distance {
                self.position = target;
                budget -= distance;
                self.next_waypoint += 1;
            } else {
                self.position += heading * budget;
                return false;
            }
        }

        true
    }
}

/// Represents the authoritative Wave Defence world state.
#[derive(Debug)]
pub struct World {
    templates: HashMap<UnitTemplateId, UnitTemplate>,
    units: Vec<Unit>,
    next_unit_id: u32,
    lives: u32,
    lives_depleted: bool,
    elapsed: Duration,
}

impl World {
    /// Creates a world that can instantiate the provided templates.
    #[must_use]
    pub fn new(
        templates: impl IntoIterator<Item = (UnitTemplateId, UnitTemplate)>,
        starting_lives: u32,
    ) -> Self {
        Self {
            templates: templates.into_iter().collect(),
            units: Vec::new(),
            next_unit_id: 1,
            lives: starting_lives,
            lives_depleted: starting_lives == 0,
            elapsed: Duration::ZERO,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);

        let mut remaining = Vec::with_capacity(self.units.len());
        for mut unit in std::mem::take(&mut self.units) {
            if !unit.advance(dt) {
                remaining.push(unit);
                continue;
            }

            let Unit {
                id,
                lives_cost,
                token,
                ..
            } = unit;
            token.reached_end();
            debug!(unit = %id, lives_lost = lives_cost, "unit reached the end of its path");
            out_events.push(Event::UnitReachedEnd {
                unit: id,
                lives_lost: lives_cost,
            });
            self.lose_lives(lives_cost, out_events);
        }
        self.units = remaining;
    }

    fn lose_lives(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.lives = self.lives.saturating_sub(amount);
        if self.lives == 0 && !self.lives_depleted {
            self.lives_depleted = true;
            warn!(elapsed = ?self.elapsed, "player has no lives left");
            out_events.push(Event::LivesDepleted);
        }
    }

    fn defeat(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let Some(index) = self.units.iter().position(|candidate| candidate.id == unit) else {
            debug!(unit = %unit, "ignoring defeat of unknown unit");
            return;
        };

        let defeated = self.units.remove(index);
        defeated.token.removed();
        out_events.push(Event::UnitDefeated { unit });
    }
}

impl UnitFactory for World {
    fn spawn(
        &mut self,
        request: SpawnRequest<'_>,
        token: CompletionToken,
    ) -> Result<UnitId, SpawnFailure> {
        let Some(template) = self.templates.get(request.template).copied() else {
            return Err(SpawnFailure::new(
                SpawnError::UnknownTemplate(request.template.clone()),
                token,
            ));
        };

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.wrapping_add(1);
        self.units.push(Unit {
            id,
            template: request.template.clone(),
            wave: request.wave,
            position: request.position,
            rotation: request.rotation,
            path: request.path.to_vec(),
            next_waypoint: 0,
            speed: template.speed(),
            lives_cost: template.lives_cost(),
            health: template.health(),
            token,
        });
        Ok(id)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.tick(dt, out_events);
        }
        Command::DefeatUnit { unit } => world.defeat(unit, out_events),
        Command::StartNextWave => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::{Quat, Vec3};
    use wave_defence_core::{UnitId, UnitTemplateId, WaveNumber};

    use super::World;

    /// Captures a read-only view of the units walking the world.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let mut snapshots: Vec<UnitSnapshot> = world
            .units
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id,
                template: unit.template.clone(),
                wave: unit.wave,
                position: unit.position,
                rotation: unit.rotation,
                next_waypoint: unit.path.get(unit.next_waypoint).copied(),
                health: unit.health,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        UnitView { snapshots }
    }

    /// Number of units currently in the world.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.units.len()
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Total simulated time the world has advanced through.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Read-only snapshot describing all units within the world.
    #[derive(Clone, Debug)]
    pub struct UnitView {
        snapshots: Vec<UnitSnapshot>,
    }

    impl UnitView {
        /// Iterator over the captured unit snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<UnitSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single unit's state used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct UnitSnapshot {
        /// Identifier assigned at spawn time.
        pub id: UnitId,
        /// Template the unit was instantiated from.
        pub template: UnitTemplateId,
        /// Wave the unit belongs to.
        pub wave: WaveNumber,
        /// Current world-space position.
        pub position: Vec3,
        /// Current facing.
        pub rotation: Quat,
        /// Waypoint the unit is walking toward, if any remain.
        pub next_waypoint: Option<Vec3>,
        /// Hit points carried by the unit.
        pub health: f32,
    }
}
