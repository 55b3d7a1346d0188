//! Immutable wave definitions consumed by the scheduler.

use std::{fmt, time::Duration};

use glam::{Quat, Vec3};

use crate::SpawnPointIndex;

/// Name of a unit template understood by the unit factory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitTemplateId(String);

impl UnitTemplateId {
    /// Creates a template identifier from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the template.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position and orientation at which units are instantiated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
}

impl Transform {
    /// Creates a transform from a position and rotation.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Creates an unrotated transform at the provided position.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// World-space position of the transform.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// World-space rotation of the transform.
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }
}

/// Named location where units enter the world, paired with the path they walk.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPoint {
    name: String,
    origin: Transform,
    waypoints: Vec<Vec3>,
}

impl SpawnPoint {
    /// Creates a spawn point from its name, origin and ordered waypoints.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: Transform, waypoints: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            origin,
            waypoints,
        }
    }

    /// Display name of the spawn point.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform applied to units created at this spawn point.
    #[must_use]
    pub const fn origin(&self) -> Transform {
        self.origin
    }

    /// Ordered waypoints every unit created here must walk.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }
}

/// Homogeneous burst of units released from a single spawn point.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnGroup {
    unit: Option<UnitTemplateId>,
    count: u32,
    spawn_point: SpawnPointIndex,
    inter_spawn_delay: Duration,
}

impl SpawnGroup {
    /// Creates a group of `count` units released `inter_spawn_delay` apart.
    ///
    /// A group without a template still counts towards the wave total; every
    /// one of its units is skipped when its turn to spawn arrives.
    #[must_use]
    pub fn new(
        unit: Option<UnitTemplateId>,
        count: u32,
        spawn_point: SpawnPointIndex,
        inter_spawn_delay: Duration,
    ) -> Self {
        Self {
            unit,
            count,
            spawn_point,
            inter_spawn_delay,
        }
    }

    /// Template instantiated for every unit in the group, if configured.
    #[must_use]
    pub fn unit(&self) -> Option<&UnitTemplateId> {
        self.unit.as_ref()
    }

    /// Number of units released by the group.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Spawn point the group releases its units from.
    #[must_use]
    pub const fn spawn_point(&self) -> SpawnPointIndex {
        self.spawn_point
    }

    /// Delay between consecutive units of the group.
    #[must_use]
    pub const fn inter_spawn_delay(&self) -> Duration {
        self.inter_spawn_delay
    }

    /// Time between the first and the last unit of the group.
    #[must_use]
    pub fn spawn_duration(&self) -> Duration {
        self.inter_spawn_delay
            .saturating_mul(self.count.saturating_sub(1))
    }
}

/// Collection of groups that start together.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnSet {
    name: String,
    groups: Vec<SpawnGroup>,
    post_set_delay: Duration,
}

impl SpawnSet {
    /// Creates a set from its name, groups and the pause that follows it.
    #[must_use]
    pub fn new(name: impl Into<String>, groups: Vec<SpawnGroup>, post_set_delay: Duration) -> Self {
        Self {
            name: name.into(),
            groups,
            post_set_delay,
        }
    }

    /// Display name of the set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Groups started when the set begins.
    #[must_use]
    pub fn groups(&self) -> &[SpawnGroup] {
        &self.groups
    }

    /// Pause applied after the set finishes spawning when sets run sequentially.
    #[must_use]
    pub const fn post_set_delay(&self) -> Duration {
        self.post_set_delay
    }

    /// Duration of the slowest group's spawn sequence.
    #[must_use]
    pub fn spawn_duration(&self) -> Duration {
        self.groups
            .iter()
            .map(SpawnGroup::spawn_duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Number of units released by every group of the set.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.count()))
    }
}

/// Execution policy for the sets of a wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SetMode {
    /// Sets run one after another, each followed by its post-set delay.
    #[default]
    Sequential,
    /// Every set starts in the same scheduling tick.
    Simultaneous,
}

impl fmt::Display for SetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequentially"),
            Self::Simultaneous => f.write_str("simultaneously"),
        }
    }
}

/// Top-level unit of progression.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveDefinition {
    name: String,
    sets: Vec<SpawnSet>,
    set_mode: SetMode,
    pre_next_wave_delay: Duration,
}

impl WaveDefinition {
    /// Creates a wave from its name, sets, set policy and the pause before the next wave.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sets: Vec<SpawnSet>,
        set_mode: SetMode,
        pre_next_wave_delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            sets,
            set_mode,
            pre_next_wave_delay,
        }
    }

    /// Display name of the wave.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets composing the wave in configured order.
    #[must_use]
    pub fn sets(&self) -> &[SpawnSet] {
        &self.sets
    }

    /// Execution policy for the wave's sets.
    #[must_use]
    pub const fn set_mode(&self) -> SetMode {
        self.set_mode
    }

    /// Pause between clearance and the automatic start of the next wave.
    #[must_use]
    pub const fn pre_next_wave_delay(&self) -> Duration {
        self.pre_next_wave_delay
    }

    /// Number of units the wave is expected to release, skipped units included.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.sets
            .iter()
            .fold(0u32, |total, set| total.saturating_add(set.unit_count()))
    }
}

/// Static campaign configuration: spawn points plus the ordered waves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Campaign {
    spawn_points: Vec<SpawnPoint>,
    waves: Vec<WaveDefinition>,
}

impl Campaign {
    /// Creates a campaign from its spawn points and waves.
    #[must_use]
    pub fn new(spawn_points: Vec<SpawnPoint>, waves: Vec<WaveDefinition>) -> Self {
        Self {
            spawn_points,
            waves,
        }
    }

    /// Spawn points addressable by index.
    #[must_use]
    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Waves in the order they are played.
    #[must_use]
    pub fn waves(&self) -> &[WaveDefinition] {
        &self.waves
    }

    /// Consumes the campaign, yielding spawn points and waves.
    #[must_use]
    pub fn into_parts(self) -> (Vec<SpawnPoint>, Vec<WaveDefinition>) {
        (self.spawn_points, self.waves)
    }
}
