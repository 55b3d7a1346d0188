#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loads versioned TOML campaign files into wave definitions, scheduler
//! settings and the unit templates understood by the headless world.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use glam::{Quat, Vec3};
use serde::Deserialize;
use tracing::{debug, info, warn};
use wave_defence_core::{
    Campaign, SetMode, SpawnGroup, SpawnPoint, SpawnPointIndex, SpawnSet, Transform,
    UnitTemplateId, WaveDefinition,
};
use wave_defence_system_spawning::Config;
use wave_defence_world::{UnitTemplate, World, DEFAULT_STARTING_LIVES};

/// Campaign file format version understood by this loader.
pub const SUPPORTED_CAMPAIGN_VERSION: u32 = 1;

const DEFAULT_UNIT_SPEED: f32 = 5.0;
const DEFAULT_UNIT_HEALTH: f32 = 100.0;
const DEFAULT_GROUP_COUNT: u32 = 1;
const DEFAULT_INTER_SPAWN_DELAY_SECS: f32 = 0.5;
const DEFAULT_POST_SET_DELAY_SECS: f32 = 2.0;
const DEFAULT_PRE_NEXT_WAVE_DELAY_SECS: f32 = 5.0;

/// Errors raised while reading or validating a campaign file.
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    /// The campaign file could not be read.
    #[error("failed to read campaign at {}", path.display())]
    Io {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not valid campaign TOML.
    #[error("failed to parse campaign toml contents")]
    Parse(#[from] toml::de::Error),
    /// The file declares a format version this loader does not understand.
    #[error("unsupported campaign version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the file.
        found: u32,
        /// Version supported by the loader.
        expected: u32,
    },
    /// A delay is negative, not finite or too large to represent.
    #[error("`{field}` must be a finite, non-negative number of seconds (got {value})")]
    InvalidDelay {
        /// Location of the offending value.
        field: String,
        /// Value found in the file.
        value: f32,
    },
    /// The clearance poll interval is not strictly positive.
    #[error("`scheduler.clearance_poll_interval_secs` must be positive (got {0})")]
    InvalidPollInterval(f32),
    /// Two unit templates share a name.
    #[error("unit template `{0}` is declared more than once")]
    DuplicateTemplate(String),
    /// A unit template carries an unusable attribute.
    #[error("unit template `{name}` has {attribute} {value}; expected a finite positive number")]
    InvalidTemplate {
        /// Template name.
        name: String,
        /// Attribute that failed validation.
        attribute: &'static str,
        /// Value found in the file.
        value: f32,
    },
}

/// Fully validated campaign ready to drive a scheduler and a world.
#[derive(Clone, Debug)]
pub struct LoadedCampaign {
    /// Spawn points and waves handed to the scheduler.
    pub campaign: Campaign,
    /// Scheduler settings from the `[scheduler]` table.
    pub scheduler: Config,
    /// Unit templates available to the headless world.
    pub templates: Vec<(UnitTemplateId, UnitTemplate)>,
    /// Lives the player starts with.
    pub starting_lives: u32,
}

impl LoadedCampaign {
    /// Builds a fresh headless world from the campaign's templates.
    #[must_use]
    pub fn world(&self) -> World {
        World::new(self.templates.iter().cloned(), self.starting_lives)
    }
}

/// Path of the demo campaign bundled with the repository.
#[must_use]
pub fn default_campaign_path() -> PathBuf {
    PathBuf::from("assets/campaign.toml")
}

/// Reads and validates the campaign stored at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedCampaign, CampaignError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| CampaignError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse(&contents)?;
    info!(
        path = %path.display(),
        waves = loaded.campaign.waves().len(),
        spawn_points = loaded.campaign.spawn_points().len(),
        templates = loaded.templates.len(),
        "loaded campaign"
    );
    Ok(loaded)
}

/// Parses and validates campaign TOML contents.
///
/// Spawn point indices referenced by groups are not checked here;
/// the scheduler skips groups whose spawn point is missing at run time.
pub fn parse(contents: &str) -> Result<LoadedCampaign, CampaignError> {
    let raw: RawCampaign = toml::from_str(contents)?;
    if raw.version != SUPPORTED_CAMPAIGN_VERSION {
        return Err(CampaignError::UnsupportedVersion {
            found: raw.version,
            expected: SUPPORTED_CAMPAIGN_VERSION,
        });
    }

    let scheduler = raw.scheduler.into_config()?;
    let templates = templates(raw.units)?;
    let spawn_points = raw
        .spawn_points
        .into_iter()
        .map(RawSpawnPoint::into_spawn_point)
        .collect();
    let waves = raw
        .waves
        .into_iter()
        .enumerate()
        .map(|(index, wave)| wave.into_wave(index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(waves = waves.len(), "parsed campaign waves");
    Ok(LoadedCampaign {
        campaign: Campaign::new(spawn_points, waves),
        scheduler,
        templates,
        starting_lives: raw.world.starting_lives,
    })
}

fn seconds(field: impl FnOnce() -> String, value: f32) -> Result<Duration, CampaignError> {
    Duration::try_from_secs_f32(value).map_err(|_| CampaignError::InvalidDelay {
        field: field(),
        value,
    })
}

fn templates(units: Vec<RawUnit>) -> Result<Vec<(UnitTemplateId, UnitTemplate)>, CampaignError> {
    let mut seen = HashSet::with_capacity(units.len());
    let mut templates = Vec::with_capacity(units.len());
    for unit in units {
        for (attribute, value) in [("speed", unit.speed), ("health", unit.health)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CampaignError::InvalidTemplate {
                    name: unit.name,
                    attribute,
                    value,
                });
            }
        }
        if !seen.insert(unit.name.clone()) {
            return Err(CampaignError::DuplicateTemplate(unit.name));
        }
        templates.push((
            UnitTemplateId::new(unit.name),
            UnitTemplate::new(unit.speed, unit.health),
        ));
    }
    Ok(templates)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCampaign {
    version: u32,
    #[serde(default)]
    scheduler: RawScheduler,
    #[serde(default)]
    world: RawWorld,
    #[serde(default)]
    units: Vec<RawUnit>,
    #[serde(default)]
    spawn_points: Vec<RawSpawnPoint>,
    #[serde(default)]
    waves: Vec<RawWave>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawScheduler {
    auto_start: bool,
    auto_progress: bool,
    loop_waves: bool,
    clearance_poll_interval_secs: f32,
    stall_timeout_secs: Option<f32>,
}

impl Default for RawScheduler {
    fn default() -> Self {
        let defaults = Config::new();
        Self {
            auto_start: defaults.auto_start(),
            auto_progress: defaults.auto_progress(),
            loop_waves: defaults.loop_waves(),
            clearance_poll_interval_secs: defaults.clearance_poll_interval().as_secs_f32(),
            stall_timeout_secs: None,
        }
    }
}

impl RawScheduler {
    fn into_config(self) -> Result<Config, CampaignError> {
        let interval = self.clearance_poll_interval_secs;
        if interval.is_nan() || interval <= 0.0 {
            return Err(CampaignError::InvalidPollInterval(interval));
        }
        let interval = seconds(|| "scheduler.clearance_poll_interval_secs".to_owned(), interval)?;
        let stall_timeout = self
            .stall_timeout_secs
            .map(|value| seconds(|| "scheduler.stall_timeout_secs".to_owned(), value))
            .transpose()?;

        Ok(Config::new()
            .with_auto_start(self.auto_start)
            .with_auto_progress(self.auto_progress)
            .with_loop_waves(self.loop_waves)
            .with_clearance_poll_interval(interval)
            .with_stall_timeout(stall_timeout))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawWorld {
    starting_lives: u32,
}

impl Default for RawWorld {
    fn default() -> Self {
        Self {
            starting_lives: DEFAULT_STARTING_LIVES,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUnit {
    name: String,
    #[serde(default = "default_unit_speed")]
    speed: f32,
    #[serde(default = "default_unit_health")]
    health: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpawnPoint {
    name: String,
    position: [f32; 3],
    #[serde(default)]
    rotation_degrees: f32,
    #[serde(default)]
    waypoints: Vec<[f32; 3]>,
}

impl RawSpawnPoint {
    fn into_spawn_point(self) -> SpawnPoint {
        let origin = Transform::new(
            Vec3::from_array(self.position),
            Quat::from_rotation_y(self.rotation_degrees.to_radians()),
        );
        let waypoints = self.waypoints.into_iter().map(Vec3::from_array).collect();
        SpawnPoint::new(self.name, origin, waypoints)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWave {
    name: Option<String>,
    #[serde(default)]
    simultaneous_sets: bool,
    #[serde(default = "default_pre_next_wave_delay")]
    pre_next_wave_delay_secs: f32,
    #[serde(default)]
    sets: Vec<RawSet>,
}

impl RawWave {
    fn into_wave(self, index: usize) -> Result<WaveDefinition, CampaignError> {
        let pre_next_wave_delay = seconds(
            || format!("waves[{index}].pre_next_wave_delay_secs"),
            self.pre_next_wave_delay_secs,
        )?;
        let sets = self
            .sets
            .into_iter()
            .enumerate()
            .map(|(set_index, set)| set.into_set(index, set_index))
            .collect::<Result<Vec<_>, _>>()?;
        let mode = if self.simultaneous_sets {
            SetMode::Simultaneous
        } else {
            SetMode::Sequential
        };
        let name = self
            .name
            .unwrap_or_else(|| format!("Wave {}", index + 1));
        Ok(WaveDefinition::new(name, sets, mode, pre_next_wave_delay))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSet {
    name: Option<String>,
    #[serde(default = "default_post_set_delay")]
    post_set_delay_secs: f32,
    #[serde(default)]
    groups: Vec<RawGroup>,
}

impl RawSet {
    fn into_set(self, wave: usize, index: usize) -> Result<SpawnSet, CampaignError> {
        let post_set_delay = seconds(
            || format!("waves[{wave}].sets[{index}].post_set_delay_secs"),
            self.post_set_delay_secs,
        )?;
        let groups = self
            .groups
            .into_iter()
            .enumerate()
            .map(|(group, raw)| {
                let delay = seconds(
                    || format!("waves[{wave}].sets[{index}].groups[{group}].inter_spawn_delay_secs"),
                    raw.inter_spawn_delay_secs,
                )?;
                let spawn_point = usize::try_from(raw.spawn_point).unwrap_or_else(|_| {
                    warn!(
                        wave,
                        set = index,
                        group,
                        spawn_point = raw.spawn_point,
                        "spawn point index out of range; group will be skipped"
                    );
                    usize::MAX
                });
                Ok::<_, CampaignError>(SpawnGroup::new(
                    raw.unit.map(UnitTemplateId::new),
                    raw.count,
                    SpawnPointIndex::new(spawn_point),
                    delay,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.unwrap_or_else(|| format!("Set {}", index + 1));
        Ok(SpawnSet::new(name, groups, post_set_delay))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    unit: Option<String>,
    #[serde(default = "default_group_count")]
    count: u32,
    /// Signed so an out-of-range index loads and is skipped at run time.
    #[serde(default)]
    spawn_point: i64,
    #[serde(default = "default_inter_spawn_delay")]
    inter_spawn_delay_secs: f32,
}

fn default_unit_speed() -> f32 {
    DEFAULT_UNIT_SPEED
}

fn default_unit_health() -> f32 {
    DEFAULT_UNIT_HEALTH
}

fn default_group_count() -> u32 {
    DEFAULT_GROUP_COUNT
}

fn default_inter_spawn_delay() -> f32 {
    DEFAULT_INTER_SPAWN_DELAY_SECS
}

fn default_post_set_delay() -> f32 {
    DEFAULT_POST_SET_DELAY_SECS
}

fn default_pre_next_wave_delay() -> f32 {
    DEFAULT_PRE_NEXT_WAVE_DELAY_SECS
}
