#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Wave Defence campaign headlessly.

mod attrition;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wave_defence_core::{Command, Event, SchedulePhase};
use wave_defence_system_spawning::WaveScheduler;
use wave_defence_world::{self as world, query};

use attrition::Attrition;

#[derive(Parser, Debug)]
#[command(name = "wave-defence")]
#[command(about = "Plays a wave defence campaign against a headless world")]
struct Args {
    /// Campaign file to play
    #[arg(long, default_value_os_t = wave_defence_campaign::default_campaign_path())]
    campaign: PathBuf,

    /// Simulated seconds to run before giving up
    #[arg(long, default_value_t = 300.0)]
    duration_secs: f64,

    /// Length of a simulation tick in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Seed for the attrition random number generator
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Probability per second that a walking unit is defeated
    #[arg(long, default_value_t = 0.25)]
    defeat_chance: f64,

    /// Restart from the first wave after the last one clears
    #[arg(long)]
    loop_waves: bool,

    /// Wait instead of starting the next wave once one clears
    #[arg(long)]
    no_auto_progress: bool,

    /// Tracing filter directive; overrides RUST_LOG
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Debug, Default)]
struct Summary {
    spawned: u32,
    skipped: u32,
    defeated: u32,
    reached_end: u32,
    lives_lost: u32,
    waves_cleared: u32,
    lives_depleted: bool,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::UnitSpawned { .. } => self.spawned += 1,
                Event::SpawnSkipped { units, .. } => self.skipped += units,
                Event::UnitDefeated { .. } => self.defeated += 1,
                Event::UnitReachedEnd { lives_lost, .. } => {
                    self.reached_end += 1;
                    self.lives_lost = self.lives_lost.saturating_add(*lives_lost);
                }
                Event::WaveCleared { .. } => self.waves_cleared += 1,
                Event::LivesDepleted => self.lives_depleted = true,
                _ => {}
            }
        }
    }
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Entry point for the Wave Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    ensure!(args.tick_ms > 0, "--tick-ms must be positive");
    ensure!(
        (0.0..=1.0).contains(&args.defeat_chance),
        "--defeat-chance must lie between 0 and 1 (got {})",
        args.defeat_chance
    );
    let duration = Duration::try_from_secs_f64(args.duration_secs)
        .with_context(|| format!("invalid --duration-secs {}", args.duration_secs))?;
    let tick = Duration::from_millis(args.tick_ms);

    let loaded = wave_defence_campaign::load(&args.campaign).with_context(|| {
        format!(
            "failed to load campaign from {}",
            args.campaign.display()
        )
    })?;

    let mut config = loaded.scheduler;
    if args.loop_waves {
        config = config.with_loop_waves(true);
    }
    if args.no_auto_progress {
        config = config.with_auto_progress(false);
    }

    let mut world = loaded.world();
    let mut scheduler = WaveScheduler::new(loaded.campaign, config);
    let mut attrition = Attrition::new(args.seed, args.defeat_chance);
    let mut summary = Summary::default();

    let mut events = Vec::new();
    scheduler.start(&mut events);
    summary.record(&events);

    let mut elapsed = Duration::ZERO;
    while elapsed < duration && scheduler.phase() != SchedulePhase::Finished {
        let mut world_events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: tick }, &mut world_events);

        let walking = query::unit_view(&world).iter().map(|unit| unit.id).collect::<Vec<_>>();
        for unit in attrition.select(walking, tick) {
            world::apply(&mut world, Command::DefeatUnit { unit }, &mut world_events);
        }

        let mut scheduler_events = Vec::new();
        scheduler.handle(&world_events, &[], &mut world, &mut scheduler_events);

        summary.record(&world_events);
        summary.record(&scheduler_events);
        elapsed += tick;

        if summary.lives_depleted {
            warn!(elapsed = ?elapsed, "game over");
            break;
        }
    }

    let progress = scheduler.progress();
    info!(elapsed = ?elapsed, phase = ?progress.phase, "simulation stopped");
    println!(
        "wave {}/{} ({}) phase {:?}",
        progress.wave_number,
        progress.total_waves,
        progress.wave_name.as_deref().unwrap_or("-"),
        progress.phase
    );
    println!(
        "waves cleared {} | spawned {} | skipped {} | defeated {} | leaked {} | lives {} (-{})",
        summary.waves_cleared,
        summary.spawned,
        summary.skipped,
        summary.defeated,
        summary.reached_end,
        query::lives(&world),
        summary.lives_lost
    );
    Ok(())
}
