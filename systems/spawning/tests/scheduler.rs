use std::time::Duration;

use glam::Vec3;
use wave_defence_core::{
    Campaign, Command, CompletionToken, Event, SchedulePhase, SetMode, SkipReason, SpawnError,
    SpawnFailure, SpawnGroup, SpawnPoint, SpawnPointIndex, SpawnRequest, SpawnSet, Transform,
    UnitFactory, UnitId, UnitTemplateId, WaveDefinition, WaveNumber,
};
use wave_defence_system_spawning::{Config, StartOutcome, WaveScheduler};
use wave_defence_world::{self as world, query, UnitTemplate, World};

/// Factory that records every creation and keeps the tokens for the test to settle.
#[derive(Default)]
struct Recorder {
    spawned: Vec<(Duration, UnitTemplateId)>,
    tokens: Vec<CompletionToken>,
    next_id: u32,
    remove_on_spawn: bool,
}

impl Recorder {
    fn spawn_times(&self) -> Vec<Duration> {
        self.spawned.iter().map(|(at, _)| *at).collect()
    }

    fn remove_all(&mut self) {
        for token in self.tokens.drain(..) {
            token.removed();
        }
    }
}

impl UnitFactory for Recorder {
    fn spawn(
        &mut self,
        request: SpawnRequest<'_>,
        token: CompletionToken,
    ) -> Result<UnitId, SpawnFailure> {
        if request.template.as_str() == "ghost" {
            return Err(SpawnFailure::new(
                SpawnError::UnknownTemplate(request.template.clone()),
                token,
            ));
        }
        self.next_id += 1;
        self.spawned.push((request.at, request.template.clone()));
        if self.remove_on_spawn {
            token.removed();
        } else {
            self.tokens.push(token);
        }
        Ok(UnitId::new(self.next_id))
    }
}

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value)
}

fn spawn_points() -> Vec<SpawnPoint> {
    vec![SpawnPoint::new(
        "north gate",
        Transform::at(Vec3::ZERO),
        vec![Vec3::new(0.0, 0.0, 5.0)],
    )]
}

fn group(unit: Option<&str>, count: u32, spawn_point: usize, delay: Duration) -> SpawnGroup {
    SpawnGroup::new(
        unit.map(UnitTemplateId::new),
        count,
        SpawnPointIndex::new(spawn_point),
        delay,
    )
}

fn grunts(count: u32, delay: Duration) -> SpawnGroup {
    group(Some("grunt"), count, 0, delay)
}

fn set(groups: Vec<SpawnGroup>, post_set_delay: Duration) -> SpawnSet {
    SpawnSet::new("set", groups, post_set_delay)
}

fn wave(name: &str, sets: Vec<SpawnSet>, mode: SetMode, pre_next: Duration) -> WaveDefinition {
    WaveDefinition::new(name, sets, mode, pre_next)
}

fn empty_wave(name: &str, pre_next: Duration) -> WaveDefinition {
    wave(name, Vec::new(), SetMode::Sequential, pre_next)
}

fn scheduler(waves: Vec<WaveDefinition>, config: Config) -> WaveScheduler {
    WaveScheduler::new(Campaign::new(spawn_points(), waves), config)
}

fn advance_in_steps(
    scheduler: &mut WaveScheduler,
    factory: &mut Recorder,
    total: Duration,
    step: Duration,
    events: &mut Vec<Event>,
) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        scheduler.advance(step, factory, events);
        elapsed += step;
    }
}

fn started_at(events: &[Event]) -> Vec<(u32, Duration)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::WaveStarted { wave, at, .. } => Some((wave.get(), *at)),
            _ => None,
        })
        .collect()
}

fn cleared_at(events: &[Event]) -> Vec<(u32, Duration)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::WaveCleared { wave, at, .. } => Some((wave.get(), *at)),
            _ => None,
        })
        .collect()
}

#[test]
fn units_spawn_on_schedule_and_next_wave_waits_for_clearance() {
    let mut scheduler = scheduler(
        vec![
            wave(
                "opening",
                vec![set(vec![grunts(3, secs(1.0))], Duration::ZERO)],
                SetMode::Sequential,
                secs(5.0),
            ),
            wave(
                "second",
                vec![set(vec![grunts(1, Duration::ZERO)], Duration::ZERO)],
                SetMode::Sequential,
                secs(5.0),
            ),
        ],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    advance_in_steps(&mut scheduler, &mut factory, secs(3.75), secs(0.25), &mut events);

    assert_eq!(
        factory.spawn_times(),
        vec![secs(0.0), secs(1.0), secs(2.0)]
    );
    assert_eq!(scheduler.phase(), SchedulePhase::WaitingForClearance);
    assert_eq!(scheduler.units_alive(), 3);

    factory.remove_all();
    advance_in_steps(&mut scheduler, &mut factory, secs(5.25), secs(0.25), &mut events);

    assert_eq!(cleared_at(&events), vec![(1, secs(4.0))]);
    assert_eq!(started_at(&events), vec![(1, secs(0.0)), (2, secs(9.0))]);
    assert_eq!(
        factory.spawn_times(),
        vec![secs(0.0), secs(1.0), secs(2.0), secs(9.0)]
    );
}

#[test]
fn post_set_delay_precedes_clearance_when_units_die_at_spawn() {
    let mut scheduler = scheduler(
        vec![
            wave(
                "opening",
                vec![set(vec![grunts(3, secs(1.0))], secs(2.0))],
                SetMode::Sequential,
                secs(5.0),
            ),
            empty_wave("second", secs(5.0)),
        ],
        Config::new(),
    );
    let mut factory = Recorder {
        remove_on_spawn: true,
        ..Recorder::default()
    };
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    advance_in_steps(&mut scheduler, &mut factory, secs(10.0), secs(0.5), &mut events);

    assert_eq!(
        factory.spawn_times(),
        vec![secs(0.0), secs(1.0), secs(2.0)]
    );
    assert!(events.contains(&Event::SetSpawningFinished {
        wave: WaveNumber::new(1),
        set: 0,
        at: secs(2.0),
    }));
    assert!(events.contains(&Event::WaitingForClearance {
        wave: WaveNumber::new(1),
        at: secs(4.0),
    }));
    assert_eq!(cleared_at(&events)[0], (1, secs(4.0)));
    assert_eq!(started_at(&events), vec![(1, secs(0.0)), (2, secs(9.0))]);

    let attempts: u32 = events
        .iter()
        .map(|event| match event {
            Event::UnitSpawned { wave, .. } if wave.get() == 1 => 1,
            Event::SpawnSkipped { wave, units, .. } if wave.get() == 1 => *units,
            _ => 0,
        })
        .sum();
    assert_eq!(attempts, 3);
}

#[test]
fn unregistered_spawn_point_skips_group_without_blocking_clearance() {
    let mut scheduler = scheduler(
        vec![wave(
            "broken",
            vec![set(
                vec![group(Some("grunt"), 3, 5, Duration::ZERO), grunts(2, Duration::ZERO)],
                Duration::ZERO,
            )],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new().with_auto_progress(false),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    assert!(events.contains(&Event::SpawnSkipped {
        wave: WaveNumber::new(1),
        set: 0,
        group: 0,
        units: 3,
        reason: SkipReason::UnknownSpawnPoint {
            index: SpawnPointIndex::new(5),
        },
        at: Duration::ZERO,
    }));
    assert_eq!(factory.spawned.len(), 2);
    assert_eq!(scheduler.units_alive(), 2);

    factory.remove_all();
    scheduler.advance(secs(0.5), &mut factory, &mut events);

    assert_eq!(cleared_at(&events), vec![(1, secs(0.5))]);
    let tally = scheduler.liveness().expect("wave started");
    assert_eq!(tally.expected, 5);
    assert_eq!(tally.cancelled, 3);
    assert_eq!(tally.removed, 2);
    assert_eq!(tally.alive, 0);
    assert_eq!(scheduler.phase(), SchedulePhase::Idle);
}

#[test]
fn sequential_sets_wait_for_previous_set_and_post_set_delay() {
    let mut scheduler = scheduler(
        vec![wave(
            "staggered",
            vec![
                set(vec![grunts(2, secs(1.0))], secs(3.0)),
                set(vec![grunts(1, Duration::ZERO)], Duration::ZERO),
            ],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    advance_in_steps(&mut scheduler, &mut factory, secs(3.5), secs(0.5), &mut events);

    assert!(scheduler.is_spawning());
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::WaitingForClearance { .. })));

    advance_in_steps(&mut scheduler, &mut factory, secs(0.5), secs(0.5), &mut events);

    assert_eq!(
        factory.spawn_times(),
        vec![secs(0.0), secs(1.0), secs(4.0)]
    );
    assert!(events.contains(&Event::SetSpawningFinished {
        wave: WaveNumber::new(1),
        set: 0,
        at: secs(1.0),
    }));
    assert!(events.contains(&Event::WaitingForClearance {
        wave: WaveNumber::new(1),
        at: secs(4.0),
    }));
    assert!(!scheduler.is_spawning());
}

#[test]
fn simultaneous_sets_start_together() {
    let mut scheduler = scheduler(
        vec![wave(
            "swarm",
            vec![
                set(vec![grunts(1, Duration::ZERO)], secs(10.0)),
                set(vec![grunts(1, Duration::ZERO)], secs(10.0)),
            ],
            SetMode::Simultaneous,
            secs(5.0),
        )],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    assert_eq!(factory.spawn_times(), vec![Duration::ZERO, Duration::ZERO]);
    assert_eq!(scheduler.units_alive(), 2);
    assert_eq!(scheduler.phase(), SchedulePhase::WaitingForClearance);

    factory.remove_all();
    scheduler.advance(secs(0.5), &mut factory, &mut events);
    assert_eq!(cleared_at(&events), vec![(1, secs(0.5))]);
}

#[test]
fn wave_without_units_clears_immediately() {
    let mut scheduler = scheduler(
        vec![empty_wave("lull", secs(1.0)), empty_wave("calm", secs(1.0))],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    assert_eq!(cleared_at(&events), vec![(1, Duration::ZERO)]);

    scheduler.advance(secs(1.0), &mut factory, &mut events);
    assert_eq!(
        started_at(&events),
        vec![(1, Duration::ZERO), (2, secs(1.0))]
    );
}

#[test]
fn looping_campaign_restarts_from_first_wave() {
    let mut scheduler = scheduler(
        vec![wave(
            "only",
            vec![set(vec![grunts(1, Duration::ZERO)], Duration::ZERO)],
            SetMode::Sequential,
            Duration::ZERO,
        )],
        Config::new().with_loop_waves(true),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    factory.remove_all();
    scheduler.advance(secs(0.5), &mut factory, &mut events);

    assert!(events.contains(&Event::CampaignRestarted { at: secs(0.5) }));
    assert_eq!(started_at(&events), vec![(1, Duration::ZERO), (1, secs(0.5))]);
    assert_eq!(scheduler.current_wave_number(), 1);
    assert_eq!(factory.spawn_times(), vec![Duration::ZERO, secs(0.5)]);
    assert_eq!(scheduler.units_alive(), 1);
}

#[test]
fn finished_campaign_ignores_further_start_requests() {
    let mut scheduler = scheduler(vec![empty_wave("only", Duration::ZERO)], Config::new());
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    assert_eq!(scheduler.phase(), SchedulePhase::Finished);
    assert!(events.contains(&Event::CampaignFinished {
        waves: 1,
        at: Duration::ZERO,
    }));
    assert_eq!(scheduler.pending_timers(), 0);

    let mut later = Vec::new();
    assert_eq!(scheduler.start_next_wave(&mut later), StartOutcome::Finished);
    assert!(later.is_empty());
    assert_eq!(scheduler.current_wave_number(), 1);
    assert_eq!(scheduler.current_wave_name(), Some("only"));
}

#[test]
fn campaign_without_waves_finishes_on_start() {
    let mut scheduler = scheduler(Vec::new(), Config::new());
    let mut events = Vec::new();

    scheduler.start(&mut events);

    assert_eq!(
        events,
        vec![Event::CampaignFinished {
            waves: 0,
            at: Duration::ZERO,
        }]
    );
    assert_eq!(scheduler.current_wave_number(), 0);
    assert_eq!(scheduler.current_wave_name(), None);
}

#[test]
fn start_request_is_ignored_while_wave_is_active() {
    let mut scheduler = scheduler(
        vec![
            wave(
                "first",
                vec![set(vec![grunts(2, secs(1.0))], Duration::ZERO)],
                SetMode::Sequential,
                secs(5.0),
            ),
            empty_wave("second", secs(5.0)),
        ],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    let mut ignored = Vec::new();
    assert_eq!(
        scheduler.start_next_wave(&mut ignored),
        StartOutcome::AlreadyActive
    );
    assert!(ignored.is_empty());

    scheduler.advance(secs(1.0), &mut factory, &mut events);
    assert_eq!(scheduler.phase(), SchedulePhase::WaitingForClearance);
    assert_eq!(
        scheduler.start_next_wave(&mut ignored),
        StartOutcome::AlreadyActive
    );
    assert!(ignored.is_empty());
    assert_eq!(scheduler.current_wave_number(), 1);
}

#[test]
fn missing_templates_and_rejected_spawns_count_as_skipped() {
    let mut scheduler = scheduler(
        vec![wave(
            "misconfigured",
            vec![set(
                vec![
                    group(None, 2, 0, Duration::ZERO),
                    group(Some("ghost"), 1, 0, Duration::ZERO),
                ],
                Duration::ZERO,
            )],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);

    let reasons: Vec<&SkipReason> = events
        .iter()
        .filter_map(|event| match event {
            Event::SpawnSkipped { reason, units, .. } => {
                assert_eq!(*units, 1);
                Some(reason)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            &SkipReason::MissingTemplate,
            &SkipReason::FactoryRejected(SpawnError::UnknownTemplate(UnitTemplateId::new(
                "ghost"
            ))),
            &SkipReason::MissingTemplate,
        ]
    );
    assert!(factory.spawned.is_empty());
    assert_eq!(cleared_at(&events), vec![(1, Duration::ZERO)]);
    let tally = scheduler.liveness().expect("wave started");
    assert_eq!(tally.cancelled, 3);
    assert_eq!(tally.abandoned, 0);
}

#[test]
fn stalled_wave_is_reported_once() {
    let mut scheduler = scheduler(
        vec![wave(
            "stubborn",
            vec![set(vec![grunts(1, Duration::ZERO)], Duration::ZERO)],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new().with_stall_timeout(Some(secs(2.0))),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    advance_in_steps(&mut scheduler, &mut factory, secs(5.0), secs(0.5), &mut events);

    assert_eq!(
        stalls(&events),
        vec![&Event::WaveStalled {
            wave: WaveNumber::new(1),
            alive: 1,
            idle: secs(2.0),
        }]
    );
    assert_eq!(scheduler.phase(), SchedulePhase::WaitingForClearance);
}

fn stalls(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|event| matches!(event, Event::WaveStalled { .. }))
        .collect()
}

#[test]
fn slow_spawning_is_not_mistaken_for_a_stall() {
    let mut scheduler = scheduler(
        vec![wave(
            "trickle",
            vec![set(vec![grunts(2, secs(40.0))], Duration::ZERO)],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new().with_stall_timeout(Some(secs(30.0))),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    advance_in_steps(&mut scheduler, &mut factory, secs(69.5), secs(0.5), &mut events);

    assert_eq!(factory.spawn_times(), vec![secs(0.0), secs(40.0)]);
    assert!(stalls(&events).is_empty());

    scheduler.advance(secs(0.5), &mut factory, &mut events);
    assert_eq!(
        stalls(&events),
        vec![&Event::WaveStalled {
            wave: WaveNumber::new(1),
            alive: 2,
            idle: secs(30.0),
        }]
    );
}

#[test]
fn simultaneous_sets_still_spawning_are_not_stalled() {
    let mut scheduler = scheduler(
        vec![wave(
            "pincer",
            vec![
                set(vec![grunts(2, secs(40.0))], Duration::ZERO),
                set(vec![grunts(1, Duration::ZERO)], Duration::ZERO),
            ],
            SetMode::Simultaneous,
            secs(5.0),
        )],
        Config::new().with_stall_timeout(Some(secs(30.0))),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    assert_eq!(scheduler.phase(), SchedulePhase::WaitingForClearance);
    advance_in_steps(&mut scheduler, &mut factory, secs(69.5), secs(0.5), &mut events);

    assert_eq!(
        factory.spawn_times(),
        vec![secs(0.0), secs(0.0), secs(40.0)]
    );
    assert!(stalls(&events).is_empty());

    scheduler.advance(secs(0.5), &mut factory, &mut events);
    assert_eq!(
        stalls(&events),
        vec![&Event::WaveStalled {
            wave: WaveNumber::new(1),
            alive: 3,
            idle: secs(30.0),
        }]
    );
}

#[test]
fn looping_waves_that_clear_at_once_advance_one_start_per_call() {
    let mut scheduler = scheduler(
        vec![empty_wave("lull", Duration::ZERO)],
        Config::new().with_loop_waves(true),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();
    let frame = Duration::from_millis(16);

    scheduler.start(&mut events);
    for _ in 0..3 {
        scheduler.advance(frame, &mut factory, &mut events);
    }

    assert_eq!(
        started_at(&events),
        vec![
            (1, Duration::ZERO),
            (1, Duration::ZERO),
            (1, frame),
            (1, frame * 2),
        ]
    );
    let restarts = events
        .iter()
        .filter(|event| matches!(event, Event::CampaignRestarted { .. }))
        .count();
    assert_eq!(restarts, 3);
    assert_eq!(scheduler.pending_timers(), 1);

    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    assert_eq!(started_at(&events).len(), 5);
}

#[test]
fn manual_start_supersedes_pending_inter_wave_delay() {
    let mut scheduler = scheduler(
        vec![
            empty_wave("first", secs(5.0)),
            empty_wave("second", secs(5.0)),
            empty_wave("third", secs(5.0)),
        ],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(secs(1.0), &mut factory, &mut events);

    assert_eq!(
        scheduler.start_next_wave(&mut events),
        StartOutcome::Started {
            wave: WaveNumber::new(2),
            restarted: false,
        }
    );
    advance_in_steps(&mut scheduler, &mut factory, secs(6.0), secs(1.0), &mut events);

    assert_eq!(
        started_at(&events),
        vec![(1, Duration::ZERO), (2, secs(1.0)), (3, secs(6.0))]
    );
}

#[test]
fn start_next_wave_command_is_handled() {
    let mut scheduler = scheduler(
        vec![empty_wave("first", secs(5.0)), empty_wave("second", secs(5.0))],
        Config::new().with_auto_start(false).with_auto_progress(false),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    assert!(events.is_empty());
    assert_eq!(scheduler.progress().wave_number, 0);

    scheduler.handle(
        &[Event::TimeAdvanced { dt: secs(1.0) }],
        &[Command::StartNextWave],
        &mut factory,
        &mut events,
    );
    assert_eq!(started_at(&events), vec![(1, Duration::ZERO)]);
    assert_eq!(cleared_at(&events), vec![(1, Duration::ZERO)]);

    scheduler.handle(
        &[Event::TimeAdvanced { dt: secs(10.0) }],
        &[],
        &mut factory,
        &mut events,
    );
    let progress = scheduler.progress();
    assert_eq!(progress.wave_number, 1);
    assert_eq!(progress.total_waves, 2);
    assert_eq!(progress.phase, SchedulePhase::Idle);
    assert_eq!(progress.wave_name.as_deref(), Some("first"));
    assert_eq!(scheduler.now(), secs(11.0));
}

#[test]
fn dropped_tokens_still_release_the_wave() {
    let mut scheduler = scheduler(
        vec![wave(
            "vanishing",
            vec![set(vec![grunts(2, Duration::ZERO)], Duration::ZERO)],
            SetMode::Sequential,
            secs(5.0),
        )],
        Config::new(),
    );
    let mut factory = Recorder::default();
    let mut events = Vec::new();

    scheduler.start(&mut events);
    scheduler.advance(Duration::ZERO, &mut factory, &mut events);
    factory.tokens.clear();
    scheduler.advance(secs(0.5), &mut factory, &mut events);

    let tally = scheduler.liveness().expect("wave started");
    assert_eq!(tally.abandoned, 2);
    assert_eq!(cleared_at(&events), vec![(1, secs(0.5))]);
}

fn demo_campaign() -> Campaign {
    Campaign::new(
        vec![
            SpawnPoint::new(
                "north gate",
                Transform::at(Vec3::ZERO),
                vec![Vec3::new(0.0, 0.0, 4.0), Vec3::new(4.0, 0.0, 4.0)],
            ),
            SpawnPoint::new(
                "east gate",
                Transform::at(Vec3::new(8.0, 0.0, 0.0)),
                vec![Vec3::new(8.0, 0.0, 6.0)],
            ),
        ],
        vec![
            wave(
                "scouts",
                vec![
                    set(vec![grunts(3, secs(0.5))], secs(1.0)),
                    set(
                        vec![group(Some("brute"), 1, 1, Duration::ZERO)],
                        Duration::ZERO,
                    ),
                ],
                SetMode::Sequential,
                secs(2.0),
            ),
            wave(
                "rush",
                vec![
                    set(vec![grunts(2, secs(0.25))], Duration::ZERO),
                    set(
                        vec![group(Some("brute"), 2, 1, secs(1.0))],
                        Duration::ZERO,
                    ),
                ],
                SetMode::Simultaneous,
                secs(2.0),
            ),
        ],
    )
}

fn demo_world() -> World {
    World::new(
        [
            (UnitTemplateId::new("grunt"), UnitTemplate::new(4.0, 10.0)),
            (UnitTemplateId::new("brute"), UnitTemplate::new(2.0, 25.0)),
        ],
        200,
    )
}

fn run_with_world(duration: Duration, tick: Duration) -> (Vec<Event>, World, WaveScheduler) {
    let mut world = demo_world();
    let mut scheduler = WaveScheduler::new(demo_campaign(), Config::new());
    let mut log = Vec::new();
    scheduler.start(&mut log);

    let mut elapsed = Duration::ZERO;
    while elapsed < duration {
        let mut world_events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: tick }, &mut world_events);

        let mut scheduler_events = Vec::new();
        scheduler.handle(&world_events, &[], &mut world, &mut scheduler_events);

        log.extend(world_events);
        log.extend(scheduler_events);
        elapsed += tick;
    }

    (log, world, scheduler)
}

#[test]
fn world_drives_campaign_to_completion() {
    let (events, world, scheduler) = run_with_world(secs(30.0), Duration::from_millis(50));

    assert_eq!(scheduler.phase(), SchedulePhase::Finished);
    assert_eq!(query::unit_count(&world), 0);

    let reached_end = events
        .iter()
        .filter(|event| matches!(event, Event::UnitReachedEnd { .. }))
        .count();
    assert_eq!(reached_end, 8);
    assert_eq!(query::lives(&world), 200 - 5 * 10 - 3 * 25);
    assert_eq!(
        cleared_at(&events)
            .into_iter()
            .map(|(wave, _)| wave)
            .collect::<Vec<_>>(),
        vec![1, 2]
    );

    let tally = scheduler.liveness().expect("wave started");
    assert_eq!(tally.expected, 4);
    assert_eq!(tally.reached_end, 4);
    assert_eq!(tally.alive, 0);
}

#[test]
fn replaying_the_same_run_is_deterministic() {
    let (first, _, _) = run_with_world(secs(12.0), Duration::from_millis(16));
    let (second, _, _) = run_with_world(secs(12.0), Duration::from_millis(16));

    assert_eq!(first, second);
}
