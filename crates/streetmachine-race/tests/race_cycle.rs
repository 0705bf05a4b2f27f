//! End-to-end race runs: the Highscore -> Day -> Night -> Winter -> Highscore
//! cycle with score hand-off, and an autopilot soak on the demo circuit.

use streetmachine_core::clock::{Clock, SimClock};
use streetmachine_core::highscore::{HighscoreSink, HighscoreTable};
use streetmachine_core::input::DriveInput;
use streetmachine_core::test_helpers::open_map;
use streetmachine_core::tilemap::TileCoord;
use streetmachine_core::track::generate_circuit;

use streetmachine_race::autopilot::Autopilot;
use streetmachine_race::config::{Pose, RaceConfig};
use streetmachine_race::zones::{Geofence, HeadingRange, ZoneLayout};
use streetmachine_race::{Mode, RaceEvent, RaceStateMachine};

fn step(race: &mut RaceStateMachine<SimClock>, input: DriveInput) -> Vec<RaceEvent> {
    race.clock_mut().advance();
    race.update(&input)
}

/// Hand any finished race to the sink, the way a game driver does.
fn submit_finished(events: &[RaceEvent], sink: &mut impl HighscoreSink) -> Option<usize> {
    events.iter().find_map(|e| match e {
        RaceEvent::RaceFinished { average_ms, .. } => sink.submit_score("Tester", *average_ms),
        _ => None,
    })
}

/// Start, finish and wrong-direction fences stacked on one tile so each lap
/// can be driven with a handful of keypresses.
fn stacked_fence_config() -> RaceConfig {
    let fence = |headings: Vec<HeadingRange>| Geofence {
        x_min: 20,
        x_max: 20,
        y_min: 20,
        y_max: 20,
        headings,
    };
    RaceConfig {
        start_pose: Pose {
            tile_x: 20,
            tile_y: 21,
            heading: 0,
        },
        recovery_pose: Pose {
            tile_x: 20,
            tile_y: 23,
            heading: 0,
        },
        zones: ZoneLayout {
            start: fence(vec![HeadingRange::new(0, 88), HeadingRange::new(271, 359)]),
            finish: fence(vec![HeadingRange::new(1, 178)]),
            wrong_direction: fence(vec![HeadingRange::new(181, 358)]),
        },
        ..RaceConfig::default()
    }
}

fn timed_lap(race: &mut RaceStateMachine<SimClock>, lap_ms: u64) -> Vec<RaceEvent> {
    let mut events = step(race, DriveInput::accelerate());
    events.extend(step(
        race,
        DriveInput {
            brake: true,
            ..DriveInput::default()
        },
    ));
    race.clock_mut().advance_ms(lap_ms - 2);
    events.extend(step(
        race,
        DriveInput {
            left: true,
            ..DriveInput::default()
        },
    ));
    events
}

#[test]
fn three_laps_submit_their_mean() {
    let mut race =
        RaceStateMachine::new(open_map(40, 40), SimClock::new(1000), stacked_fence_config())
            .unwrap();
    let mut table = HighscoreTable::default();

    assert_eq!(
        step(&mut race, DriveInput::space()),
        vec![RaceEvent::RaceStarted { mode: Mode::Day }]
    );

    let mut all = Vec::new();
    for (mode, lap_ms) in [(Mode::Day, 60_000), (Mode::Night, 90_000), (Mode::Winter, 90_000)] {
        assert_eq!(race.mode(), mode);
        let events = timed_lap(&mut race, lap_ms);
        assert!(events.contains(&RaceEvent::LapStarted { mode }));
        assert!(events.contains(&RaceEvent::LapFinished { mode, lap_ms }));
        all.extend(events);
    }

    assert_eq!(race.mode(), Mode::Highscore);
    assert_eq!(submit_finished(&all, &mut table), Some(0));
    assert_eq!(table.entries()[0].time_ms, 80_000);
    assert_eq!(table.entries()[0].name, "Tester");
}

#[test]
fn second_race_clears_previous_laps() {
    let mut race =
        RaceStateMachine::new(open_map(40, 40), SimClock::new(1000), stacked_fence_config())
            .unwrap();
    step(&mut race, DriveInput::space());
    for lap_ms in [1_000, 2_000, 3_000] {
        timed_lap(&mut race, lap_ms);
    }
    assert_eq!(race.lap_times().average(), Some(2_000));

    step(&mut race, DriveInput::space());
    assert_eq!(race.mode(), Mode::Day);
    assert_eq!(race.lap_times().average(), None);
    assert_eq!(race.lap_times().day, None);
}

#[test]
fn autopilot_completes_race_on_open_map() {
    // Default fences: start on row 97, finish on column 46 rows 100-102
    let mut race =
        RaceStateMachine::new(open_map(128, 128), SimClock::default(), RaceConfig::default())
            .unwrap();
    let mut pilot = Autopilot::new(vec![
        TileCoord::new(44, 90),
        TileCoord::new(50, 90),
        TileCoord::new(50, 101),
        TileCoord::new(40, 101),
    ]);
    let mut table = HighscoreTable::default();
    let mut laps = Vec::new();
    let mut rank = None;

    for _ in 0..100_000 {
        let input = pilot.generate_input(&race.snapshot(), race.config());
        let events = step(&mut race, input);
        for event in &events {
            if let RaceEvent::LapFinished { lap_ms, .. } = event {
                laps.push(*lap_ms);
            }
        }
        assert!(!events.contains(&RaceEvent::WrongDirection));
        if let Some(r) = submit_finished(&events, &mut table) {
            rank = Some(r);
            break;
        }
    }

    assert_eq!(laps.len(), 3, "laps: {laps:?}");
    assert_eq!(rank, Some(0));
    assert_eq!(table.entries()[0].time_ms, laps.iter().sum::<u64>() / 3);
    assert_eq!(race.mode(), Mode::Highscore);
}

#[test]
fn autopilot_soak_on_demo_circuit_keeps_invariants() {
    let map = generate_circuit(7);
    let mut race = RaceStateMachine::new(map, SimClock::default(), RaceConfig::default()).unwrap();
    let mut pilot = Autopilot::for_demo_circuit();
    let bounds = *race.bounds();

    for _ in 0..30_000 {
        let input = pilot.generate_input(&race.snapshot(), race.config());
        step(&mut race, input);

        let player = race.player();
        assert!((0..=360).contains(&player.heading), "heading {}", player.heading);
        assert!((-10..=100).contains(&player.speed), "speed {}", player.speed);
        assert!((0.0..=100.0).contains(&player.damage), "damage {}", player.damage);
        assert!(player.x >= bounds.min_x && player.x <= bounds.max_x);
        assert!(player.y >= bounds.min_y && player.y <= bounds.max_y);
        let tile = player.tile(race.config().tile_size);
        assert!(race.map().contains(tile.x, tile.y));
        if race.timing().running {
            assert_eq!(race.timing().end_ms, race.clock().now_ms());
        }
    }
}
