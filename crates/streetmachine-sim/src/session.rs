use std::time::{Duration, Instant};

use serde::Serialize;

use streetmachine_core::clock::{Clock, format_millis};
use streetmachine_core::highscore::HighscoreSink;
use streetmachine_race::autopilot::Autopilot;
use streetmachine_race::{Mode, RaceEvent, RaceSnapshot, RaceStateMachine};

/// Limits for one headless run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Hard tick limit.
    pub max_ticks: u64,
    /// Stop after this many completed races (0 = only the tick limit applies).
    pub races: u32,
    /// Name submitted with each finished race.
    pub name: String,
    /// Ticks between debug-level state traces (0 disables them).
    pub trace_every: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LapRecord {
    pub mode: Mode,
    pub lap_ms: u64,
    pub lap: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceRecord {
    pub average_ms: u64,
    pub average: String,
    /// Position in the high-score table, if the score made it.
    pub rank: Option<usize>,
}

/// JSON summary printed when the runner exits.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub laps: Vec<LapRecord>,
    pub races: Vec<RaceRecord>,
    pub off_road_contacts: u32,
    pub wrong_direction_resets: u32,
    pub wrecks: u32,
    pub quit: bool,
    pub final_state: RaceSnapshot,
}

/// Drive the race with the autopilot until a stop condition is met.
///
/// `tick` runs before every update and moves (or waits for) the clock.
pub fn run<C: Clock>(
    race: &mut RaceStateMachine<C>,
    pilot: &mut Autopilot,
    sink: &mut impl HighscoreSink,
    options: &SessionOptions,
    mut tick: impl FnMut(&mut C),
) -> SessionSummary {
    let mut ticks = 0;
    let mut laps = Vec::new();
    let mut races = Vec::new();
    let mut off_road_contacts = 0;
    let mut wrong_direction_resets = 0;
    let mut wrecks = 0;
    let mut quit = false;

    while ticks < options.max_ticks && !quit {
        tick(race.clock_mut());
        let input = pilot.generate_input(&race.snapshot(), race.config());
        let events = race.update(&input);
        ticks += 1;

        for event in events {
            match event {
                RaceEvent::LapFinished { mode, lap_ms } => laps.push(LapRecord {
                    mode,
                    lap_ms,
                    lap: format_millis(lap_ms),
                }),
                RaceEvent::RaceFinished { average_ms, .. } => {
                    let rank = sink.submit_score(&options.name, average_ms);
                    tracing::info!(
                        name = %options.name,
                        average = %format_millis(average_ms),
                        rank = ?rank,
                        "Score submitted"
                    );
                    races.push(RaceRecord {
                        average_ms,
                        average: format_millis(average_ms),
                        rank,
                    });
                },
                RaceEvent::OffRoad { .. } => off_road_contacts += 1,
                RaceEvent::WrongDirection => wrong_direction_resets += 1,
                RaceEvent::Wrecked => wrecks += 1,
                RaceEvent::QuitRequested => quit = true,
                RaceEvent::RaceStarted { .. }
                | RaceEvent::LapStarted { .. }
                | RaceEvent::ReturnedToHighscore => {},
            }
        }

        if options.trace_every > 0 && ticks % options.trace_every == 0 {
            let snap = race.snapshot();
            tracing::debug!(
                tick = ticks,
                mode = %snap.mode,
                x = snap.tile.x,
                y = snap.tile.y,
                heading = snap.heading,
                speed = snap.speed,
                damage = snap.damage,
                "Race state"
            );
        }

        if options.races > 0 && races.len() >= options.races as usize {
            break;
        }
    }

    if ticks >= options.max_ticks {
        tracing::warn!(ticks, races = races.len(), "Tick limit reached");
    }

    SessionSummary {
        ticks,
        laps,
        races,
        off_road_contacts,
        wrong_direction_resets,
        wrecks,
        quit,
        final_state: race.snapshot(),
    }
}

/// Sleeps so that ticks line up with wall time at a fixed rate.
pub struct Pacer {
    period: Duration,
    next: Instant,
}

impl Pacer {
    pub fn new(tick_rate: u32) -> Self {
        let period = Duration::from_secs(1) / tick_rate.max(1);
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Block until the next tick is due. Missed deadlines are skipped, not replayed.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetmachine_core::clock::SimClock;
    use streetmachine_core::highscore::HighscoreTable;
    use streetmachine_core::test_helpers::open_map;
    use streetmachine_core::tilemap::TileCoord;
    use streetmachine_race::config::RaceConfig;

    fn options(max_ticks: u64) -> SessionOptions {
        SessionOptions {
            max_ticks,
            races: 1,
            name: "Bot".to_string(),
            trace_every: 0,
        }
    }

    fn square_pilot() -> Autopilot {
        Autopilot::new(vec![
            TileCoord::new(44, 90),
            TileCoord::new(50, 90),
            TileCoord::new(50, 101),
            TileCoord::new(40, 101),
        ])
    }

    #[test]
    fn tick_limit_stops_run() {
        let mut race = RaceStateMachine::new(
            open_map(128, 128),
            SimClock::default(),
            RaceConfig::default(),
        )
        .unwrap();
        let mut table = HighscoreTable::default();
        let summary = run(
            &mut race,
            &mut square_pilot(),
            &mut table,
            &options(10),
            SimClock::advance,
        );
        assert_eq!(summary.ticks, 10);
        assert!(summary.races.is_empty());
        assert!(!summary.quit);
        assert_eq!(race.clock().ticks(), 10);
    }

    #[test]
    fn finished_race_is_submitted() {
        let mut race = RaceStateMachine::new(
            open_map(128, 128),
            SimClock::default(),
            RaceConfig::default(),
        )
        .unwrap();
        let mut table = HighscoreTable::default();
        let summary = run(
            &mut race,
            &mut square_pilot(),
            &mut table,
            &options(100_000),
            SimClock::advance,
        );
        assert_eq!(summary.laps.len(), 3);
        assert_eq!(summary.races.len(), 1);
        assert_eq!(summary.races[0].rank, Some(0));
        assert_eq!(table.entries()[0].name, "Bot");
        assert_eq!(table.entries()[0].time_ms, summary.races[0].average_ms);
        assert_eq!(summary.final_state.mode, Mode::Highscore);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["races"][0]["rank"], 0);
        assert_eq!(json["laps"][0]["mode"], "day");
    }

    #[test]
    fn pacer_period_from_rate() {
        let pacer = Pacer::new(50);
        assert_eq!(pacer.period, Duration::from_millis(20));
        assert_eq!(Pacer::new(0).period, Duration::from_secs(1));
    }
}
