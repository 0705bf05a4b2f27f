pub mod autopilot;
pub mod config;
pub mod damage;
pub mod error;
pub mod physics;
pub mod scoring;
pub mod zones;

use serde::{Deserialize, Serialize};

use streetmachine_core::clock::{Clock, SimClock, format_millis};
use streetmachine_core::input::{DebugInput, DriveInput};
use streetmachine_core::tilemap::{AllowedSet, TileCoord, TileMap};

use config::{Pose, RaceConfig};
use damage::{NoRepair, RepairHook};
use error::RaceError;
use physics::Bounds;
use scoring::LapTimes;
use zones::ZoneEvent;

/// Active skin. Highscore freezes driving; the others each hold one timed lap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Highscore,
    Day,
    Night,
    Winter,
}

impl Mode {
    pub fn is_driving(self) -> bool {
        !matches!(self, Self::Highscore)
    }

    /// Skin that follows a completed lap, or `None` after the last one.
    pub fn next_lap_mode(self) -> Option<Self> {
        match self {
            Self::Day => Some(Self::Night),
            Self::Night => Some(Self::Winter),
            Self::Winter | Self::Highscore => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Highscore => "highscore",
            Self::Day => "day",
            Self::Night => "night",
            Self::Winter => "winter",
        };
        f.write_str(name)
    }
}

/// The car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Pixel position.
    pub x: f32,
    pub y: f32,
    /// Degrees, 0 = up, increasing counter-clockwise.
    /// 360 is reachable through the right-turn reset.
    pub heading: i32,
    pub speed: i32,
    pub damage: f32,
    /// Whether the tile under the car was drivable on the last check.
    pub allowed: bool,
    pub wrecked: bool,
}

impl PlayerState {
    /// Stationary, undamaged car at a pixel position facing up.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            heading: 0,
            speed: 0,
            damage: 0.0,
            allowed: true,
            wrecked: false,
        }
    }

    /// Tile under the car, derived from the current position.
    pub fn tile(&self, tile_size: u32) -> TileCoord {
        TileCoord::from_pixels(self.x, self.y, tile_size)
    }
}

/// Lap timer in clock milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceTiming {
    pub start_ms: u64,
    pub end_ms: u64,
    /// True between a start-line crossing and the next finish-line crossing.
    pub running: bool,
}

impl RaceTiming {
    pub fn lap_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Something observable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    RaceStarted { mode: Mode },
    LapStarted { mode: Mode },
    LapFinished { mode: Mode, lap_ms: u64 },
    WrongDirection,
    OffRoad { speed_before: i32, damage: f32 },
    Wrecked,
    RaceFinished { average_ms: u64, laps: LapTimes },
    ReturnedToHighscore,
    QuitRequested,
}

/// Read-only view for renderers and HUDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub mode: Mode,
    pub x: f32,
    pub y: f32,
    pub heading: i32,
    pub speed: i32,
    pub damage: f32,
    pub wrecked: bool,
    pub tile: TileCoord,
    pub allowed: bool,
    pub area_check: bool,
    pub running: bool,
    pub current_lap_ms: u64,
    pub lap_times: LapTimes,
}

/// Per-tick race simulation: driving, line crossings, lap timing and skins.
pub struct RaceStateMachine<C: Clock = SimClock> {
    map: TileMap,
    allowed: AllowedSet,
    bounds: Bounds,
    player: PlayerState,
    timing: RaceTiming,
    lap_times: LapTimes,
    mode: Mode,
    check_allowed_area: bool,
    config: RaceConfig,
    clock: C,
    repair: Box<dyn RepairHook>,
}

impl<C: Clock> RaceStateMachine<C> {
    /// Race on `map` using the config's drivable tile set.
    pub fn new(map: TileMap, clock: C, config: RaceConfig) -> Result<Self, RaceError> {
        let allowed = config.allowed_set();
        Self::with_allowed(map, allowed, clock, config)
    }

    /// Fails when the map is too small for the viewport or a pose or fence lies off it.
    pub fn with_allowed(
        map: TileMap,
        allowed: AllowedSet,
        clock: C,
        config: RaceConfig,
    ) -> Result<Self, RaceError> {
        config.validate_for_map(&map)?;
        let bounds = Bounds::for_map(&map, &config);
        let (x, y) = config.pose_position(&config.start_pose);
        let mut player = PlayerState::at(x, y);
        player.heading = config.start_pose.heading;
        tracing::info!(
            width = map.width(),
            height = map.height(),
            drivable_tiles = allowed.len(),
            debug = config.debug,
            "Race initialised"
        );
        Ok(Self {
            map,
            allowed,
            bounds,
            player,
            timing: RaceTiming::default(),
            lap_times: LapTimes::default(),
            mode: Mode::Highscore,
            check_allowed_area: config.check_allowed_area,
            config,
            clock,
            repair: Box::new(NoRepair),
        })
    }

    /// Replace the hook invoked when the car is wrecked.
    pub fn with_repair_hook(mut self, hook: impl RepairHook + 'static) -> Self {
        self.repair = Box::new(hook);
        self
    }

    /// Advance the simulation by one tick.
    pub fn update(&mut self, input: &DriveInput) -> Vec<RaceEvent> {
        let mut events = Vec::new();

        if input.quit {
            events.push(RaceEvent::QuitRequested);
            return events;
        }

        if !self.mode.is_driving() {
            if input.space {
                self.start_race();
                events.push(RaceEvent::RaceStarted { mode: self.mode });
            }
            return events;
        }

        if input.escape {
            self.return_to_highscore();
            events.push(RaceEvent::ReturnedToHighscore);
            return events;
        }

        physics::apply_drive_input(&mut self.player, input, &self.config);
        let (x, y) = physics::advance(
            self.player.x,
            self.player.y,
            self.player.speed,
            self.player.heading,
            &self.bounds,
            self.config.speed_scale,
        );
        self.player.x = x;
        self.player.y = y;

        let now = self.clock.now_ms();
        let tile = self.player.tile(self.config.tile_size);
        match zones::detect(
            &self.config.zones,
            tile,
            self.player.heading,
            self.timing.running,
        ) {
            Some(ZoneEvent::StartCrossed) => {
                self.timing.running = true;
                self.timing.start_ms = now;
                self.timing.end_ms = now;
                tracing::info!(mode = %self.mode, x = tile.x, y = tile.y, "Lap started");
                events.push(RaceEvent::LapStarted { mode: self.mode });
            },
            Some(ZoneEvent::FinishCrossed) => {
                self.finish_lap(now, &mut events);
                if !self.mode.is_driving() {
                    return events;
                }
            },
            Some(ZoneEvent::WrongDirection) => {
                tracing::debug!(
                    x = tile.x,
                    y = tile.y,
                    heading = self.player.heading,
                    "Wrong direction, resetting car"
                );
                let pose = self.config.recovery_pose;
                self.place(&pose);
                events.push(RaceEvent::WrongDirection);
            },
            None => {},
        }

        if let Some(outcome) = damage::apply_off_road(
            &mut self.player,
            &self.map,
            &self.allowed,
            self.check_allowed_area,
            &self.config,
        ) {
            if outcome.speed_before != 0 {
                tracing::debug!(
                    speed = outcome.speed_before,
                    damage = self.player.damage,
                    "Off-road contact"
                );
                events.push(RaceEvent::OffRoad {
                    speed_before: outcome.speed_before,
                    damage: self.player.damage,
                });
            }
            if outcome.newly_wrecked {
                tracing::info!(mode = %self.mode, "Car wrecked");
                self.repair.on_wrecked(&mut self.player);
                events.push(RaceEvent::Wrecked);
            }
        }

        if self.timing.running {
            self.timing.end_ms = now;
        }

        events
    }

    fn start_race(&mut self) {
        self.mode = Mode::Day;
        self.timing = RaceTiming::default();
        self.lap_times.clear();
        self.reset_to_start();
        tracing::info!(mode = %self.mode, "Race started");
    }

    fn return_to_highscore(&mut self) {
        tracing::info!(mode = %self.mode, "Returning to highscore screen");
        self.mode = Mode::Highscore;
        self.player.speed = 0;
        self.timing.running = false;
    }

    fn finish_lap(&mut self, now: u64, events: &mut Vec<RaceEvent>) {
        self.timing.running = false;
        self.timing.end_ms = now;
        let lap_ms = self.timing.lap_ms();
        let mode = self.mode;
        self.lap_times.record(mode, lap_ms);
        tracing::info!(mode = %mode, lap = %format_millis(lap_ms), "Lap finished");
        events.push(RaceEvent::LapFinished { mode, lap_ms });

        self.reset_to_start();
        match mode.next_lap_mode() {
            Some(next) => self.mode = next,
            None => {
                match self.lap_times.average() {
                    Some(average_ms) => {
                        tracing::info!(average = %format_millis(average_ms), "Race finished");
                        events.push(RaceEvent::RaceFinished {
                            average_ms,
                            laps: self.lap_times,
                        });
                    },
                    None => {
                        tracing::warn!(
                            laps = ?self.lap_times,
                            "Race ended with missing laps, no score"
                        );
                    },
                }
                self.mode = Mode::Highscore;
            },
        }
    }

    /// Back to the start pose with a repaired, stationary car.
    fn reset_to_start(&mut self) {
        let pose = self.config.start_pose;
        self.place(&pose);
        self.player.damage = 0.0;
        self.player.wrecked = false;
    }

    fn place(&mut self, pose: &Pose) {
        let (x, y) = self.config.pose_position(pose);
        self.player.x = x;
        self.player.y = y;
        self.player.heading = pose.heading;
        self.player.speed = 0;
    }

    // ================================================================
    // Debug controls
    // ================================================================

    /// Apply debug keys in input order. Fails unless debugging is enabled.
    pub fn apply_debug(&mut self, input: &DebugInput) -> Result<(), RaceError> {
        if input.is_empty() {
            return Ok(());
        }
        self.ensure_debug()?;
        if input.area_check_on {
            self.check_allowed_area = true;
        }
        if input.area_check_off {
            self.check_allowed_area = false;
        }
        if input.force_night {
            self.mode = Mode::Night;
        }
        if input.force_day {
            self.mode = Mode::Day;
        }
        if input.force_winter {
            self.mode = Mode::Winter;
        }
        if input.reset_damage {
            self.player.damage = 0.0;
            self.player.wrecked = false;
        }
        Ok(())
    }

    pub fn debug_set_area_check(&mut self, enabled: bool) -> Result<(), RaceError> {
        self.ensure_debug()?;
        self.check_allowed_area = enabled;
        tracing::debug!(enabled, "Area check toggled");
        Ok(())
    }

    /// Switch skin without any transition guard.
    pub fn debug_force_mode(&mut self, mode: Mode) -> Result<(), RaceError> {
        self.ensure_debug()?;
        tracing::debug!(from = %self.mode, to = %mode, "Mode forced");
        self.mode = mode;
        Ok(())
    }

    pub fn debug_reset_damage(&mut self) -> Result<(), RaceError> {
        self.ensure_debug()?;
        self.player.damage = 0.0;
        self.player.wrecked = false;
        Ok(())
    }

    fn ensure_debug(&self) -> Result<(), RaceError> {
        if self.config.debug {
            Ok(())
        } else {
            tracing::debug!("Ignored debug control, debugging disabled");
            Err(RaceError::DebugDisabled)
        }
    }

    // ================================================================
    // Accessors
    // ================================================================

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn timing(&self) -> &RaceTiming {
        &self.timing
    }

    pub fn lap_times(&self) -> &LapTimes {
        &self.lap_times
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn allowed(&self) -> &AllowedSet {
        &self.allowed
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn area_check_enabled(&self) -> bool {
        self.check_allowed_area
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable clock access for drivers that step time themselves.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            mode: self.mode,
            x: self.player.x,
            y: self.player.y,
            heading: self.player.heading,
            speed: self.player.speed,
            damage: self.player.damage,
            wrecked: self.player.wrecked,
            tile: self.player.tile(self.config.tile_size),
            allowed: self.player.allowed,
            area_check: self.check_allowed_area,
            running: self.timing.running,
            current_lap_ms: self.timing.lap_ms(),
            lap_times: self.lap_times,
        }
    }
}
