use std::path::Path;

use serde::{Deserialize, Serialize};

use streetmachine_core::tilemap::{AllowedSet, TileId, TileMap};

use crate::error::RaceError;
use crate::zones::ZoneLayout;

/// How much one tick of braking removes from the speed.
///
/// Two game-loop variants exist: the minimal one brakes by 10, the extended one by 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrakeDecrement {
    Five,
    Ten,
}

impl BrakeDecrement {
    pub fn amount(self) -> i32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
        }
    }
}

/// Tile position and heading used for spawns and resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pose {
    pub tile_x: i32,
    pub tile_y: i32,
    pub heading: i32,
}

/// Data-driven configuration for the race simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Visible tiles horizontally; half of it keeps the camera inside the map.
    pub viewport_tiles_x: u32,
    /// Visible tiles vertically.
    pub viewport_tiles_y: u32,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Speed is divided by this to get pixels moved per tick.
    pub speed_scale: f32,
    /// Top speed.
    pub max_speed: i32,
    /// Top speed once damage exceeds `damaged_speed_threshold`.
    pub damaged_max_speed: i32,
    pub damaged_speed_threshold: f32,
    /// Speed gained per tick of throttle.
    pub accel_step: i32,
    pub brake_decrement: BrakeDecrement,
    /// Speed lost per tick of reverse.
    pub reverse_step: i32,
    /// Lowest (most negative) reverse speed.
    pub reverse_floor: i32,
    /// Base degrees turned per tick; speed / 10 is added on top.
    pub base_turn: i32,
    /// Off-road contact above this speed causes damage.
    pub crash_speed: i32,
    /// Damage per unit of speed at the moment of the crash.
    pub damage_factor: f32,
    pub max_damage: f32,
    /// Whether leaving drivable tiles stops the car.
    pub check_allowed_area: bool,
    /// Enables the debug entry points.
    pub debug: bool,
    pub start_pose: Pose,
    /// Pose used after driving through the finish line backwards.
    pub recovery_pose: Pose,
    pub zones: ZoneLayout,
    /// Overrides the built-in drivable tile list.
    pub allowed_tiles: Option<Vec<TileId>>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            tile_size: 16,
            viewport_tiles_x: 16,
            viewport_tiles_y: 12,
            tick_rate: 60,
            speed_scale: 10.0,
            max_speed: 100,
            damaged_max_speed: 30,
            damaged_speed_threshold: 75.0,
            accel_step: 2,
            brake_decrement: BrakeDecrement::Ten,
            reverse_step: 1,
            reverse_floor: -10,
            base_turn: 4,
            crash_speed: 20,
            damage_factor: 1.5,
            max_damage: 100.0,
            check_allowed_area: true,
            debug: false,
            start_pose: Pose {
                tile_x: 44,
                tile_y: 99,
                heading: 0,
            },
            recovery_pose: Pose {
                tile_x: 44,
                tile_y: 101,
                heading: 0,
            },
            zones: ZoneLayout::default(),
            allowed_tiles: None,
        }
    }
}

impl RaceConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("STREETMACHINE_RACE_CONFIG")
            && let Ok(config) = Self::from_toml_file(&path)
        {
            return config;
        }
        if let Ok(config) = Self::from_toml_file("config/race.toml") {
            return config;
        }
        Self::default()
    }

    /// Parse and validate a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RaceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| RaceError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = toml::from_str::<Self>(&contents).map_err(|e| RaceError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded race configuration");
        Ok(config)
    }

    /// Reject values that would break the simulation invariants.
    pub fn validate(&self) -> Result<(), RaceError> {
        let invalid = |message: &str| -> Result<(), RaceError> {
            Err(RaceError::Config {
                path: "<config>".to_string(),
                message: message.to_string(),
            })
        };
        if self.tile_size == 0 {
            return invalid("tile_size must be > 0");
        }
        if self.tick_rate == 0 {
            return invalid("tick_rate must be > 0");
        }
        if self.speed_scale <= 0.0 {
            return invalid("speed_scale must be > 0");
        }
        if self.max_speed <= 0 || self.damaged_max_speed <= 0 {
            return invalid("max_speed and damaged_max_speed must be > 0");
        }
        if self.reverse_floor > 0 {
            return invalid("reverse_floor must be <= 0");
        }
        if self.max_damage <= 0.0 {
            return invalid("max_damage must be > 0");
        }
        Ok(())
    }

    /// Check that `map` can host a race with this config: it must be larger
    /// than the viewport on both axes, and every pose and fence must lie on it.
    pub fn validate_for_map(&self, map: &TileMap) -> Result<(), RaceError> {
        let min_width = self.viewport_tiles_x + 1;
        let min_height = self.viewport_tiles_y + 1;
        if map.width() < min_width || map.height() < min_height {
            return Err(RaceError::MapTooSmall {
                width: map.width(),
                height: map.height(),
                min_width,
                min_height,
            });
        }

        let on_map = |what: &'static str, x: i32, y: i32| {
            if map.contains(x, y) {
                Ok(())
            } else {
                Err(RaceError::OffMap { what, x, y })
            }
        };
        on_map("start pose", self.start_pose.tile_x, self.start_pose.tile_y)?;
        on_map(
            "recovery pose",
            self.recovery_pose.tile_x,
            self.recovery_pose.tile_y,
        )?;
        for (what, fence) in [
            ("start fence", &self.zones.start),
            ("finish fence", &self.zones.finish),
            ("wrong-direction fence", &self.zones.wrong_direction),
        ] {
            on_map(what, fence.x_min, fence.y_min)?;
            on_map(what, fence.x_max, fence.y_max)?;
        }
        Ok(())
    }

    /// The drivable tile set, honouring `allowed_tiles` when present.
    pub fn allowed_set(&self) -> AllowedSet {
        match &self.allowed_tiles {
            Some(ids) => AllowedSet::new(ids.iter().copied()),
            None => AllowedSet::default(),
        }
    }

    /// Pixel position of a pose's tile (top-left corner).
    pub fn pose_position(&self, pose: &Pose) -> (f32, f32) {
        (
            (pose.tile_x * self.tile_size as i32) as f32,
            (pose.tile_y * self.tile_size as i32) as f32,
        )
    }
}
