use streetmachine_core::input::DriveInput;
use streetmachine_core::tilemap::TileCoord;
use streetmachine_core::track::circuit_waypoints;

use crate::config::RaceConfig;
use crate::{Mode, RaceSnapshot};

/// Distance (in tiles) at which a waypoint counts as reached.
const ARRIVE_TILES: f32 = 1.5;

/// Distance (in tiles) from a waypoint where the car slows for the corner.
const SLOW_TILES: f32 = 4.0;

/// Heading error (degrees) that counts as a corner.
const SHARP_TURN_DEG: i32 = 45;

/// Waypoint follower producing drive input for headless runs.
#[derive(Debug, Clone)]
pub struct Autopilot {
    waypoints: Vec<TileCoord>,
    next: usize,
    cruise_speed: i32,
    corner_speed: i32,
    heading_tolerance: i32,
    last_mode: Mode,
}

impl Autopilot {
    pub fn new(waypoints: Vec<TileCoord>) -> Self {
        Self {
            waypoints,
            next: 0,
            cruise_speed: 40,
            corner_speed: 16,
            heading_tolerance: 6,
            last_mode: Mode::Highscore,
        }
    }

    /// Follower for the generated demo circuit.
    pub fn for_demo_circuit() -> Self {
        Self::new(circuit_waypoints())
    }

    pub fn next_waypoint(&self) -> Option<TileCoord> {
        self.waypoints.get(self.next).copied()
    }

    /// Decide this tick's keys from the current race view.
    pub fn generate_input(&mut self, snapshot: &RaceSnapshot, config: &RaceConfig) -> DriveInput {
        // A new lap restarts at the start pose, so restart the route too
        if snapshot.mode != self.last_mode {
            self.next = 0;
            self.last_mode = snapshot.mode;
        }
        if !snapshot.mode.is_driving() {
            return DriveInput::space();
        }
        if self.waypoints.is_empty() {
            return DriveInput::none();
        }

        let tile = config.tile_size as f32;
        let (mut dx, mut dy, mut dist) = self.offset_to_next(snapshot, tile);
        if dist < ARRIVE_TILES * tile {
            self.next = (self.next + 1) % self.waypoints.len();
            (dx, dy, dist) = self.offset_to_next(snapshot, tile);
        }

        let error = heading_error(desired_heading(dx, dy), snapshot.heading);
        let mut input = DriveInput::default();
        if error > self.heading_tolerance {
            input.left = true;
        } else if error < -self.heading_tolerance {
            input.right = true;
        }

        let target_speed = if error.abs() > SHARP_TURN_DEG || dist < SLOW_TILES * tile {
            self.corner_speed
        } else {
            self.cruise_speed
        };
        if snapshot.speed < target_speed {
            input.accelerate = true;
        } else if snapshot.speed - config.brake_decrement.amount() >= target_speed {
            input.brake = true;
        }
        input
    }

    fn offset_to_next(&self, snapshot: &RaceSnapshot, tile: f32) -> (f32, f32, f32) {
        let target = self.waypoints[self.next];
        let tx = target.x as f32 * tile + tile / 2.0;
        let ty = target.y as f32 * tile + tile / 2.0;
        let dx = tx - snapshot.x;
        let dy = ty - snapshot.y;
        (dx, dy, (dx * dx + dy * dy).sqrt())
    }
}

/// Heading (degrees, `[0, 360)`) that moves the car along `(dx, dy)`.
pub fn desired_heading(dx: f32, dy: f32) -> i32 {
    let degrees = (-dx).atan2(-dy).to_degrees().round() as i32;
    degrees.rem_euclid(360)
}

/// Signed shortest turn from `current` to `desired`; positive means turn left.
pub fn heading_error(desired: i32, current: i32) -> i32 {
    let diff = (desired - current).rem_euclid(360);
    if diff > 180 { diff - 360 } else { diff }
}
