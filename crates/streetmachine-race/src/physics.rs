use serde::{Deserialize, Serialize};

use streetmachine_core::input::DriveInput;
use streetmachine_core::tilemap::TileMap;

use super::PlayerState;
use crate::config::{BrakeDecrement, RaceConfig};

/// Pixel rectangle the car may occupy so the camera never scrolls past the map edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    /// `[half_view, map_extent - half_view - tile_size]` on each axis.
    pub fn for_map(map: &TileMap, config: &RaceConfig) -> Self {
        let tile = config.tile_size;
        let half_x = (config.viewport_tiles_x / 2 * tile) as f32;
        let half_y = (config.viewport_tiles_y / 2 * tile) as f32;
        Self {
            min_x: half_x,
            max_x: map.pixel_width(tile) - half_x - tile as f32,
            min_y: half_y,
            max_y: map.pixel_height(tile) - half_y - tile as f32,
        }
    }

    /// Clamp upper bound first, then lower, so a degenerate range resolves to the minimum.
    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        let mut x = x;
        let mut y = y;
        if x > self.max_x {
            x = self.max_x;
        }
        if x < self.min_x {
            x = self.min_x;
        }
        if y > self.max_y {
            y = self.max_y;
        }
        if y < self.min_y {
            y = self.min_y;
        }
        (x, y)
    }
}

/// Move a position one tick along `heading`.
///
/// Heading 0 moves up (-y); increasing heading rotates toward -x, then +y.
pub fn advance(
    x: f32,
    y: f32,
    speed: i32,
    heading: i32,
    bounds: &Bounds,
    speed_scale: f32,
) -> (f32, f32) {
    let scaled = speed as f32 / speed_scale;
    let radians = (heading as f32).to_radians();
    let dx = radians.sin() * scaled;
    let dy = radians.cos() * scaled;
    bounds.clamp(x - dx, y - dy)
}

/// Degrees turned per tick at the given speed (truncated toward zero).
pub fn turn_amount(speed: i32, config: &RaceConfig) -> i32 {
    (config.base_turn as f32 + speed as f32 / 10.0) as i32
}

/// Turn counter-clockwise. Reaching 360 resets the heading to 0.
pub fn steer_left(player: &mut PlayerState, config: &RaceConfig) {
    player.heading += turn_amount(player.speed, config);
    if player.heading >= 360 {
        player.heading = 0;
    }
}

/// Turn clockwise. Reaching 0 resets the heading to 360.
pub fn steer_right(player: &mut PlayerState, config: &RaceConfig) {
    player.heading -= turn_amount(player.speed, config);
    if player.heading <= 0 {
        player.heading = 360;
    }
}

/// Throttle. Has no effect while reversing.
pub fn accelerate(player: &mut PlayerState, config: &RaceConfig) {
    if player.speed >= 0 {
        player.speed += config.accel_step;
    }
    if player.speed >= config.max_speed {
        player.speed = config.max_speed;
    }
    if player.damage > config.damaged_speed_threshold && player.speed > config.damaged_max_speed
    {
        player.speed = config.damaged_max_speed;
    }
}

/// Brake toward zero; never produces a negative speed.
pub fn brake(player: &mut PlayerState, decrement: BrakeDecrement) {
    let amount = decrement.amount();
    if player.speed - amount <= 0 {
        player.speed = 0;
    } else {
        player.speed -= amount;
    }
}

/// Reverse gear, only engaged from a standstill.
pub fn reverse(player: &mut PlayerState, config: &RaceConfig) {
    if player.speed <= 0 {
        player.speed -= config.reverse_step;
    }
    if player.speed <= config.reverse_floor {
        player.speed = config.reverse_floor;
    }
}

/// Apply held keys in input order: left, right, throttle, brake, reverse.
pub fn apply_drive_input(player: &mut PlayerState, input: &DriveInput, config: &RaceConfig) {
    if input.left {
        steer_left(player, config);
    }
    if input.right {
        steer_right(player, config);
    }
    if input.accelerate {
        accelerate(player, config);
    }
    if input.brake {
        brake(player, config.brake_decrement);
    }
    if input.reverse {
        reverse(player, config);
    }
}
