use streetmachine_core::tilemap::{AllowedSet, TileMap};

use super::PlayerState;
use crate::config::RaceConfig;

/// Result of an off-road check that stopped the car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffRoadOutcome {
    /// Speed at the moment of contact.
    pub speed_before: i32,
    /// Damage added by this contact (0 below crash speed).
    pub damage_added: f32,
    /// Set on the tick the car first reaches maximum damage.
    pub newly_wrecked: bool,
}

/// Capability invoked once the car is wrecked. Nothing repairs the car yet.
pub trait RepairHook {
    fn on_wrecked(&mut self, player: &mut PlayerState);
}

/// Repair hook that leaves the car as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepair;

impl RepairHook for NoRepair {
    fn on_wrecked(&mut self, _player: &mut PlayerState) {}
}

/// Recompute drivability for the car's tile and stop it when it is off-road.
///
/// Every contact with a disallowed tile zeroes the speed, even below
/// `crash_speed`; only faster contacts add damage. Returns `None` when the
/// car is on a drivable tile or area checking is disabled.
pub fn apply_off_road(
    player: &mut PlayerState,
    map: &TileMap,
    allowed: &AllowedSet,
    check_enabled: bool,
    config: &RaceConfig,
) -> Option<OffRoadOutcome> {
    let tile = player.tile(config.tile_size);
    player.allowed = map.is_drivable(tile, allowed);
    if player.allowed || !check_enabled {
        return None;
    }

    let speed_before = player.speed;
    let damage_before = player.damage;
    let was_wrecked = player.wrecked;

    if speed_before > config.crash_speed {
        player.damage = (player.damage + speed_before as f32 * config.damage_factor)
            .clamp(0.0, config.max_damage);
        if player.damage >= config.max_damage {
            player.wrecked = true;
        }
    }
    player.speed = 0;

    Some(OffRoadOutcome {
        speed_before,
        damage_added: player.damage - damage_before,
        newly_wrecked: player.wrecked && !was_wrecked,
    })
}
