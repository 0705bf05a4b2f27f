use serde::{Deserialize, Serialize};

use streetmachine_core::tilemap::TileCoord;

/// Inclusive range of integer headings in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRange {
    pub min: i32,
    pub max: i32,
}

impl HeadingRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, heading: i32) -> bool {
        (self.min..=self.max).contains(&heading)
    }
}

/// Rectangle of tiles plus the headings that count as crossing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geofence {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    pub headings: Vec<HeadingRange>,
}

impl Geofence {
    pub fn covers_tile(&self, tile: TileCoord) -> bool {
        (self.x_min..=self.x_max).contains(&tile.x) && (self.y_min..=self.y_max).contains(&tile.y)
    }

    /// Whether a car on `tile` facing `heading` crosses this fence.
    pub fn matches(&self, tile: TileCoord, heading: i32) -> bool {
        self.covers_tile(tile) && self.headings.iter().any(|r| r.contains(heading))
    }
}

/// The three line-crossing regions of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneLayout {
    /// Start line, crossed facing up.
    pub start: Geofence,
    /// Finish line, crossed facing left.
    pub finish: Geofence,
    /// Finish line crossed facing right.
    pub wrong_direction: Geofence,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            start: Geofence {
                x_min: 42,
                x_max: 44,
                y_min: 97,
                y_max: 97,
                headings: vec![HeadingRange::new(0, 88), HeadingRange::new(271, 359)],
            },
            finish: Geofence {
                x_min: 46,
                x_max: 46,
                y_min: 100,
                y_max: 102,
                headings: vec![HeadingRange::new(1, 178)],
            },
            wrong_direction: Geofence {
                x_min: 46,
                x_max: 46,
                y_min: 100,
                y_max: 102,
                headings: vec![HeadingRange::new(181, 358)],
            },
        }
    }
}

/// Discrete line-crossing event for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneEvent {
    StartCrossed,
    FinishCrossed,
    WrongDirection,
}

/// Evaluate the car's tile and heading against the layout.
///
/// Start only fires while no lap is running and finish only while one is;
/// wrong-direction fires regardless of lap state.
pub fn detect(
    layout: &ZoneLayout,
    tile: TileCoord,
    heading: i32,
    lap_running: bool,
) -> Option<ZoneEvent> {
    if layout.wrong_direction.matches(tile, heading) {
        return Some(ZoneEvent::WrongDirection);
    }
    if !lap_running && layout.start.matches(tile, heading) {
        return Some(ZoneEvent::StartCrossed);
    }
    if lap_running && layout.finish.matches(tile, heading) {
        return Some(ZoneEvent::FinishCrossed);
    }
    None
}
