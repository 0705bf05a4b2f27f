use serde::{Deserialize, Serialize};

/// Key state sampled once per tick by the input source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInput {
    pub left: bool,
    pub right: bool,
    pub accelerate: bool,
    pub brake: bool,
    pub reverse: bool,
    pub escape: bool,
    pub space: bool,
    pub quit: bool,
}

impl DriveInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn accelerate() -> Self {
        Self {
            accelerate: true,
            ..Self::default()
        }
    }

    pub fn space() -> Self {
        Self {
            space: true,
            ..Self::default()
        }
    }

    pub fn escape() -> Self {
        Self {
            escape: true,
            ..Self::default()
        }
    }
}

/// Debug keys. Only honoured when the race runs with debugging enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInput {
    pub area_check_on: bool,
    pub area_check_off: bool,
    pub force_day: bool,
    pub force_night: bool,
    pub force_winter: bool,
    pub reset_damage: bool,
}

impl DebugInput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
