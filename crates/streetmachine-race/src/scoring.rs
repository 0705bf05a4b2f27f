use serde::{Deserialize, Serialize};

use crate::Mode;

/// Lap time per skin, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapTimes {
    pub day: Option<u64>,
    pub night: Option<u64>,
    pub winter: Option<u64>,
}

impl LapTimes {
    /// Store a lap for `mode`. Laps recorded in highscore mode are ignored.
    pub fn record(&mut self, mode: Mode, ms: u64) {
        match mode {
            Mode::Day => self.day = Some(ms),
            Mode::Night => self.night = Some(ms),
            Mode::Winter => self.winter = Some(ms),
            Mode::Highscore => {},
        }
    }

    pub fn get(&self, mode: Mode) -> Option<u64> {
        match mode {
            Mode::Day => self.day,
            Mode::Night => self.night,
            Mode::Winter => self.winter,
            Mode::Highscore => None,
        }
    }

    /// All three laps in driving order, once complete.
    pub fn laps(&self) -> Option<[u64; 3]> {
        Some([self.day?, self.night?, self.winter?])
    }

    /// Final score: integer mean of the three laps.
    pub fn average(&self) -> Option<u64> {
        self.laps().map(|laps| laps.iter().sum::<u64>() / 3)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
