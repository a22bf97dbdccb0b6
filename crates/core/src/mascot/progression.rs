use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{CoreError, CoreResult};

pub const MIN_LEVEL: i64 = 1;
pub const XP_PER_LEVEL: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Egg,
    Baby,
    Junior,
    Adult,
    Super,
    Legendary,
}

/// Minimum level for each stage, lowest first.
pub const STAGE_THRESHOLDS: [(i64, Stage); 6] = [
    (0, Stage::Egg),
    (1, Stage::Baby),
    (3, Stage::Junior),
    (5, Stage::Adult),
    (8, Stage::Super),
    (10, Stage::Legendary),
];

impl Stage {
    /// Highest stage whose threshold `level` reaches.
    pub fn for_level(level: i64) -> Stage {
        STAGE_THRESHOLDS
            .iter()
            .rev()
            .find(|(min_level, _)| level >= *min_level)
            .map(|(_, stage)| *stage)
            .unwrap_or(Stage::Egg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MascotProgress {
    pub mascot_level: i64,
    pub mascot_xp: i64,
    pub mascot_stage: Stage,
}

impl Default for MascotProgress {
    fn default() -> Self {
        Self {
            mascot_level: MIN_LEVEL,
            mascot_xp: 0,
            mascot_stage: Stage::for_level(MIN_LEVEL),
        }
    }
}

impl MascotProgress {
    pub fn new(level: i64, xp: i64) -> CoreResult<Self> {
        if level < MIN_LEVEL {
            return Err(CoreError::validation("Level must be at least 1"));
        }
        if !(0..XP_PER_LEVEL).contains(&xp) {
            return Err(CoreError::validation("XP must be between 0 and 99"));
        }
        Ok(Self {
            mascot_level: level,
            mascot_xp: xp,
            mascot_stage: Stage::for_level(level),
        })
    }

    /// Adds xp; reaching `XP_PER_LEVEL` levels up once and starts the bar over at zero.
    /// Returns whether a level was gained.
    pub fn gain_xp(&mut self, amount: i64) -> bool {
        self.mascot_xp += amount.max(0);
        if self.mascot_xp < XP_PER_LEVEL {
            return false;
        }
        self.mascot_xp = 0;
        self.mascot_level += 1;
        self.mascot_stage = Stage::for_level(self.mascot_level);
        true
    }
}
