mod decay;
mod interaction;
mod progression;
mod store;

use serde::{Deserialize, Serialize};

pub use decay::{decay, DECAY_THRESHOLD_HOURS};
pub use interaction::{Interaction, InteractionOutcome, InteractionRejected, FULL_THRESHOLD, PLAY_MIN_ENERGY};
pub use progression::{MascotProgress, Stage, MIN_LEVEL, STAGE_THRESHOLDS, XP_PER_LEVEL};
pub use store::{fetch_profile, interact, update_progress, MascotUpdate};

pub const NEED_MIN: i64 = 0;
pub const NEED_MAX: i64 = 100;
pub const DEFAULT_NEED: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    Hunger,
    Energy,
    Happiness,
    Hygiene,
}

impl Need {
    pub const ALL: [Need; 4] = [Need::Hunger, Need::Energy, Need::Happiness, Need::Hygiene];

    pub fn column(&self) -> &'static str {
        match self {
            Need::Hunger => "mascot_hunger",
            Need::Energy => "mascot_energy",
            Need::Happiness => "mascot_happiness",
            Need::Hygiene => "mascot_hygiene",
        }
    }

    /// Whole points lost per elapsed hour.
    pub fn decay_per_hour(&self) -> i64 {
        match self {
            Need::Hunger => 5,
            Need::Energy => 3,
            Need::Happiness => 4,
            Need::Hygiene => 2,
        }
    }
}

/// The four mascot needs, each kept in `[NEED_MIN, NEED_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Needs {
    #[serde(rename = "mascot_hunger")]
    pub hunger: i64,
    #[serde(rename = "mascot_energy")]
    pub energy: i64,
    #[serde(rename = "mascot_happiness")]
    pub happiness: i64,
    #[serde(rename = "mascot_hygiene")]
    pub hygiene: i64,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: DEFAULT_NEED,
            energy: DEFAULT_NEED,
            happiness: DEFAULT_NEED,
            hygiene: DEFAULT_NEED,
        }
    }
}

impl Needs {
    pub fn new(hunger: i64, energy: i64, happiness: i64, hygiene: i64) -> Self {
        Self { hunger, energy, happiness, hygiene }.clamped()
    }

    /// Missing stored values fall back to `DEFAULT_NEED`.
    pub fn from_stored(hunger: Option<i64>, energy: Option<i64>, happiness: Option<i64>, hygiene: Option<i64>) -> Self {
        Self::new(
            hunger.unwrap_or(DEFAULT_NEED),
            energy.unwrap_or(DEFAULT_NEED),
            happiness.unwrap_or(DEFAULT_NEED),
            hygiene.unwrap_or(DEFAULT_NEED),
        )
    }

    pub fn get(&self, need: Need) -> i64 {
        match need {
            Need::Hunger => self.hunger,
            Need::Energy => self.energy,
            Need::Happiness => self.happiness,
            Need::Hygiene => self.hygiene,
        }
    }

    pub fn set(&mut self, need: Need, value: i64) {
        let value = value.clamp(NEED_MIN, NEED_MAX);
        match need {
            Need::Hunger => self.hunger = value,
            Need::Energy => self.energy = value,
            Need::Happiness => self.happiness = value,
            Need::Hygiene => self.hygiene = value,
        }
    }

    /// Adds `delta` (possibly negative) and clamps.
    pub fn adjust(&mut self, need: Need, delta: i64) {
        self.set(need, self.get(need) + delta);
    }

    fn clamped(mut self) -> Self {
        for need in Need::ALL {
            self.set(need, self.get(need));
        }
        self
    }
}

/// Needs plus the decay clock, as sent to clients under `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MascotStats {
    #[serde(flatten)]
    pub needs: Needs,
    pub mascot_last_update: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_stay_in_range() {
        let needs = Needs::new(150, -20, 50, 100);
        assert_eq!(needs, Needs { hunger: 100, energy: 0, happiness: 50, hygiene: 100 });

        let mut needs = Needs::default();
        needs.adjust(Need::Energy, -80);
        needs.adjust(Need::Hunger, 75);
        assert_eq!(needs.energy, 0);
        assert_eq!(needs.hunger, 100);
    }

    #[test]
    fn missing_values_default_to_fifty() {
        let needs = Needs::from_stored(None, Some(10), None, Some(90));
        assert_eq!(needs, Needs { hunger: 50, energy: 10, happiness: 50, hygiene: 90 });
    }

    #[test]
    fn stats_serialize_with_column_names() {
        let stats = MascotStats { needs: Needs::new(1, 2, 3, 4), mascot_last_update: 99 };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mascot_hunger": 1,
                "mascot_energy": 2,
                "mascot_happiness": 3,
                "mascot_hygiene": 4,
                "mascot_last_update": 99
            })
        );
        let back: MascotStats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
