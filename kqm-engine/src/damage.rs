//! Damage formula multipliers.
use serde::{Deserialize, Serialize};

/// DEF reduction stops helping past this point.
const DEF_REDUCTION_CAP: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub level: u32,
    pub resistance: f64,
}

impl Enemy {
    #[must_use]
    pub const fn new(level: u32, resistance: f64) -> Self {
        Self { level, resistance }
    }

    /// Standard calculation target: level 100, 10% resistance to everything.
    #[must_use]
    pub const fn kqmc() -> Self {
        Self::new(100, 0.1)
    }
}

impl Default for Enemy {
    fn default() -> Self {
        Self::kqmc()
    }
}

/// Expected damage multiplier from crits. Crit rate is clamped to [0, 1].
#[must_use]
pub fn avg_crit_multiplier(crit_rate: f64, crit_dmg: f64) -> f64 {
    1.0 + crit_rate.clamp(0.0, 1.0) * crit_dmg
}

/// Share of damage that survives the enemy's DEF.
#[must_use]
pub fn def_multiplier(
    character_level: u32,
    enemy: &Enemy,
    def_reduction: f64,
    def_ignore: f64,
) -> f64 {
    let attacker = f64::from(character_level) + 100.0;
    let defender = (f64::from(enemy.level) + 100.0)
        * (1.0 - def_reduction.min(DEF_REDUCTION_CAP))
        * (1.0 - def_ignore);
    attacker / (attacker + defender)
}

/// Share of damage that survives the enemy's resistance.
#[must_use]
pub fn res_multiplier(resistance: f64) -> f64 {
    if resistance < 0.0 {
        1.0 - resistance / 2.0
    } else if resistance < 0.75 {
        1.0 - resistance
    } else {
        1.0 / (4.0 * resistance + 1.0)
    }
}
