//! Character, weapon, and the buffed stat view the optimizer reads and mutates.
use serde::{Deserialize, Serialize};

use crate::artifacts::{Artifact, ArtifactSet};
use crate::stats::{Stat, StatTable, StatView};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub base_atk: f64,
    /// Secondary stat and passive bonuses.
    #[serde(default)]
    pub stats: StatTable,
}

impl Weapon {
    #[must_use]
    pub fn new(name: impl Into<String>, base_atk: f64, stats: StatTable) -> Self {
        Self {
            name: name.into(),
            base_atk,
            stats,
        }
    }

    /// Stat contribution including base ATK.
    #[must_use]
    pub fn table(&self) -> StatTable {
        let mut table = self.stats.clone();
        table.add(Stat::BaseAtk, self.base_atk);
        table
    }
}

/// A character plus everything it currently has equipped.
///
/// All setters mutate in place; callers that probe hypothetical states must
/// either restore what they changed or overwrite it completely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default = "Character::default_level")]
    pub level: u32,
    /// Character base stats plus any team buffs folded in by the caller.
    #[serde(default)]
    pub base: StatTable,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub artifacts: ArtifactSet,
    #[serde(default)]
    pub substats: StatTable,
}

impl Character {
    const fn default_level() -> u32 {
        90
    }

    #[must_use]
    pub fn new(name: impl Into<String>, level: u32, base: StatTable) -> Self {
        Self {
            name: name.into(),
            level,
            base,
            weapon: None,
            artifacts: ArtifactSet::default(),
            substats: StatTable::new(),
        }
    }

    #[must_use]
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Equip an artifact in its slot; returns `self` for chaining.
    pub fn equip(&mut self, artifact: Artifact) -> &mut Self {
        self.artifacts.equip(artifact);
        self
    }

    pub fn equip_weapon(&mut self, weapon: Weapon) -> Option<Weapon> {
        self.weapon.replace(weapon)
    }

    pub fn unequip_all_artifacts(&mut self) {
        self.artifacts.unequip_all();
    }

    pub fn clear_substats(&mut self) {
        self.substats = StatTable::new();
    }

    /// Replace the substat table wholesale.
    pub fn set_substats(&mut self, substats: StatTable) {
        self.substats = substats;
    }

    /// Base + weapon + artifact main stats, excluding substats.
    #[must_use]
    pub fn stats_without_substats(&self) -> StatTable {
        let mut table = self.base.clone();
        if let Some(weapon) = &self.weapon {
            table.add_table(&weapon.table());
        }
        table.add_table(&self.artifacts.main_stats());
        table
    }

    /// Base + weapon + character base only; nothing artifact-derived.
    #[must_use]
    pub fn stats_without_artifacts(&self) -> StatTable {
        let mut table = self.base.clone();
        if let Some(weapon) = &self.weapon {
            table.add_table(&weapon.table());
        }
        table
    }

    /// Fully buffed snapshot, recomputed from the current gear state.
    #[must_use]
    pub fn stats(&self) -> StatTable {
        self.stats_without_substats().merged(&self.substats)
    }

    /// Buffed snapshot with `extra` layered on top.
    #[must_use]
    pub fn stats_with(&self, extra: &StatTable) -> StatTable {
        self.stats().merged(extra)
    }
}

impl StatView for Character {
    fn get(&self, stat: Stat) -> f64 {
        self.stats().get(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactSlot;

    fn sample() -> Character {
        Character::new(
            "Tester",
            90,
            StatTable::from([
                (Stat::BaseAtk, 337.0),
                (Stat::EnergyRecharge, 1.0),
                (Stat::CritRate, 0.05),
                (Stat::CritDmg, 0.5),
            ]),
        )
        .with_weapon(Weapon::new(
            "Catch",
            510.0,
            StatTable::of(Stat::EnergyRecharge, 0.459),
        ))
    }

    #[test]
    fn buffed_view_sums_every_layer() {
        let mut c = sample();
        c.equip(Artifact::feather(5, 20).unwrap());
        c.equip(Artifact::new(ArtifactSlot::Sands, 5, 20, Stat::EnergyRecharge).unwrap());
        c.set_substats(StatTable::of(Stat::EnergyRecharge, 0.1));
        assert!((c.get(Stat::BaseAtk) - 847.0).abs() < 1e-9);
        assert!((c.get(Stat::FlatAtk) - 311.0).abs() < 1e-9);
        assert!((c.get(Stat::EnergyRecharge) - (1.0 + 0.459 + 0.518 + 0.1)).abs() < 1e-9);
        assert!(
            (c.stats_without_substats().get(Stat::EnergyRecharge) - (1.0 + 0.459 + 0.518)).abs()
                < 1e-9
        );
        assert!(
            (c.stats_without_artifacts().get(Stat::EnergyRecharge) - 1.459).abs() < 1e-9
        );
    }

    #[test]
    fn clearing_restores_base_view() {
        let mut c = sample();
        let before = c.stats();
        c.equip(Artifact::flower(5, 20).unwrap());
        c.set_substats(StatTable::of(Stat::CritRate, 0.3));
        c.unequip_all_artifacts();
        c.clear_substats();
        assert_eq!(c.stats(), before);
    }

    #[test]
    fn stats_with_layers_extra_table_without_mutation() {
        let c = sample();
        let boosted = c.stats_with(&StatTable::of(Stat::CritRate, 1.0));
        assert!((boosted.get(Stat::CritRate) - 1.05).abs() < 1e-12);
        assert!((c.get(Stat::CritRate) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn character_deserializes_with_defaults() {
        let json = r#"{ "name": "Bare", "base": { "base_atk": 100.0 } }"#;
        let c: Character = serde_json::from_str(json).unwrap();
        assert_eq!(c.level, 90);
        assert!(c.weapon.is_none());
        assert!(c.substats.is_empty());
        assert!((c.total_atk() - 100.0).abs() < 1e-12);
    }
}
