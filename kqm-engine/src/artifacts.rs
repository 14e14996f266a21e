//! Artifact slots, main-stat and substat value tables, and roll quality tiers.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::{Stat, StatTable};

/// Discrete roll outcome tiers used to plan allocations deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollQuality {
    Low,
    Medium,
    High,
    Max,
    #[default]
    Avg,
}

impl RollQuality {
    /// Fraction of the max-roll value granted by one roll of this tier.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Low => 0.7,
            Self::Medium => 0.8,
            Self::High => 0.9,
            Self::Max => 1.0,
            Self::Avg => 0.85,
        }
    }

    /// Highest tier; used for theoretical ceilings.
    #[must_use]
    pub const fn best() -> Self {
        Self::Max
    }
}

/// The ten stats that can appear as artifact substats, in search order.
pub const SUB_STATS: [Stat; 10] = [
    Stat::FlatAtk,
    Stat::AtkPercent,
    Stat::FlatHp,
    Stat::HpPercent,
    Stat::FlatDef,
    Stat::DefPercent,
    Stat::ElementalMastery,
    Stat::EnergyRecharge,
    Stat::CritRate,
    Stat::CritDmg,
];

/// Every legal substat, in `Stat` declaration order.
pub fn possible_sub_stats() -> impl Iterator<Item = Stat> {
    SUB_STATS.into_iter()
}

#[must_use]
pub fn is_sub_stat(stat: Stat) -> bool {
    SUB_STATS.contains(&stat)
}

/// Highest level an artifact of `rarity` can reach.
#[must_use]
pub const fn max_level(rarity: u8) -> Option<u8> {
    match rarity {
        4 => Some(16),
        5 => Some(20),
        _ => None,
    }
}

const fn main_stat_bounds(rarity: u8, stat: Stat) -> Option<(f64, f64)> {
    let bounds = match (rarity, stat) {
        (5, Stat::FlatHp) => (717.0, 4780.0),
        (5, Stat::FlatAtk) => (47.0, 311.0),
        (5, Stat::HpPercent | Stat::AtkPercent) => (0.070, 0.466),
        (5, Stat::DefPercent | Stat::PhysicalDmgBonus) => (0.087, 0.583),
        (5, Stat::ElementalMastery) => (28.0, 186.5),
        (5, Stat::EnergyRecharge) => (0.078, 0.518),
        (
            5,
            Stat::PyroDmgBonus
            | Stat::HydroDmgBonus
            | Stat::ElectroDmgBonus
            | Stat::CryoDmgBonus
            | Stat::AnemoDmgBonus
            | Stat::GeoDmgBonus
            | Stat::DendroDmgBonus,
        ) => (0.070, 0.466),
        (5, Stat::CritRate) => (0.047, 0.311),
        (5, Stat::CritDmg) => (0.093, 0.622),
        (5, Stat::HealingBonus) => (0.054, 0.359),
        (4, Stat::FlatHp) => (645.0, 3571.0),
        (4, Stat::FlatAtk) => (42.0, 232.0),
        (4, Stat::HpPercent | Stat::AtkPercent) => (0.063, 0.348),
        (4, Stat::DefPercent | Stat::PhysicalDmgBonus) => (0.079, 0.435),
        (4, Stat::ElementalMastery) => (25.2, 139.3),
        (4, Stat::EnergyRecharge) => (0.070, 0.387),
        (
            4,
            Stat::PyroDmgBonus
            | Stat::HydroDmgBonus
            | Stat::ElectroDmgBonus
            | Stat::CryoDmgBonus
            | Stat::AnemoDmgBonus
            | Stat::GeoDmgBonus
            | Stat::DendroDmgBonus,
        ) => (0.063, 0.348),
        (4, Stat::CritRate) => (0.042, 0.232),
        (4, Stat::CritDmg) => (0.084, 0.464),
        (4, Stat::HealingBonus) => (0.048, 0.268),
        _ => return None,
    };
    Some(bounds)
}

/// Main-stat value of an artifact, interpolated linearly between level 0 and max level.
///
/// Returns `None` for unsupported rarities, levels past the cap, or stats
/// that never appear as a main stat.
#[must_use]
pub fn main_stat_value(rarity: u8, level: u8, stat: Stat) -> Option<f64> {
    let cap = max_level(rarity)?;
    if level > cap {
        return None;
    }
    let (start, end) = main_stat_bounds(rarity, stat)?;
    Some(start + (end - start) * f64::from(level) / f64::from(cap))
}

/// Value of a single max-quality substat roll.
#[must_use]
pub const fn sub_stat_value(rarity: u8, stat: Stat) -> Option<f64> {
    let value = match (rarity, stat) {
        (5, Stat::FlatHp) => 298.75,
        (5, Stat::FlatAtk) => 19.45,
        (5, Stat::FlatDef) => 23.15,
        (5, Stat::HpPercent | Stat::AtkPercent) => 0.0583,
        (5, Stat::DefPercent) => 0.0729,
        (5, Stat::ElementalMastery) => 23.31,
        (5, Stat::EnergyRecharge) => 0.0648,
        (5, Stat::CritRate) => 0.0389,
        (5, Stat::CritDmg) => 0.0777,
        (4, Stat::FlatHp) => 239.0,
        (4, Stat::FlatAtk) => 16.0,
        (4, Stat::FlatDef) => 19.0,
        (4, Stat::HpPercent | Stat::AtkPercent) => 0.0466,
        (4, Stat::DefPercent) => 0.0583,
        (4, Stat::ElementalMastery) => 18.65,
        (4, Stat::EnergyRecharge) => 0.0518,
        (4, Stat::CritRate) => 0.0311,
        (4, Stat::CritDmg) => 0.0622,
        _ => return None,
    };
    Some(value)
}

/// The five equipment positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSlot {
    Flower,
    Feather,
    Sands,
    Goblet,
    Circlet,
}

const FLOWER_MAINS: [Stat; 1] = [Stat::FlatHp];
const FEATHER_MAINS: [Stat; 1] = [Stat::FlatAtk];
const SANDS_MAINS: [Stat; 5] = [
    Stat::AtkPercent,
    Stat::HpPercent,
    Stat::DefPercent,
    Stat::ElementalMastery,
    Stat::EnergyRecharge,
];
const GOBLET_MAINS: [Stat; 12] = [
    Stat::AtkPercent,
    Stat::HpPercent,
    Stat::DefPercent,
    Stat::ElementalMastery,
    Stat::PyroDmgBonus,
    Stat::HydroDmgBonus,
    Stat::ElectroDmgBonus,
    Stat::CryoDmgBonus,
    Stat::AnemoDmgBonus,
    Stat::GeoDmgBonus,
    Stat::DendroDmgBonus,
    Stat::PhysicalDmgBonus,
];
const CIRCLET_MAINS: [Stat; 7] = [
    Stat::AtkPercent,
    Stat::HpPercent,
    Stat::DefPercent,
    Stat::ElementalMastery,
    Stat::CritRate,
    Stat::CritDmg,
    Stat::HealingBonus,
];

impl ArtifactSlot {
    pub const ALL: [Self; 5] = [
        Self::Flower,
        Self::Feather,
        Self::Sands,
        Self::Goblet,
        Self::Circlet,
    ];

    /// Slots whose main stat is chosen at equip time.
    pub const CONFIGURABLE: [Self; 3] = [Self::Sands, Self::Goblet, Self::Circlet];

    /// Main stats this slot accepts, in search order.
    #[must_use]
    pub const fn allowed_main_stats(self) -> &'static [Stat] {
        match self {
            Self::Flower => &FLOWER_MAINS,
            Self::Feather => &FEATHER_MAINS,
            Self::Sands => &SANDS_MAINS,
            Self::Goblet => &GOBLET_MAINS,
            Self::Circlet => &CIRCLET_MAINS,
        }
    }

    #[must_use]
    pub const fn is_configurable(self) -> bool {
        matches!(self, Self::Sands | Self::Goblet | Self::Circlet)
    }

    #[must_use]
    pub fn allows(self, stat: Stat) -> bool {
        self.allowed_main_stats().contains(&stat)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flower => "flower",
            Self::Feather => "feather",
            Self::Sands => "sands",
            Self::Goblet => "goblet",
            Self::Circlet => "circlet",
        }
    }
}

/// Errors raised when an artifact is described with values the tables cannot back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("unsupported artifact rarity {0} (expected 4 or 5)")]
    UnsupportedRarity(u8),
    #[error("level {level} exceeds the cap of {max} for {rarity}-star artifacts")]
    LevelOutOfRange { rarity: u8, level: u8, max: u8 },
    #[error("{stat} is not a legal {} main stat", slot.label())]
    MainStatNotAllowed { slot: ArtifactSlot, stat: Stat },
}

/// One equipped artifact, reduced to what the optimizer needs: its main stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub slot: ArtifactSlot,
    pub rarity: u8,
    pub level: u8,
    pub main_stat: Stat,
}

impl Artifact {
    /// Build a validated artifact.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError` when the rarity is unsupported, the level exceeds
    /// the rarity cap, or the slot does not accept `main_stat`.
    pub fn new(
        slot: ArtifactSlot,
        rarity: u8,
        level: u8,
        main_stat: Stat,
    ) -> Result<Self, ArtifactError> {
        let max = max_level(rarity).ok_or(ArtifactError::UnsupportedRarity(rarity))?;
        if level > max {
            return Err(ArtifactError::LevelOutOfRange { rarity, level, max });
        }
        if !slot.allows(main_stat) {
            return Err(ArtifactError::MainStatNotAllowed {
                slot,
                stat: main_stat,
            });
        }
        Ok(Self {
            slot,
            rarity,
            level,
            main_stat,
        })
    }

    /// Flower with its single canonical main stat.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError` for unsupported rarity or level.
    pub fn flower(rarity: u8, level: u8) -> Result<Self, ArtifactError> {
        Self::new(ArtifactSlot::Flower, rarity, level, Stat::FlatHp)
    }

    /// Feather with its single canonical main stat.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError` for unsupported rarity or level.
    pub fn feather(rarity: u8, level: u8) -> Result<Self, ArtifactError> {
        Self::new(ArtifactSlot::Feather, rarity, level, Stat::FlatAtk)
    }

    #[must_use]
    pub fn main_stat_value(&self) -> f64 {
        main_stat_value(self.rarity, self.level, self.main_stat).unwrap_or(0.0)
    }

    /// Stat contribution of this piece.
    #[must_use]
    pub fn stats(&self) -> StatTable {
        StatTable::of(self.main_stat, self.main_stat_value())
    }
}

/// Five optional equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    #[serde(default)]
    pub flower: Option<Artifact>,
    #[serde(default)]
    pub feather: Option<Artifact>,
    #[serde(default)]
    pub sands: Option<Artifact>,
    #[serde(default)]
    pub goblet: Option<Artifact>,
    #[serde(default)]
    pub circlet: Option<Artifact>,
}

impl ArtifactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: ArtifactSlot) -> &mut Option<Artifact> {
        match slot {
            ArtifactSlot::Flower => &mut self.flower,
            ArtifactSlot::Feather => &mut self.feather,
            ArtifactSlot::Sands => &mut self.sands,
            ArtifactSlot::Goblet => &mut self.goblet,
            ArtifactSlot::Circlet => &mut self.circlet,
        }
    }

    /// Put `artifact` in its slot, returning whatever was there before.
    pub fn equip(&mut self, artifact: Artifact) -> Option<Artifact> {
        self.slot_mut(artifact.slot).replace(artifact)
    }

    pub fn unequip(&mut self, slot: ArtifactSlot) -> Option<Artifact> {
        self.slot_mut(slot).take()
    }

    pub fn unequip_all(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn get(&self, slot: ArtifactSlot) -> Option<&Artifact> {
        match slot {
            ArtifactSlot::Flower => self.flower.as_ref(),
            ArtifactSlot::Feather => self.feather.as_ref(),
            ArtifactSlot::Sands => self.sands.as_ref(),
            ArtifactSlot::Goblet => self.goblet.as_ref(),
            ArtifactSlot::Circlet => self.circlet.as_ref(),
        }
    }

    /// Equipped pieces in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        ArtifactSlot::ALL.into_iter().filter_map(|slot| self.get(slot))
    }

    /// Sum of every equipped main stat.
    #[must_use]
    pub fn main_stats(&self) -> StatTable {
        self.iter()
            .map(|artifact| (artifact.main_stat, artifact.main_stat_value()))
            .collect()
    }

    /// Number of the five slots whose main stat is not `stat` (empty slots count).
    #[must_use]
    pub fn slots_without_main(&self, stat: Stat) -> usize {
        ArtifactSlot::ALL
            .into_iter()
            .filter(|&slot| self.get(slot).is_none_or(|a| a.main_stat != stat))
            .count()
    }
}
