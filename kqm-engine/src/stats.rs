//! Stat identifiers and additive stat tables.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every damage-relevant stat dimension.
///
/// Declaration order is significant: searches iterate candidates in this
/// order and break ties in favour of the earlier stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    BaseAtk,
    FlatAtk,
    AtkPercent,
    BaseHp,
    FlatHp,
    HpPercent,
    BaseDef,
    FlatDef,
    DefPercent,
    ElementalMastery,
    EnergyRecharge,
    CritRate,
    CritDmg,
    HealingBonus,
    DmgBonus,
    PyroDmgBonus,
    HydroDmgBonus,
    ElectroDmgBonus,
    CryoDmgBonus,
    AnemoDmgBonus,
    GeoDmgBonus,
    DendroDmgBonus,
    PhysicalDmgBonus,
    NormalAttackDmgBonus,
    ChargedAttackDmgBonus,
    PlungeAttackDmgBonus,
    SkillDmgBonus,
    BurstDmgBonus,
    DefReduction,
    DefIgnore,
}

impl Stat {
    pub const ALL: [Self; 30] = [
        Self::BaseAtk,
        Self::FlatAtk,
        Self::AtkPercent,
        Self::BaseHp,
        Self::FlatHp,
        Self::HpPercent,
        Self::BaseDef,
        Self::FlatDef,
        Self::DefPercent,
        Self::ElementalMastery,
        Self::EnergyRecharge,
        Self::CritRate,
        Self::CritDmg,
        Self::HealingBonus,
        Self::DmgBonus,
        Self::PyroDmgBonus,
        Self::HydroDmgBonus,
        Self::ElectroDmgBonus,
        Self::CryoDmgBonus,
        Self::AnemoDmgBonus,
        Self::GeoDmgBonus,
        Self::DendroDmgBonus,
        Self::PhysicalDmgBonus,
        Self::NormalAttackDmgBonus,
        Self::ChargedAttackDmgBonus,
        Self::PlungeAttackDmgBonus,
        Self::SkillDmgBonus,
        Self::BurstDmgBonus,
        Self::DefReduction,
        Self::DefIgnore,
    ];

    /// Stable snake_case label, identical to the serialized form.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::BaseAtk => "base_atk",
            Self::FlatAtk => "flat_atk",
            Self::AtkPercent => "atk_percent",
            Self::BaseHp => "base_hp",
            Self::FlatHp => "flat_hp",
            Self::HpPercent => "hp_percent",
            Self::BaseDef => "base_def",
            Self::FlatDef => "flat_def",
            Self::DefPercent => "def_percent",
            Self::ElementalMastery => "elemental_mastery",
            Self::EnergyRecharge => "energy_recharge",
            Self::CritRate => "crit_rate",
            Self::CritDmg => "crit_dmg",
            Self::HealingBonus => "healing_bonus",
            Self::DmgBonus => "dmg_bonus",
            Self::PyroDmgBonus => "pyro_dmg_bonus",
            Self::HydroDmgBonus => "hydro_dmg_bonus",
            Self::ElectroDmgBonus => "electro_dmg_bonus",
            Self::CryoDmgBonus => "cryo_dmg_bonus",
            Self::AnemoDmgBonus => "anemo_dmg_bonus",
            Self::GeoDmgBonus => "geo_dmg_bonus",
            Self::DendroDmgBonus => "dendro_dmg_bonus",
            Self::PhysicalDmgBonus => "physical_dmg_bonus",
            Self::NormalAttackDmgBonus => "normal_attack_dmg_bonus",
            Self::ChargedAttackDmgBonus => "charged_attack_dmg_bonus",
            Self::PlungeAttackDmgBonus => "plunge_attack_dmg_bonus",
            Self::SkillDmgBonus => "skill_dmg_bonus",
            Self::BurstDmgBonus => "burst_dmg_bonus",
            Self::DefReduction => "def_reduction",
            Self::DefIgnore => "def_ignore",
        }
    }

    /// Whether values of this stat are fractions (0.466 = 46.6%).
    #[must_use]
    pub const fn is_percentage(self) -> bool {
        !matches!(
            self,
            Self::BaseAtk
                | Self::FlatAtk
                | Self::BaseHp
                | Self::FlatHp
                | Self::BaseDef
                | Self::FlatDef
                | Self::ElementalMastery
        )
    }

    /// Format a value of this stat for display (`46.6%` or `311`).
    #[must_use]
    pub fn format_value(self, value: f64) -> String {
        if self.is_percentage() {
            format!("{:.1}%", value * 100.0)
        } else {
            format!("{value:.0}")
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Damage element; selects which elemental bonus applies to a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Pyro,
    Hydro,
    Electro,
    Cryo,
    Anemo,
    Geo,
    Dendro,
    Physical,
}

impl Element {
    #[must_use]
    pub const fn dmg_bonus_stat(self) -> Stat {
        match self {
            Self::Pyro => Stat::PyroDmgBonus,
            Self::Hydro => Stat::HydroDmgBonus,
            Self::Electro => Stat::ElectroDmgBonus,
            Self::Cryo => Stat::CryoDmgBonus,
            Self::Anemo => Stat::AnemoDmgBonus,
            Self::Geo => Stat::GeoDmgBonus,
            Self::Dendro => Stat::DendroDmgBonus,
            Self::Physical => Stat::PhysicalDmgBonus,
        }
    }
}

/// Read access to aggregated stat values.
pub trait StatView {
    /// Current value of `stat`; absent stats read as zero.
    fn get(&self, stat: Stat) -> f64;

    /// `base_atk × (1 + atk%) + flat_atk`
    fn total_atk(&self) -> f64 {
        self.get(Stat::BaseAtk) * (1.0 + self.get(Stat::AtkPercent)) + self.get(Stat::FlatAtk)
    }

    fn total_hp(&self) -> f64 {
        self.get(Stat::BaseHp) * (1.0 + self.get(Stat::HpPercent)) + self.get(Stat::FlatHp)
    }

    fn total_def(&self) -> f64 {
        self.get(Stat::BaseDef) * (1.0 + self.get(Stat::DefPercent)) + self.get(Stat::FlatDef)
    }
}

/// Mapping from stat to additive contribution. Tables combine by per-key sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatTable(BTreeMap<Stat, f64>);

impl StatTable {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Single-entry table.
    #[must_use]
    pub fn of(stat: Stat, value: f64) -> Self {
        Self(BTreeMap::from([(stat, value)]))
    }

    /// Overwrite the value stored for `stat`.
    pub fn set(&mut self, stat: Stat, value: f64) {
        self.0.insert(stat, value);
    }

    /// Add `value` onto whatever is stored for `stat`.
    pub fn add(&mut self, stat: Stat, value: f64) {
        *self.0.entry(stat).or_insert(0.0) += value;
    }

    /// Add every entry of `other` into this table.
    pub fn add_table(&mut self, other: &Self) {
        for (&stat, &value) in &other.0 {
            self.add(stat, value);
        }
    }

    /// New table holding the per-key sum of `self` and `other`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.add_table(other);
        out
    }

    #[must_use]
    pub fn contains(&self, stat: Stat) -> bool {
        self.0.contains_key(&stat)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        self.0.iter().map(|(&stat, &value)| (stat, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl StatView for StatTable {
    fn get(&self, stat: Stat) -> f64 {
        self.0.get(&stat).copied().unwrap_or(0.0)
    }
}

impl FromIterator<(Stat, f64)> for StatTable {
    fn from_iter<I: IntoIterator<Item = (Stat, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (stat, value) in iter {
            table.add(stat, value);
        }
        table
    }
}

impl<const N: usize> From<[(Stat, f64); N]> for StatTable {
    fn from(entries: [(Stat, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}
