//! The scalar objective the optimizer maximizes.
use serde::{Deserialize, Serialize};

use crate::damage::{Enemy, avg_crit_multiplier, def_multiplier, res_multiplier};
use crate::stats::{Element, Stat, StatTable, StatView};

/// Pure, deterministic scoring of a buffed stat snapshot.
///
/// The optimizer evaluates the objective many times per run and assumes two
/// evaluations of the same table return the same score.
pub trait Objective {
    fn evaluate(&self, stats: &StatTable) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&StatTable) -> f64,
{
    fn evaluate(&self, stats: &StatTable) -> f64 {
        self(stats)
    }
}

/// Which total a hit scales off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    #[default]
    Atk,
    Hp,
    Def,
    ElementalMastery,
}

impl Scaling {
    fn total(self, stats: &StatTable) -> f64 {
        match self {
            Self::Atk => stats.total_atk(),
            Self::Hp => stats.total_hp(),
            Self::Def => stats.total_def(),
            Self::ElementalMastery => stats.get(Stat::ElementalMastery),
        }
    }
}

/// Talent category; selects which talent-specific bonus applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentKind {
    NormalAttack,
    ChargedAttack,
    PlungeAttack,
    Skill,
    Burst,
    /// Transformative or unclassified damage with no talent bonus.
    Other,
}

impl TalentKind {
    const fn bonus_stat(self) -> Option<Stat> {
        match self {
            Self::NormalAttack => Some(Stat::NormalAttackDmgBonus),
            Self::ChargedAttack => Some(Stat::ChargedAttackDmgBonus),
            Self::PlungeAttack => Some(Stat::PlungeAttackDmgBonus),
            Self::Skill => Some(Stat::SkillDmgBonus),
            Self::Burst => Some(Stat::BurstDmgBonus),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInstance {
    pub name: String,
    /// Talent multiplier, e.g. 2.5 for a 250% hit.
    pub motion_value: f64,
    #[serde(default)]
    pub scaling: Scaling,
    pub element: Element,
    pub kind: TalentKind,
    #[serde(default = "DamageInstance::default_hits")]
    pub hits: f64,
    /// Bonuses that apply to this instance only.
    #[serde(default)]
    pub buffs: StatTable,
}

impl DamageInstance {
    const fn default_hits() -> f64 {
        1.0
    }

    #[must_use]
    pub fn new(
        name: impl Into<String>,
        motion_value: f64,
        element: Element,
        kind: TalentKind,
    ) -> Self {
        Self {
            name: name.into(),
            motion_value,
            scaling: Scaling::Atk,
            element,
            kind,
            hits: Self::default_hits(),
            buffs: StatTable::new(),
        }
    }

    #[must_use]
    pub const fn with_hits(mut self, hits: f64) -> Self {
        self.hits = hits;
        self
    }

    #[must_use]
    pub const fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Expected damage of this instance for the given snapshot.
    #[must_use]
    pub fn damage(&self, stats: &StatTable, character_level: u32, enemy: &Enemy) -> f64 {
        let stats = if self.buffs.is_empty() {
            std::borrow::Cow::Borrowed(stats)
        } else {
            std::borrow::Cow::Owned(stats.merged(&self.buffs))
        };
        let talent_bonus = self.kind.bonus_stat().map_or(0.0, |stat| stats.get(stat));
        let dmg_bonus = 1.0
            + stats.get(Stat::DmgBonus)
            + stats.get(self.element.dmg_bonus_stat())
            + talent_bonus;
        let base = self.motion_value * self.scaling.total(&stats) * self.hits;
        base * dmg_bonus
            * avg_crit_multiplier(stats.get(Stat::CritRate), stats.get(Stat::CritDmg))
            * def_multiplier(
                character_level,
                enemy,
                stats.get(Stat::DefReduction),
                stats.get(Stat::DefIgnore),
            )
            * res_multiplier(enemy.resistance)
    }
}

/// A damage sequence; scores a snapshot as expected damage per rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default = "Rotation::default_level")]
    pub character_level: u32,
    #[serde(default)]
    pub enemy: Enemy,
    pub instances: Vec<DamageInstance>,
}

impl Rotation {
    const fn default_level() -> u32 {
        90
    }

    #[must_use]
    pub fn new(character_level: u32) -> Self {
        Self {
            character_level,
            enemy: Enemy::kqmc(),
            instances: Vec::new(),
        }
    }

    #[must_use]
    pub fn add(mut self, instance: DamageInstance) -> Self {
        self.instances.push(instance);
        self
    }

    /// Per-instance damage breakdown, in rotation order.
    #[must_use]
    pub fn breakdown(&self, stats: &StatTable) -> Vec<(String, f64)> {
        self.instances
            .iter()
            .map(|hit| {
                (
                    hit.name.clone(),
                    hit.damage(stats, self.character_level, &self.enemy),
                )
            })
            .collect()
    }
}

impl Objective for Rotation {
    fn evaluate(&self, stats: &StatTable) -> f64 {
        let total: f64 = self
            .instances
            .iter()
            .map(|hit| hit.damage(stats, self.character_level, &self.enemy))
            .sum();
        total.max(0.0)
    }
}
