//! Artifact builder: five main stats plus a roll budget of substats.
use serde::Serialize;

use crate::artifacts::{ArtifactSet, ArtifactSlot, RollQuality, possible_sub_stats, sub_stat_value};
use crate::character::Character;
use crate::constants::DEFAULT_RARITY;
use crate::roll_budget::{BudgetError, RollBudget, RollConstraints};
use crate::stats::{Stat, StatTable};

/// Gear-stat accumulator for one optimization attempt.
///
/// The substat table is always recomputed from the roll counters, so a
/// `roll` followed by `unroll` of the same stat leaves `substats()`
/// bit-for-bit unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactBuilder {
    rarity: u8,
    artifacts: ArtifactSet,
    constraints: RollConstraints,
    budget: RollBudget,
}

impl ArtifactBuilder {
    #[must_use]
    pub fn with_constraints(artifacts: ArtifactSet, rarity: u8, constraints: RollConstraints) -> Self {
        let budget = RollBudget::for_artifacts(&constraints, &artifacts);
        Self {
            rarity,
            artifacts,
            constraints,
            budget,
        }
    }

    /// Five-star builder under the standard KQM roll budget.
    #[must_use]
    pub fn kqmc(artifacts: ArtifactSet) -> Self {
        Self::with_constraints(artifacts, DEFAULT_RARITY, RollConstraints::kqmc())
    }

    /// Builder over whatever main stats `character` currently has equipped.
    #[must_use]
    pub fn for_character(character: &Character, rarity: u8, constraints: RollConstraints) -> Self {
        Self::with_constraints(character.artifacts.clone(), rarity, constraints)
    }

    #[must_use]
    pub const fn rarity(&self) -> u8 {
        self.rarity
    }

    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    #[must_use]
    pub const fn constraints(&self) -> &RollConstraints {
        &self.constraints
    }

    #[must_use]
    pub const fn budget(&self) -> &RollBudget {
        &self.budget
    }

    /// Main stat of the piece in `slot`, if one is equipped.
    #[must_use]
    pub fn main_stat(&self, slot: ArtifactSlot) -> Option<Stat> {
        self.artifacts.get(slot).map(|artifact| artifact.main_stat)
    }

    /// Substats this builder can still take at least one fluid roll of, in
    /// declaration order.
    pub fn possible_sub_stats(&self) -> impl Iterator<Item = Stat> + '_ {
        possible_sub_stats().filter(|&stat| self.budget.rolls_remaining_for(stat) > 0)
    }

    /// Value one roll of `stat` adds at `quality`.
    #[must_use]
    pub fn roll_value(&self, stat: Stat, quality: RollQuality) -> f64 {
        sub_stat_value(self.rarity, stat).unwrap_or(0.0) * quality.multiplier()
    }

    /// Commit `count` rolls of `stat`.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError` when total or per-stat capacity is below `count`.
    pub fn roll(&mut self, stat: Stat, quality: RollQuality, count: u32) -> Result<(), BudgetError> {
        self.budget.roll(stat, quality, count)
    }

    /// Undo the most recent roll of `stat`.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NothingToUndo` when `stat` has no fluid rolls.
    pub fn unroll(&mut self, stat: Stat) -> Result<RollQuality, BudgetError> {
        self.budget.unroll(stat)
    }

    #[must_use]
    pub fn rolls_remaining(&self) -> u32 {
        self.budget.rolls_remaining()
    }

    #[must_use]
    pub fn rolls_remaining_for(&self, stat: Stat) -> u32 {
        self.budget.rolls_remaining_for(stat)
    }

    #[must_use]
    pub fn rolls_for(&self, stat: Stat) -> u32 {
        self.budget.rolls_for(stat)
    }

    /// Contribution of the fixed per-substat rolls.
    #[must_use]
    pub fn fixed_substats(&self) -> StatTable {
        let fixed = self.constraints.fixed_rolls_per_substat;
        if fixed == 0 {
            return StatTable::new();
        }
        possible_sub_stats()
            .map(|stat| {
                (
                    stat,
                    f64::from(fixed) * self.roll_value(stat, self.constraints.fixed_quality),
                )
            })
            .collect()
    }

    /// Aggregated substats: fixed baseline plus every committed fluid roll.
    #[must_use]
    pub fn substats(&self) -> StatTable {
        let mut table = self.fixed_substats();
        for (stat, rolls) in self.budget.iter() {
            for &quality in rolls {
                table.add(stat, self.roll_value(stat, quality));
            }
        }
        table
    }

    /// Substats as they would be after rolling `stat` `count` times.
    ///
    /// Leaves `self` untouched.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError` when the rolls would not fit the budget.
    pub fn preview(
        &self,
        stat: Stat,
        quality: RollQuality,
        count: u32,
    ) -> Result<StatTable, BudgetError> {
        let mut scratch = self.clone();
        scratch.roll(stat, quality, count)?;
        Ok(scratch.substats())
    }

    /// Equip the builder's main stats and substats onto `character`.
    pub fn apply_to(&self, character: &mut Character) {
        character.unequip_all_artifacts();
        for artifact in self.artifacts.iter() {
            character.equip(*artifact);
        }
        character.set_substats(self.substats());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::Artifact;
    use crate::stats::StatView;

    fn kqmc_set() -> ArtifactSet {
        let mut set = ArtifactSet::new();
        set.equip(Artifact::flower(5, 20).unwrap());
        set.equip(Artifact::feather(5, 20).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Sands, 5, 20, Stat::AtkPercent).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Goblet, 5, 20, Stat::PyroDmgBonus).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Circlet, 5, 20, Stat::CritDmg).unwrap());
        set
    }

    #[test]
    fn fixed_baseline_is_two_average_rolls_of_each_substat() {
        let bob = ArtifactBuilder::kqmc(kqmc_set());
        let subs = bob.substats();
        assert_eq!(subs.len(), 10);
        assert!((subs.get(Stat::CritRate) - 2.0 * 0.0389 * 0.85).abs() < 1e-12);
        assert!((subs.get(Stat::FlatHp) - 2.0 * 298.75 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn roll_then_unroll_is_an_exact_inverse() {
        let mut bob = ArtifactBuilder::kqmc(kqmc_set());
        bob.roll(Stat::CritRate, RollQuality::Avg, 3).unwrap();
        let before = bob.substats();
        let budget_before = bob.budget().clone();
        bob.roll(Stat::EnergyRecharge, RollQuality::High, 1).unwrap();
        bob.unroll(Stat::EnergyRecharge).unwrap();
        assert_eq!(bob.substats(), before);
        assert_eq!(bob.budget(), &budget_before);
    }

    #[test]
    fn preview_matches_commit_and_leaves_builder_alone() {
        let mut bob = ArtifactBuilder::kqmc(kqmc_set());
        let snapshot = bob.clone();
        let preview = bob.preview(Stat::CritRate, RollQuality::Avg, 4).unwrap();
        assert_eq!(bob, snapshot);
        bob.roll(Stat::CritRate, RollQuality::Avg, 4).unwrap();
        assert_eq!(bob.substats(), preview);
    }

    #[test]
    fn circlet_main_stat_shrinks_that_substat_cap() {
        let bob = ArtifactBuilder::kqmc(kqmc_set());
        assert_eq!(bob.rolls_remaining_for(Stat::CritDmg), 8);
        assert_eq!(bob.rolls_remaining_for(Stat::CritRate), 10);
        assert_eq!(bob.rolls_remaining(), 20);
        assert_eq!(bob.main_stat(ArtifactSlot::Circlet), Some(Stat::CritDmg));
    }

    #[test]
    fn possible_sub_stats_skip_exhausted_caps() {
        let mut bob = ArtifactBuilder::with_constraints(kqmc_set(), 5, RollConstraints::uniform(6, 2));
        bob.roll(Stat::AtkPercent, RollQuality::Avg, 2).unwrap();
        let stats: Vec<Stat> = bob.possible_sub_stats().collect();
        assert_eq!(stats.len(), 9);
        assert!(!stats.contains(&Stat::AtkPercent));
        assert_eq!(stats.first(), Some(&Stat::FlatAtk));
    }

    #[test]
    fn apply_to_overwrites_character_gear() {
        let mut bob = ArtifactBuilder::with_constraints(kqmc_set(), 5, RollConstraints::uniform(4, 4));
        bob.roll(Stat::CritRate, RollQuality::Max, 2).unwrap();
        let mut c = Character::new("Target", 90, StatTable::of(Stat::CritRate, 0.05));
        c.set_substats(StatTable::of(Stat::ElementalMastery, 500.0));
        bob.apply_to(&mut c);
        assert!(c.get(Stat::ElementalMastery).abs() < f64::EPSILON);
        assert!((c.get(Stat::CritRate) - (0.05 + 2.0 * 0.0389)).abs() < 1e-12);
        assert!((c.get(Stat::PyroDmgBonus) - 0.466).abs() < 1e-12);
    }
}
