//! Energy recharge pre-fill run before free substat allocation.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::artifacts::{RollQuality, main_stat_value, sub_stat_value};
use crate::builder::ArtifactBuilder;
use crate::character::Character;
use crate::config::OptimizerConfig;
use crate::constants::LOG_GATE;
use crate::error::OptimizeError;
use crate::roll_budget::{BudgetError, RollConstraints};
use crate::stats::{Stat, StatTable, StatView};

/// How the pre-fill treats the per-stat roll cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Check the ceiling up front and stop cleanly when capacity runs out.
    #[default]
    Capped,
    /// Keep rolling until the budget itself refuses.
    Unbounded,
}

/// Forces energy recharge up to `requirement` before anything else is rolled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyGate {
    pub requirement: f64,
    pub policy: GatePolicy,
    pub quality: RollQuality,
}

impl EnergyGate {
    #[must_use]
    pub const fn new(requirement: f64, quality: RollQuality) -> Self {
        Self {
            requirement,
            policy: GatePolicy::Capped,
            quality,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Energy recharge with the builder's current substats on top of `anchor`.
    #[must_use]
    pub fn current(anchor: &StatTable, builder: &ArtifactBuilder) -> f64 {
        anchor.get(Stat::EnergyRecharge) + builder.substats().get(Stat::EnergyRecharge)
    }

    /// Best energy recharge this builder could still reach.
    #[must_use]
    pub fn ceiling(anchor: &StatTable, builder: &ArtifactBuilder) -> f64 {
        let remaining = f64::from(builder.rolls_remaining_for(Stat::EnergyRecharge));
        Self::current(anchor, builder)
            + remaining * builder.roll_value(Stat::EnergyRecharge, RollQuality::best())
    }

    /// Roll energy recharge until the requirement is met.
    ///
    /// Returns the number of rolls committed.
    ///
    /// # Errors
    ///
    /// Under `Capped`, returns `ConstraintInfeasible` without rolling when the
    /// requirement is above [`EnergyGate::ceiling`], and `AllocationExhausted`
    /// when capacity runs out at the planned quality. Under `Unbounded`, a
    /// roll refused by the budget becomes `ConstraintInfeasible`.
    pub fn prefill(
        &self,
        anchor: &StatTable,
        builder: &mut ArtifactBuilder,
    ) -> Result<u32, OptimizeError> {
        match self.policy {
            GatePolicy::Capped => self.prefill_capped(anchor, builder),
            GatePolicy::Unbounded => self.prefill_unbounded(anchor, builder),
        }
    }

    fn prefill_capped(
        &self,
        anchor: &StatTable,
        builder: &mut ArtifactBuilder,
    ) -> Result<u32, OptimizeError> {
        let ceiling = Self::ceiling(anchor, builder);
        if self.requirement > ceiling {
            debug!(
                target: LOG_GATE,
                "requirement {:.3} above ceiling {ceiling:.3}", self.requirement
            );
            return Err(OptimizeError::ConstraintInfeasible {
                required: self.requirement,
                best: ceiling,
            });
        }
        let mut rolls = 0;
        let mut reached = Self::current(anchor, builder);
        while reached < self.requirement {
            if builder.rolls_remaining() == 0
                || builder.rolls_remaining_for(Stat::EnergyRecharge) == 0
            {
                debug!(
                    target: LOG_GATE,
                    "capacity exhausted after {rolls} rolls at {reached:.3}"
                );
                return Err(OptimizeError::AllocationExhausted {
                    stat: Stat::EnergyRecharge,
                    reached,
                    required: self.requirement,
                });
            }
            builder.roll(Stat::EnergyRecharge, self.quality, 1)?;
            rolls += 1;
            reached = Self::current(anchor, builder);
        }
        debug!(target: LOG_GATE, "prefilled {rolls} rolls, reached {reached:.3}");
        Ok(rolls)
    }

    fn prefill_unbounded(
        &self,
        anchor: &StatTable,
        builder: &mut ArtifactBuilder,
    ) -> Result<u32, OptimizeError> {
        let mut rolls = 0;
        let mut reached = Self::current(anchor, builder);
        while reached < self.requirement {
            match builder.roll(Stat::EnergyRecharge, self.quality, 1) {
                Ok(()) => {}
                Err(BudgetError::StatCapReached { .. } | BudgetError::TotalExhausted { .. }) => {
                    debug!(
                        target: LOG_GATE,
                        "budget refused roll {} at {reached:.3}",
                        rolls + 1
                    );
                    return Err(OptimizeError::ConstraintInfeasible {
                        required: self.requirement,
                        best: reached,
                    });
                }
                Err(err) => return Err(err.into()),
            }
            rolls += 1;
            reached = Self::current(anchor, builder);
        }
        debug!(target: LOG_GATE, "prefilled {rolls} rolls, reached {reached:.3}");
        Ok(rolls)
    }
}

/// Upper bound on energy recharge for any main-stat combination.
///
/// `base` is everything outside the artifacts (character and weapon). The
/// bound assumes an energy recharge sands and every fixed and fluid roll the
/// constraints allow landing on energy recharge at max quality.
#[must_use]
pub fn theoretical_ceiling(
    base: &StatTable,
    rarity: u8,
    level: u8,
    constraints: &RollConstraints,
) -> f64 {
    let main = main_stat_value(rarity, level, Stat::EnergyRecharge).unwrap_or(0.0);
    let per_roll = sub_stat_value(rarity, Stat::EnergyRecharge).unwrap_or(0.0)
        * RollQuality::best().multiplier();
    let rolls = constraints
        .fixed_rolls_per_substat
        .saturating_add(constraints.max_cap());
    base.get(Stat::EnergyRecharge) + main + f64::from(rolls) * per_roll
}

/// Outcome of planning energy recharge for the gear a character already wears.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatePlan {
    pub requirement: f64,
    pub policy: GatePolicy,
    /// Energy recharge before any fluid roll.
    pub starting: f64,
    pub ceiling: f64,
    pub rolls: u32,
    pub reached: f64,
    pub rolls_left: u32,
}

/// Count the energy recharge rolls `character`'s current main stats need.
///
/// Uses `config.gate_policy`; the character is not modified.
///
/// # Errors
///
/// Returns `OptimizeError::Config` for invalid configuration, or the gate's
/// own failure when the requirement cannot be met.
pub fn plan_energy(
    character: &Character,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<GatePlan, OptimizeError> {
    config.validate()?;
    let anchor = character.stats_without_substats();
    let mut builder = ArtifactBuilder::for_character(character, config.rarity, config.constraints);
    let starting = EnergyGate::current(&anchor, &builder);
    let ceiling = EnergyGate::ceiling(&anchor, &builder);
    let gate = EnergyGate::new(requirement, config.quality).with_policy(config.gate_policy);
    let rolls = gate.prefill(&anchor, &mut builder)?;
    Ok(GatePlan {
        requirement,
        policy: config.gate_policy,
        starting,
        ceiling,
        rolls,
        reached: EnergyGate::current(&anchor, &builder),
        rolls_left: builder.rolls_remaining(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{Artifact, ArtifactSet, ArtifactSlot};

    fn pieces(sands: Stat) -> ArtifactSet {
        let mut set = ArtifactSet::new();
        set.equip(Artifact::flower(5, 20).unwrap());
        set.equip(Artifact::feather(5, 20).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Sands, 5, 20, sands).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Goblet, 5, 20, Stat::ElectroDmgBonus).unwrap());
        set.equip(Artifact::new(ArtifactSlot::Circlet, 5, 20, Stat::CritRate).unwrap());
        set
    }

    fn flat_budget() -> ArtifactBuilder {
        ArtifactBuilder::with_constraints(pieces(Stat::AtkPercent), 5, RollConstraints::uniform(8, 8))
    }

    #[test]
    fn unreachable_requirement_fails_before_rolling() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        let gate = EnergyGate::new(2.0, RollQuality::Max);
        let err = gate.prefill(&anchor, &mut builder).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::ConstraintInfeasible { required, best }
                if (required - 2.0).abs() < 1e-12 && (best - (1.0 + 8.0 * 0.0648)).abs() < 1e-9
        ));
        assert_eq!(builder.rolls_for(Stat::EnergyRecharge), 0);
    }

    #[test]
    fn capped_prefill_stops_at_requirement() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        let gate = EnergyGate::new(1.3, RollQuality::Avg);
        let rolls = gate.prefill(&anchor, &mut builder).unwrap();
        // 0.3 / (0.0648 * 0.85) = 5.45 rolls
        assert_eq!(rolls, 6);
        assert_eq!(builder.rolls_for(Stat::EnergyRecharge), 6);
        assert!(EnergyGate::current(&anchor, &builder) >= 1.3);
    }

    #[test]
    fn capped_prefill_reports_exhaustion_below_ceiling() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        // Reachable at max quality (1.518) but not at low quality (1.363).
        let gate = EnergyGate::new(1.45, RollQuality::Low);
        let err = gate.prefill(&anchor, &mut builder).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::AllocationExhausted {
                stat: Stat::EnergyRecharge,
                ..
            }
        ));
        assert_eq!(builder.rolls_for(Stat::EnergyRecharge), 8);
    }

    #[test]
    fn unbounded_prefill_fails_infeasible_when_budget_refuses() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        let gate = EnergyGate::new(2.0, RollQuality::Avg).with_policy(GatePolicy::Unbounded);
        let err = gate.prefill(&anchor, &mut builder).unwrap_err();
        assert!(matches!(err, OptimizeError::ConstraintInfeasible { .. }));
        assert_eq!(builder.rolls_for(Stat::EnergyRecharge), 8);
    }

    #[test]
    fn unbounded_prefill_rolls_until_requirement_met() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        let gate = EnergyGate::new(1.3, RollQuality::Avg).with_policy(GatePolicy::Unbounded);
        assert_eq!(gate.prefill(&anchor, &mut builder), Ok(6));
        assert_eq!(builder.rolls_for(Stat::EnergyRecharge), 6);
        assert!(EnergyGate::current(&anchor, &builder) >= 1.3);
    }

    #[test]
    fn unbounded_prefill_reports_reach_when_low_rolls_fall_short() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.0);
        let mut builder = flat_budget();
        let gate = EnergyGate::new(1.45, RollQuality::Low).with_policy(GatePolicy::Unbounded);
        let err = gate.prefill(&anchor, &mut builder).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::ConstraintInfeasible { best, .. }
                if (best - (1.0 + 8.0 * 0.0648 * 0.7)).abs() < 1e-9
        ));
    }

    #[test]
    fn plan_energy_follows_unbounded_policy() {
        let mut c = Character::new("Planner", 90, StatTable::of(Stat::EnergyRecharge, 1.0));
        for piece in pieces(Stat::AtkPercent).iter() {
            c.equip(*piece);
        }
        let config = OptimizerConfig {
            gate_policy: GatePolicy::Unbounded,
            constraints: RollConstraints::uniform(8, 8),
            ..OptimizerConfig::default()
        };
        let plan = plan_energy(&c, 1.3, &config).unwrap();
        assert_eq!(plan.policy, GatePolicy::Unbounded);
        assert_eq!(plan.rolls, 6);
        assert_eq!(plan.rolls_left, 2);
        assert!(plan.reached >= 1.3);

        let err = plan_energy(&c, 2.0, &config).unwrap_err();
        assert!(matches!(err, OptimizeError::ConstraintInfeasible { .. }));
    }

    #[test]
    fn met_requirement_needs_no_rolls() {
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.6);
        let mut builder = flat_budget();
        for policy in [GatePolicy::Capped, GatePolicy::Unbounded] {
            let gate = EnergyGate::new(1.5, RollQuality::Avg).with_policy(policy);
            assert_eq!(gate.prefill(&anchor, &mut builder), Ok(0));
        }
    }

    #[test]
    fn energy_sands_lowers_the_per_stat_cap() {
        let builder = ArtifactBuilder::kqmc(pieces(Stat::EnergyRecharge));
        let anchor = StatTable::of(Stat::EnergyRecharge, 1.518);
        let fixed = 2.0 * 0.0648 * 0.85;
        let expected = 1.518 + fixed + 8.0 * 0.0648;
        assert!((EnergyGate::ceiling(&anchor, &builder) - expected).abs() < 1e-9);
    }

    #[test]
    fn theoretical_ceiling_uses_best_main_and_max_rolls() {
        let base = StatTable::of(Stat::EnergyRecharge, 1.0);
        let ceiling = theoretical_ceiling(&base, 5, 20, &RollConstraints::kqmc());
        assert!((ceiling - (1.0 + 0.518 + 12.0 * 0.0648)).abs() < 1e-9);
    }

    #[test]
    fn plan_energy_leaves_character_untouched() {
        let mut c = Character::new("Planner", 90, StatTable::of(Stat::EnergyRecharge, 1.0));
        for piece in pieces(Stat::EnergyRecharge).iter() {
            c.equip(*piece);
        }
        let before = c.clone();
        let plan = plan_energy(&c, 1.8, &OptimizerConfig::default()).unwrap();
        assert_eq!(c, before);
        assert!(plan.reached >= 1.8);
        assert_eq!(plan.rolls_left, 20 - plan.rolls);
        assert!((plan.starting - (1.518 + 2.0 * 0.0648 * 0.85)).abs() < 1e-9);
    }
}
