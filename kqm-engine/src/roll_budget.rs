//! Roll budget: how many substat rolls remain in total and per stat.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::artifacts::{ArtifactSet, RollQuality, possible_sub_stats};
use crate::constants::{KQMC_FIXED_ROLLS, KQMC_FLUID_ROLLS, KQMC_ROLLS_PER_SLOT};
use crate::numbers::{u32_to_usize, usize_to_u32};
use crate::stats::Stat;

/// Violations of the roll budget contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("{stat} is not a rollable substat")]
    NotASubstat { stat: Stat },
    #[error("cannot commit zero rolls to {stat}")]
    ZeroCount { stat: Stat },
    #[error("requested {requested} rolls of {stat} but only {remaining} rolls remain in total")]
    TotalExhausted {
        stat: Stat,
        requested: u32,
        remaining: u32,
    },
    #[error("requested {requested} rolls of {stat} but its cap leaves {remaining}")]
    StatCapReached {
        stat: Stat,
        requested: u32,
        remaining: u32,
    },
    #[error("no roll of {stat} to undo")]
    NothingToUndo { stat: Stat },
}

/// Rule deciding how many fluid rolls a single substat may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "rolls", rename_all = "snake_case")]
pub enum StatCap {
    /// `rolls` for every equipped slot whose main stat is not the substat.
    PerNonMainSlot(u32),
    /// The same cap for every substat regardless of main stats.
    Uniform(u32),
}

/// Shape of the roll budget handed to each optimization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollConstraints {
    #[serde(default = "RollConstraints::default_total_rolls")]
    pub total_rolls: u32,
    #[serde(default = "RollConstraints::default_stat_cap")]
    pub stat_cap: StatCap,
    /// Rolls every substat receives up front, outside the fluid budget.
    #[serde(default = "RollConstraints::default_fixed_rolls")]
    pub fixed_rolls_per_substat: u32,
    #[serde(default)]
    pub fixed_quality: RollQuality,
}

impl RollConstraints {
    const fn default_total_rolls() -> u32 {
        KQMC_FLUID_ROLLS
    }

    const fn default_stat_cap() -> StatCap {
        StatCap::PerNonMainSlot(KQMC_ROLLS_PER_SLOT)
    }

    const fn default_fixed_rolls() -> u32 {
        KQMC_FIXED_ROLLS
    }

    /// 20 fluid rolls, 2 per non-main slot, 2 fixed average rolls of every substat.
    #[must_use]
    pub const fn kqmc() -> Self {
        Self {
            total_rolls: Self::default_total_rolls(),
            stat_cap: Self::default_stat_cap(),
            fixed_rolls_per_substat: Self::default_fixed_rolls(),
            fixed_quality: RollQuality::Avg,
        }
    }

    /// Flat budget with no fixed baseline.
    #[must_use]
    pub const fn uniform(total_rolls: u32, per_stat: u32) -> Self {
        Self {
            total_rolls,
            stat_cap: StatCap::Uniform(per_stat),
            fixed_rolls_per_substat: 0,
            fixed_quality: RollQuality::Avg,
        }
    }

    /// Fluid-roll cap for `stat` given the main stats in `artifacts`.
    #[must_use]
    pub fn cap_for(&self, stat: Stat, artifacts: &ArtifactSet) -> u32 {
        match self.stat_cap {
            StatCap::PerNonMainSlot(rolls) => {
                rolls.saturating_mul(usize_to_u32(artifacts.slots_without_main(stat)))
            }
            StatCap::Uniform(rolls) => rolls,
        }
    }

    /// Largest fluid cap any substat can have under this rule.
    #[must_use]
    pub const fn max_cap(&self) -> u32 {
        match self.stat_cap {
            StatCap::PerNonMainSlot(rolls) => rolls.saturating_mul(5),
            StatCap::Uniform(rolls) => rolls,
        }
    }
}

impl Default for RollConstraints {
    fn default() -> Self {
        Self::kqmc()
    }
}

/// Counts of committed rolls against a total capacity and per-stat caps.
///
/// Each stat keeps the qualities of its rolls as a stack so `unroll`
/// reverses exactly the most recent roll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollBudget {
    total: u32,
    caps: BTreeMap<Stat, u32>,
    history: BTreeMap<Stat, Vec<RollQuality>>,
}

impl RollBudget {
    /// Budget with `total` capacity; only stats listed in `caps` may be rolled.
    #[must_use]
    pub fn new(total: u32, caps: impl IntoIterator<Item = (Stat, u32)>) -> Self {
        Self {
            total,
            caps: caps.into_iter().collect(),
            history: BTreeMap::new(),
        }
    }

    /// Budget for `constraints` over the main stats in `artifacts`.
    #[must_use]
    pub fn for_artifacts(constraints: &RollConstraints, artifacts: &ArtifactSet) -> Self {
        Self::new(
            constraints.total_rolls,
            possible_sub_stats().map(|stat| (stat, constraints.cap_for(stat, artifacts))),
        )
    }

    /// Commit `count` rolls of `stat` at `quality`.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when `stat` is not rollable, `count`
    /// is zero, or either the total or the per-stat capacity is below `count`.
    pub fn roll(&mut self, stat: Stat, quality: RollQuality, count: u32) -> Result<(), BudgetError> {
        self.check(stat, count)?;
        self.history
            .entry(stat)
            .or_default()
            .extend(std::iter::repeat_n(quality, u32_to_usize(count)));
        Ok(())
    }

    /// Validate that `count` rolls of `stat` would fit.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RollBudget::roll`].
    pub fn check(&self, stat: Stat, count: u32) -> Result<(), BudgetError> {
        if !self.caps.contains_key(&stat) {
            return Err(BudgetError::NotASubstat { stat });
        }
        if count == 0 {
            return Err(BudgetError::ZeroCount { stat });
        }
        let remaining = self.rolls_remaining();
        if count > remaining {
            return Err(BudgetError::TotalExhausted {
                stat,
                requested: count,
                remaining,
            });
        }
        let remaining = self.rolls_remaining_for(stat);
        if count > remaining {
            return Err(BudgetError::StatCapReached {
                stat,
                requested: count,
                remaining,
            });
        }
        Ok(())
    }

    /// Undo the most recent roll of `stat`, returning its quality.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NothingToUndo` when `stat` has no committed rolls.
    pub fn unroll(&mut self, stat: Stat) -> Result<RollQuality, BudgetError> {
        let stack = self
            .history
            .get_mut(&stat)
            .ok_or(BudgetError::NothingToUndo { stat })?;
        let quality = stack.pop().ok_or(BudgetError::NothingToUndo { stat })?;
        if stack.is_empty() {
            self.history.remove(&stat);
        }
        Ok(quality)
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Rolls committed across all stats.
    #[must_use]
    pub fn committed(&self) -> u32 {
        self.history.values().map(|rolls| usize_to_u32(rolls.len())).sum()
    }

    #[must_use]
    pub fn rolls_remaining(&self) -> u32 {
        self.total.saturating_sub(self.committed())
    }

    /// Per-stat capacity left, ignoring the total.
    #[must_use]
    pub fn rolls_remaining_for(&self, stat: Stat) -> u32 {
        self.cap(stat).saturating_sub(self.rolls_for(stat))
    }

    #[must_use]
    pub fn rolls_for(&self, stat: Stat) -> u32 {
        self.history
            .get(&stat)
            .map_or(0, |rolls| usize_to_u32(rolls.len()))
    }

    #[must_use]
    pub fn cap(&self, stat: Stat) -> u32 {
        self.caps.get(&stat).copied().unwrap_or(0)
    }

    /// Qualities of the rolls committed to `stat`, oldest first.
    #[must_use]
    pub fn history(&self, stat: Stat) -> &[RollQuality] {
        self.history.get(&stat).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stats with at least one roll, with their roll histories.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, &[RollQuality])> {
        self.history
            .iter()
            .map(|(&stat, rolls)| (stat, rolls.as_slice()))
    }
}
