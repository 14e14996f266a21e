//! Greedy substat allocators.
//!
//! Both variants run the capped energy gate first, then hill-climb: each
//! iteration previews one extra roll of every candidate substat, scores the
//! hypothetical table, and commits to the best. Probing never touches the
//! builder; only the chosen candidate is rolled.
//!
//! A candidate whose preview scores the same as the current state is dropped
//! from the pool for the rest of the run, even if later rolls elsewhere would
//! make it worth something again.
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::artifacts::{RollQuality, SUB_STATS};
use crate::builder::ArtifactBuilder;
use crate::constants::{LOG_ALLOCATOR, ZERO_GAIN_TOLERANCE};
use crate::energy_gate::EnergyGate;
use crate::error::OptimizeError;
use crate::numbers::approx_eq;
use crate::rotation::Objective;
use crate::stats::{Stat, StatTable};

type CandidatePool = SmallVec<[Stat; SUB_STATS.len()]>;

/// Which greedy variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    /// Commit the winner up to its remaining capacity in one step.
    #[default]
    Fill,
    /// Commit one roll per iteration.
    SingleRoll,
}

impl AllocatorKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::SingleRoll => "single-roll",
        }
    }
}

/// One committed allocator decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationStep {
    pub stat: Stat,
    pub rolls: u32,
    /// Objective score right after the rolls were committed.
    pub score: f64,
}

/// What an allocator run did, for reporting and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationTrace {
    /// Energy recharge rolls committed by the gate.
    pub gate_rolls: u32,
    /// Score once the gate finished, before any free roll.
    pub gate_score: f64,
    pub steps: Vec<AllocationStep>,
    /// Objective evaluations spent on previews.
    pub probes: usize,
    /// Candidates dropped for showing no marginal gain, in drop order.
    pub pruned: Vec<Stat>,
}

impl AllocationTrace {
    /// Score after the last committed step.
    #[must_use]
    pub fn final_score(&self) -> f64 {
        self.steps.last().map_or(self.gate_score, |step| step.score)
    }
}

fn score<O>(objective: &O, anchor: &StatTable, substats: &StatTable) -> f64
where
    O: Objective + ?Sized,
{
    objective.evaluate(&anchor.merged(substats))
}

/// Run the chosen greedy variant.
///
/// `anchor` is the buffed table without substats, i.e. character, weapon,
/// and the builder's main stats.
///
/// # Errors
///
/// Returns the gate's `ConstraintInfeasible` or `AllocationExhausted` when
/// `requirement` cannot be met with this builder, and `Budget` if a commit
/// breaks the roll budget contract.
pub fn allocate<O>(
    kind: AllocatorKind,
    anchor: &StatTable,
    builder: &mut ArtifactBuilder,
    objective: &O,
    requirement: f64,
    quality: RollQuality,
) -> Result<AllocationTrace, OptimizeError>
where
    O: Objective + ?Sized,
{
    let gate_rolls = EnergyGate::new(requirement, quality).prefill(anchor, builder)?;
    let mut trace = AllocationTrace {
        gate_rolls,
        gate_score: score(objective, anchor, &builder.substats()),
        ..AllocationTrace::default()
    };
    let mut pool: CandidatePool = builder.possible_sub_stats().collect();

    while builder.rolls_remaining() > 0 {
        pool.retain(|stat| builder.rolls_remaining_for(*stat) > 0);
        if pool.is_empty() {
            break;
        }
        let baseline = score(objective, anchor, &builder.substats());
        let mut best: Option<(Stat, f64)> = None;
        let mut flat = CandidatePool::new();
        for &stat in &pool {
            let preview = builder.preview(stat, quality, 1)?;
            trace.probes += 1;
            let probed = score(objective, anchor, &preview);
            if approx_eq(probed, baseline, ZERO_GAIN_TOLERANCE) {
                flat.push(stat);
            }
            // Strict comparison keeps the earliest stat on ties.
            if best.is_none_or(|(_, top)| probed > top) {
                best = Some((stat, probed));
            }
        }
        let Some((stat, _)) = best else {
            break;
        };
        if !flat.is_empty() {
            debug!(target: LOG_ALLOCATOR, "pruning {flat:?} (no gain over {baseline:.2})");
            pool.retain(|candidate| !flat.contains(candidate));
            trace.pruned.extend(flat);
        }

        let rolls = match kind {
            AllocatorKind::SingleRoll => 1,
            AllocatorKind::Fill => builder
                .rolls_remaining()
                .min(builder.rolls_remaining_for(stat)),
        };
        builder.roll(stat, quality, rolls)?;
        let after = score(objective, anchor, &builder.substats());
        debug!(target: LOG_ALLOCATOR, "{} x{rolls} -> {after:.2}", stat.key());
        trace.steps.push(AllocationStep {
            stat,
            rolls,
            score: after,
        });
    }
    Ok(trace)
}

/// Single-roll greedy: one roll per iteration.
///
/// # Errors
///
/// See [`allocate`].
pub fn allocate_single_roll<O>(
    anchor: &StatTable,
    builder: &mut ArtifactBuilder,
    objective: &O,
    requirement: f64,
    quality: RollQuality,
) -> Result<AllocationTrace, OptimizeError>
where
    O: Objective + ?Sized,
{
    allocate(
        AllocatorKind::SingleRoll,
        anchor,
        builder,
        objective,
        requirement,
        quality,
    )
}

/// Fill greedy: the iteration's winner takes every roll it can hold.
///
/// # Errors
///
/// See [`allocate`].
pub fn allocate_fill<O>(
    anchor: &StatTable,
    builder: &mut ArtifactBuilder,
    objective: &O,
    requirement: f64,
    quality: RollQuality,
) -> Result<AllocationTrace, OptimizeError>
where
    O: Objective + ?Sized,
{
    allocate(
        AllocatorKind::Fill,
        anchor,
        builder,
        objective,
        requirement,
        quality,
    )
}
