//! Main-stat searches wrapping the substat allocators.
use log::{debug, info, warn};
use serde::Serialize;
use smallvec::SmallVec;

use crate::allocator::{AllocationTrace, allocate};
use crate::artifacts::{Artifact, ArtifactSet, ArtifactSlot};
use crate::builder::ArtifactBuilder;
use crate::character::{Character, Weapon};
use crate::config::OptimizerConfig;
use crate::constants::{LOG_SEARCH, MAIN_STAT_PROBE_VALUE};
use crate::energy_gate::theoretical_ceiling;
use crate::error::OptimizeError;
use crate::rotation::Objective;
use crate::stats::{Stat, StatTable, StatView};

/// Candidate main stats for one configurable slot.
pub type CandidateList = SmallVec<[Stat; 12]>;

/// Per-slot outcome of the marginal-value filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotCandidates {
    pub slot: ArtifactSlot,
    pub kept: CandidateList,
    /// Stats the filter rejected, even when `fallback` put them back.
    pub pruned: CandidateList,
    /// Set when nothing passed the filter and `kept` is the full allowlist.
    pub fallback: bool,
}

/// Main stats chosen for the three configurable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MainStatCombination {
    pub sands: Stat,
    pub goblet: Stat,
    pub circlet: Stat,
}

impl MainStatCombination {
    fn pieces(self, rarity: u8, level: u8) -> Result<[Artifact; 3], OptimizeError> {
        Ok([
            Artifact::new(ArtifactSlot::Sands, rarity, level, self.sands)?,
            Artifact::new(ArtifactSlot::Goblet, rarity, level, self.goblet)?,
            Artifact::new(ArtifactSlot::Circlet, rarity, level, self.circlet)?,
        ])
    }
}

impl std::fmt::Display for MainStatCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.sands, self.goblet, self.circlet)
    }
}

/// Result of evaluating one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CombinationOutcome {
    Scored { score: f64, energy_recharge: f64 },
    BelowRequirement { energy_recharge: f64 },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationReport {
    pub combination: MainStatCombination,
    pub outcome: CombinationOutcome,
}

/// A finished allocation: the gear plus how it scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub builder: ArtifactBuilder,
    pub score: f64,
    pub energy_recharge: f64,
    pub trace: AllocationTrace,
}

/// Everything the full main-stat search looked at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub requirement: f64,
    pub ceiling: f64,
    /// Score of the character with only flower and feather equipped.
    pub baseline: f64,
    pub candidates: Vec<SlotCandidates>,
    pub combinations: Vec<CombinationReport>,
    pub winner: MainStatCombination,
    pub best: Allocation,
}

impl SearchReport {
    /// Combinations that met the requirement and were scored.
    #[must_use]
    pub fn feasible(&self) -> usize {
        self.combinations
            .iter()
            .filter(|report| matches!(report.outcome, CombinationOutcome::Scored { .. }))
            .count()
    }
}

/// Result of the main-stat-only search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainStatReport {
    pub combination: MainStatCombination,
    pub artifacts: ArtifactSet,
    pub score: f64,
    pub energy_recharge: f64,
    pub evaluated: usize,
    /// True when the sands was pinned to energy recharge to reach the requirement.
    pub forced_energy_sands: bool,
}

/// What an optimizer entry point can be pointed at.
#[derive(Debug)]
pub enum OptimizationTarget<'a> {
    Character(&'a mut Character),
    Weapon(&'a Weapon),
    Artifact(&'a Artifact),
    StatTable(&'a StatTable),
}

impl OptimizationTarget<'_> {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Character(_) => "character",
            Self::Weapon(_) => "weapon",
            Self::Artifact(_) => "artifact",
            Self::StatTable(_) => "stat table",
        }
    }
}

/// Run the full artifact search on `target`.
///
/// # Errors
///
/// Returns `OptimizeError::Unsupported` for anything but a character, and
/// otherwise whatever [`optimize_artifacts`] returns.
pub fn optimize<O>(
    target: OptimizationTarget<'_>,
    objective: &O,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<SearchReport, OptimizeError>
where
    O: Objective + ?Sized,
{
    match target {
        OptimizationTarget::Character(character) => {
            optimize_artifacts(character, objective, requirement, config)
        }
        other => Err(OptimizeError::Unsupported(other.kind())),
    }
}

/// Strip the character to flower and feather at the configured rarity and
/// level, with no substats.
fn bare_character(
    character: &Character,
    config: &OptimizerConfig,
) -> Result<Character, OptimizeError> {
    let mut working = character.clone();
    working.unequip_all_artifacts();
    working.clear_substats();
    working
        .equip(Artifact::flower(config.rarity, config.level)?)
        .equip(Artifact::feather(config.rarity, config.level)?);
    Ok(working)
}

/// Keep main stats whose isolated unit bump beats `baseline`. Energy
/// recharge always stays in the sands list.
fn prune_candidates<O>(working: &Character, objective: &O, baseline: f64) -> Vec<SlotCandidates>
where
    O: Objective + ?Sized,
{
    ArtifactSlot::CONFIGURABLE
        .iter()
        .map(|&slot| {
            let (mut kept, mut pruned) = (CandidateList::new(), CandidateList::new());
            for &stat in slot.allowed_main_stats() {
                let probe = StatTable::of(stat, MAIN_STAT_PROBE_VALUE);
                let useful = objective.evaluate(&working.stats_with(&probe)) > baseline;
                if useful || (slot == ArtifactSlot::Sands && stat == Stat::EnergyRecharge) {
                    kept.push(stat);
                } else {
                    pruned.push(stat);
                }
            }
            let fallback = kept.is_empty();
            if fallback {
                warn!(
                    target: LOG_SEARCH,
                    "no {} main stat improves the objective; trying all of them",
                    slot.label()
                );
                kept.clone_from(&pruned);
            }
            debug!(target: LOG_SEARCH, "{} candidates: {kept:?}", slot.label());
            SlotCandidates {
                slot,
                kept,
                pruned,
                fallback,
            }
        })
        .collect()
}

fn combinations(candidates: &[SlotCandidates]) -> Vec<MainStatCombination> {
    let list = |slot: ArtifactSlot| {
        candidates
            .iter()
            .find(|c| c.slot == slot)
            .map(|c| c.kept.as_slice())
            .unwrap_or_default()
    };
    let mut out = Vec::new();
    for &sands in list(ArtifactSlot::Sands) {
        for &goblet in list(ArtifactSlot::Goblet) {
            for &circlet in list(ArtifactSlot::Circlet) {
                out.push(MainStatCombination {
                    sands,
                    goblet,
                    circlet,
                });
            }
        }
    }
    out
}

/// Find the main stats and substats that maximize `objective` while keeping
/// energy recharge at or above `requirement`, then equip them on `character`.
///
/// Every combination of the pruned per-slot candidates gets its own builder
/// and allocator run. Combinations whose gate fails are skipped; the first
/// strictly best score wins.
///
/// # Errors
///
/// Returns `ConstraintInfeasible` when the requirement is above the
/// theoretical ceiling or no combination met it, `Config` for an invalid
/// configuration, and `Budget` on a roll budget contract violation. The
/// character is untouched on error.
pub fn optimize_artifacts<O>(
    character: &mut Character,
    objective: &O,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<SearchReport, OptimizeError>
where
    O: Objective + ?Sized,
{
    config.validate()?;
    let ceiling = theoretical_ceiling(
        &character.stats_without_artifacts(),
        config.rarity,
        config.level,
        &config.constraints,
    );
    if requirement > ceiling {
        return Err(OptimizeError::ConstraintInfeasible {
            required: requirement,
            best: ceiling,
        });
    }

    let mut working = bare_character(character, config)?;
    let baseline = objective.evaluate(&working.stats());
    let candidates = prune_candidates(&working, objective, baseline);
    let mut reports = Vec::new();
    let mut best: Option<(MainStatCombination, Allocation)> = None;
    let mut best_energy = f64::NEG_INFINITY;

    for combination in combinations(&candidates) {
        for piece in combination.pieces(config.rarity, config.level)? {
            working.equip(piece);
        }
        let anchor = working.stats_without_substats();
        let mut builder =
            ArtifactBuilder::for_character(&working, config.rarity, config.constraints);
        let outcome = match allocate(
            config.allocator,
            &anchor,
            &mut builder,
            objective,
            requirement,
            config.quality,
        ) {
            Ok(trace) => {
                let stats = anchor.merged(&builder.substats());
                let energy_recharge = stats.get(Stat::EnergyRecharge);
                best_energy = best_energy.max(energy_recharge);
                if energy_recharge < requirement {
                    CombinationOutcome::BelowRequirement { energy_recharge }
                } else {
                    let score = objective.evaluate(&stats);
                    if best.as_ref().is_none_or(|(_, top)| score > top.score) {
                        best = Some((
                            combination,
                            Allocation {
                                builder,
                                score,
                                energy_recharge,
                                trace,
                            },
                        ));
                    }
                    CombinationOutcome::Scored {
                        score,
                        energy_recharge,
                    }
                }
            }
            Err(err) if err.is_recoverable() => {
                if let OptimizeError::ConstraintInfeasible { best: reach, .. }
                | OptimizeError::AllocationExhausted { reached: reach, .. } = err
                {
                    best_energy = best_energy.max(reach);
                }
                CombinationOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
            Err(err) => return Err(err),
        };
        debug!(target: LOG_SEARCH, "{combination}: {outcome:?}");
        reports.push(CombinationReport {
            combination,
            outcome,
        });
    }

    let Some((winner, allocation)) = best else {
        return Err(OptimizeError::ConstraintInfeasible {
            required: requirement,
            best: best_energy.max(0.0),
        });
    };
    info!(
        target: LOG_SEARCH,
        "best of {} combinations: {winner} scoring {:.2}",
        reports.len(),
        allocation.score
    );
    allocation.builder.apply_to(character);
    Ok(SearchReport {
        requirement,
        ceiling,
        baseline,
        candidates,
        combinations: reports,
        winner,
        best: allocation,
    })
}

/// Allocate substats for the main stats `character` already wears, then
/// replace its substats with the result.
///
/// # Errors
///
/// Returns the gate's `ConstraintInfeasible` or `AllocationExhausted` when
/// these main stats cannot reach `requirement`, plus `Config` and `Budget`
/// as for [`optimize_artifacts`].
pub fn optimal_substats<O>(
    character: &mut Character,
    objective: &O,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<Allocation, OptimizeError>
where
    O: Objective + ?Sized,
{
    config.validate()?;
    let anchor = character.stats_without_substats();
    let mut builder = ArtifactBuilder::for_character(character, config.rarity, config.constraints);
    let trace = allocate(
        config.allocator,
        &anchor,
        &mut builder,
        objective,
        requirement,
        config.quality,
    )?;
    let stats = anchor.merged(&builder.substats());
    let allocation = Allocation {
        score: objective.evaluate(&stats),
        energy_recharge: stats.get(Stat::EnergyRecharge),
        builder,
        trace,
    };
    character.set_substats(allocation.builder.substats());
    info!(
        target: LOG_SEARCH,
        "substats for {} scoring {:.2}", character.name, allocation.score
    );
    Ok(allocation)
}

/// Main-stat-only search with no substats, as a quick first pass.
///
/// Does not modify `character`. When its energy recharge is below
/// `requirement` the sands is pinned to energy recharge.
///
/// # Errors
///
/// Returns `ConstraintInfeasible` when even an energy recharge sands falls
/// short, and `Config` for an invalid configuration.
pub fn optimal_main_stats<O>(
    character: &Character,
    objective: &O,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<MainStatReport, OptimizeError>
where
    O: Objective + ?Sized,
{
    config.validate()?;
    let mut working = bare_character(character, config)?;
    let unaided = working.get(Stat::EnergyRecharge);
    let forced_energy_sands = unaided < requirement;
    let sands_options: &[Stat] = if forced_energy_sands {
        &[Stat::EnergyRecharge]
    } else {
        ArtifactSlot::Sands.allowed_main_stats()
    };

    let mut best: Option<(MainStatCombination, f64, f64)> = None;
    let mut evaluated = 0;
    for &sands in sands_options {
        for &goblet in ArtifactSlot::Goblet.allowed_main_stats() {
            for &circlet in ArtifactSlot::Circlet.allowed_main_stats() {
                let combination = MainStatCombination {
                    sands,
                    goblet,
                    circlet,
                };
                for piece in combination.pieces(config.rarity, config.level)? {
                    working.equip(piece);
                }
                evaluated += 1;
                let energy_recharge = working.get(Stat::EnergyRecharge);
                if energy_recharge < requirement {
                    continue;
                }
                let score = objective.evaluate(&working.stats());
                if best.is_none_or(|(_, top, _)| score > top) {
                    best = Some((combination, score, energy_recharge));
                }
            }
        }
    }

    let Some((combination, score, energy_recharge)) = best else {
        let mut pinned = working;
        pinned.equip(Artifact::new(
            ArtifactSlot::Sands,
            config.rarity,
            config.level,
            Stat::EnergyRecharge,
        )?);
        return Err(OptimizeError::ConstraintInfeasible {
            required: requirement,
            best: pinned.get(Stat::EnergyRecharge),
        });
    };
    let mut artifacts = working.artifacts;
    for piece in combination.pieces(config.rarity, config.level)? {
        artifacts.equip(piece);
    }
    debug!(
        target: LOG_SEARCH,
        "main stats only: {combination} scoring {score:.2} after {evaluated} combinations"
    );
    Ok(MainStatReport {
        combination,
        artifacts,
        score,
        energy_recharge,
        evaluated,
        forced_energy_sands,
    })
}
