//! Failure taxonomy shared by the gate, allocators, and searches.
use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::config::OptimizerConfigError;
use crate::roll_budget::BudgetError;
use crate::stats::Stat;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    /// The requirement is above the best value the gear could ever reach.
    #[error("energy recharge requirement {required:.3} is unreachable (best possible {best:.3})")]
    ConstraintInfeasible { required: f64, best: f64 },
    /// One attempt ran out of rolls before meeting the requirement.
    #[error("ran out of {stat} rolls at {reached:.3}, needed {required:.3}")]
    AllocationExhausted {
        stat: Stat,
        reached: f64,
        required: f64,
    },
    #[error("optimizing a {0} is not supported")]
    Unsupported(&'static str),
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Config(#[from] OptimizerConfigError),
}

impl OptimizeError {
    /// Errors that sink a single main-stat combination but not the search.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConstraintInfeasible { .. } | Self::AllocationExhausted { .. }
        )
    }
}
