//! Optimizer configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::AllocatorKind;
use crate::artifacts::{RollQuality, max_level};
use crate::constants::{DEFAULT_LEVEL, DEFAULT_RARITY};
use crate::energy_gate::GatePolicy;
use crate::roll_budget::{RollConstraints, StatCap};

/// Errors raised when optimizer configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizerConfigError {
    #[error("artifact rarity {rarity} is not supported (expected 4 or 5)")]
    UnsupportedRarity { rarity: u8 },
    #[error("artifact level {level} exceeds the {rarity}-star maximum of {max}")]
    LevelOutOfRange { rarity: u8, level: u8, max: u8 },
    #[error("roll budget must allow at least one fluid roll")]
    EmptyBudget,
    #[error("per-stat roll cap must be positive")]
    ZeroStatCap,
}

/// Knobs for every optimizer entry point. All fields default to the
/// standard five-star, level-20, average-roll assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "OptimizerConfig::default_rarity")]
    pub rarity: u8,
    #[serde(default = "OptimizerConfig::default_level")]
    pub level: u8,
    /// Quality assumed for every planned fluid roll.
    #[serde(default)]
    pub quality: RollQuality,
    #[serde(default)]
    pub allocator: AllocatorKind,
    /// Policy for standalone energy planning; allocators always cap.
    #[serde(default)]
    pub gate_policy: GatePolicy,
    #[serde(default)]
    pub constraints: RollConstraints,
}

impl OptimizerConfig {
    const fn default_rarity() -> u8 {
        DEFAULT_RARITY
    }

    const fn default_level() -> u8 {
        DEFAULT_LEVEL
    }

    /// Validate invariants.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerConfigError` when rarity, level, or the roll budget
    /// are out of range.
    pub const fn validate(&self) -> Result<(), OptimizerConfigError> {
        let Some(max) = max_level(self.rarity) else {
            return Err(OptimizerConfigError::UnsupportedRarity {
                rarity: self.rarity,
            });
        };
        if self.level > max {
            return Err(OptimizerConfigError::LevelOutOfRange {
                rarity: self.rarity,
                level: self.level,
                max,
            });
        }
        if self.constraints.total_rolls == 0 {
            return Err(OptimizerConfigError::EmptyBudget);
        }
        if matches!(
            self.constraints.stat_cap,
            StatCap::PerNonMainSlot(0) | StatCap::Uniform(0)
        ) {
            return Err(OptimizerConfigError::ZeroStatCap);
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            rarity: Self::default_rarity(),
            level: Self::default_level(),
            quality: RollQuality::default(),
            allocator: AllocatorKind::default(),
            gate_policy: GatePolicy::default(),
            constraints: RollConstraints::default(),
        }
    }
}
