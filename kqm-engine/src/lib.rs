//! KQM Engine
//!
//! Gear-stat optimizer for damage rotations. Given a character and a scoring
//! rotation, it searches artifact main-stat combinations and greedily spends a
//! fixed substat roll budget to maximize damage while keeping energy recharge
//! above a requirement. No I/O beyond parsing the strings it is handed.

pub mod allocator;
pub mod artifacts;
pub mod builder;
pub mod character;
pub mod config;
pub mod constants;
pub mod damage;
pub mod energy_gate;
pub mod error;
pub mod numbers;
pub mod roll_budget;
pub mod rotation;
pub mod scenario;
pub mod search;
pub mod stats;

// Re-export commonly used types
pub use allocator::{
    AllocationStep, AllocationTrace, AllocatorKind, allocate, allocate_fill, allocate_single_roll,
};
pub use artifacts::{
    Artifact, ArtifactError, ArtifactSet, ArtifactSlot, RollQuality, main_stat_value,
    possible_sub_stats, sub_stat_value,
};
pub use builder::ArtifactBuilder;
pub use character::{Character, Weapon};
pub use config::{OptimizerConfig, OptimizerConfigError};
pub use damage::Enemy;
pub use energy_gate::{EnergyGate, GatePlan, GatePolicy, plan_energy, theoretical_ceiling};
pub use error::OptimizeError;
pub use roll_budget::{BudgetError, RollBudget, RollConstraints, StatCap};
pub use rotation::{DamageInstance, Objective, Rotation, Scaling, TalentKind};
pub use scenario::{Scenario, ScenarioError, preset_names};
pub use search::{
    Allocation, CombinationOutcome, CombinationReport, MainStatCombination, MainStatReport,
    OptimizationTarget, SearchReport, SlotCandidates, optimal_main_stats, optimal_substats,
    optimize, optimize_artifacts,
};
pub use stats::{Element, Stat, StatTable, StatView};
