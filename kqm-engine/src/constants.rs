//! Roll-budget conventions and search tuning constants.
//!
//! The defaults follow the community "KQM standard" assumptions: twenty
//! fluid substat rolls spread over a full five-piece set, at most two per
//! piece whose main stat differs from the substat, on top of two fixed
//! average-quality rolls of every substat.

// Roll budget --------------------------------------------------------------
pub(crate) const KQMC_FLUID_ROLLS: u32 = 20;
pub(crate) const KQMC_ROLLS_PER_SLOT: u32 = 2;
pub(crate) const KQMC_FIXED_ROLLS: u32 = 2;

// Artifacts ----------------------------------------------------------------
pub(crate) const DEFAULT_RARITY: u8 = 5;
pub(crate) const DEFAULT_LEVEL: u8 = 20;

// Search -------------------------------------------------------------------
/// Relative tolerance under which a probe counts as "no marginal gain".
pub(crate) const ZERO_GAIN_TOLERANCE: f64 = 1e-12;
/// Size of the isolated stat bump used to prune main-stat candidates.
pub(crate) const MAIN_STAT_PROBE_VALUE: f64 = 1.0;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_ALLOCATOR: &str = "kqm::allocator";
pub(crate) const LOG_GATE: &str = "kqm::energy_gate";
pub(crate) const LOG_SEARCH: &str = "kqm::search";
