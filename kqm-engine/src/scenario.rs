//! Scenario files: a character, the rotation it is scored on, and how the
//! optimizer should run.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::{Artifact, ArtifactError};
use crate::character::Character;
use crate::config::{OptimizerConfig, OptimizerConfigError};
use crate::rotation::Rotation;

const RAIDEN_BURST: &str = include_str!("../assets/scenarios/raiden-burst.json");
const YELAN_HP: &str = include_str!("../assets/scenarios/yelan-hp.json");
const XIANGLING_VAPE: &str = include_str!("../assets/scenarios/xiangling-vape.json");

/// Built-in scenarios, by name.
pub static PRESETS: [(&str, &str); 3] = [
    ("raiden-burst", RAIDEN_BURST),
    ("yelan-hp", YELAN_HP),
    ("xiangling-vape", XIANGLING_VAPE),
];

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown preset '{name}' (known: {known})")]
    UnknownPreset { name: String, known: String },
    #[error("equipped artifact is invalid: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("optimizer config is invalid: {0}")]
    Config(#[from] OptimizerConfigError),
    #[error("energy recharge requirement must be a finite, non-negative number (got {0})")]
    Requirement(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub character: Character,
    pub rotation: Rotation,
    #[serde(default = "Scenario::default_requirement")]
    pub energy_recharge_requirement: f64,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl Scenario {
    const fn default_requirement() -> f64 {
        1.0
    }

    /// Parse and validate a scenario.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError` for malformed JSON or any value that fails
    /// [`Scenario::validate`].
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a built-in scenario by name.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::UnknownPreset` when no preset has that name.
    pub fn preset(name: &str) -> Result<Self, ScenarioError> {
        let (_, json) = PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .ok_or_else(|| ScenarioError::UnknownPreset {
                name: name.to_string(),
                known: preset_names().collect::<Vec<_>>().join(", "),
            })?;
        Self::from_json(json)
    }

    /// Check the requirement, the optimizer config, and every equipped piece.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let requirement = self.energy_recharge_requirement;
        if !requirement.is_finite() || requirement < 0.0 {
            return Err(ScenarioError::Requirement(requirement));
        }
        self.optimizer.validate()?;
        for piece in self.character.artifacts.iter() {
            Artifact::new(piece.slot, piece.rarity, piece.level, piece.main_stat)?;
        }
        Ok(())
    }
}

/// Names of the built-in scenarios.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}
