//! Simulation configuration, loadable from JSON

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::solver::{GridBackend, GridError, RuleParams};

/// Everything needed to build a [`Simulation`](super::Simulation)
///
/// Missing JSON fields fall back to [`SimulationConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: u32,
    pub height: u32,
    pub backend: GridBackend,
    /// Grid RNG seed, `None` draws entropy
    pub seed: Option<u64>,
    pub rules: RuleParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            backend: GridBackend::Sequential,
            seed: None,
            rules: RuleParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON document
    ///
    /// # Errors
    ///
    /// [`GridError::Config`] when the document is malformed
    pub fn from_json_str(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a JSON document from a reader
    ///
    /// # Errors
    ///
    /// [`GridError::Config`] when the document is malformed or unreadable
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GridError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
