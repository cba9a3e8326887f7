//! ERC solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hyperparameters of the multiplicative fixed-point ERC solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErcConfig {
    /// Iteration budget; exhausting it is not an error
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Relative tolerance on the contribution dispersion (vs portfolio ES)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Floor applied to each contribution before dividing, so near-zero or
    /// negative contributions cannot blow up the update
    #[serde(default = "default_contribution_floor")]
    pub contribution_floor: f64,

    /// Blend factor for the proposed weights, in (0, 1]. 1 applies the full
    /// multiplicative step; 0.3-0.7 helps stability.
    #[serde(default = "default_damping")]
    pub damping: f64,
}

fn default_max_iterations() -> usize {
    50
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_contribution_floor() -> f64 {
    1e-10
}

fn default_damping() -> f64 {
    0.5
}

impl Default for ErcConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            contribution_floor: default_contribution_floor(),
            damping: default_damping(),
        }
    }
}

impl ErcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidCount {
                field: "max_iterations",
                value: self.max_iterations,
            });
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err(ConfigError::InvalidDamping(self.damping));
        }
        Ok(())
    }
}
