//! The Monte Carlo engine: per-instance mutable state tying panel selection,
//! resampling and risk measurement together.
//!
//! An engine owns its panel, the currently selected return matrix, the
//! weight vector, its random stream, and the transient results of the last
//! simulation and risk-measure call. Nothing is shared between instances, so
//! independent engines (one per seed, per dataset slice, per parallel solve)
//! may run concurrently. Within one engine, operations are strictly
//! sequential: selection, simulation and measurement mutate the same state
//! and there is no internal locking.
//!
//! Reproducibility comes from [`MonteCarloEngine::set_seed`] alone; reseed
//! before the first simulation of a run, never in the middle of one.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapMethod;
use crate::error::{ConfigError, Result, StateError};
use crate::optimization::{ErcConfig, ErcSolution, ProgressCallback};
use crate::panel::{PricePanel, ReturnMatrix};
use crate::risk::{RiskMeasure, compute_risk};

/// Tolerance on `sum(weights) - 1` accepted by [`MonteCarloEngine::set_weights`].
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Batch dimensions and tail level for an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of simulated matrices per batch (M)
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    /// Rows per simulated matrix (the resampled horizon length)
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Tail level as an integer percent in (0, 100); 5 selects the worst-5%
    /// tail of the loss distribution
    #[serde(default = "default_alpha_pct")]
    pub alpha_pct: u32,
}

fn default_num_simulations() -> usize {
    1_000
}

fn default_num_samples() -> usize {
    252
}

fn default_alpha_pct() -> u32 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_simulations: default_num_simulations(),
            num_samples: default_num_samples(),
            alpha_pct: default_alpha_pct(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.alpha_pct == 0 || self.alpha_pct >= 100 {
            return Err(ConfigError::InvalidAlpha(self.alpha_pct));
        }
        if self.num_simulations == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_simulations",
                value: self.num_simulations,
            });
        }
        if self.num_samples == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_samples",
                value: self.num_samples,
            });
        }
        Ok(())
    }
}

/// Monte Carlo portfolio risk engine.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    config: EngineConfig,
    rng: SmallRng,
    panel: PricePanel,
    selected: Option<ReturnMatrix>,
    weights: Vec<f64>,
    batch: Vec<Vec<Vec<f64>>>,
    last_risk: Vec<f64>,
}

impl MonteCarloEngine {
    /// Create an engine over a panel with an entropy-seeded random stream.
    pub fn new(panel: PricePanel, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: SmallRng::from_os_rng(),
            panel,
            selected: None,
            weights: Vec::new(),
            batch: Vec::new(),
            last_risk: Vec::new(),
        })
    }

    /// Reset the random stream to a fixed seed.
    ///
    /// Call before the first simulation to make a run reproducible.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Select one data category from the panel and build the return matrix.
    ///
    /// Replaces any previous selection wholesale: weights are reset to `1/N`
    /// for the N tickers of the category, and the simulated batch and risk
    /// result are discarded.
    pub fn select_category(&mut self, category: &str) -> Result<()> {
        let matrix = self.panel.select_category(category)?;
        let num_assets = matrix.num_assets();
        self.weights = vec![1.0 / num_assets as f64; num_assets];
        self.selected = Some(matrix);
        self.batch.clear();
        self.last_risk.clear();
        Ok(())
    }

    /// The selected return matrix, if a category has been selected.
    #[must_use]
    pub fn return_matrix(&self) -> Option<&ReturnMatrix> {
        self.selected.as_ref()
    }

    /// Tickers of the current selection, in column order.
    #[must_use]
    pub fn tickers(&self) -> &[String] {
        self.selected.as_ref().map_or(&[], |m| m.tickers())
    }

    /// Number of selected assets (0 before any selection).
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.weights.len()
    }

    /// Current portfolio weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Replace the portfolio weights.
    ///
    /// The vector must match the number of selected tickers, contain only
    /// non-negative finite entries, and sum to 1 within
    /// [`WEIGHT_SUM_TOLERANCE`].
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        let expected = match &self.selected {
            Some(matrix) => matrix.num_assets(),
            None => return Err(StateError::NotSelected.into()),
        };
        if weights.len() != expected {
            return Err(ConfigError::WeightLength {
                expected,
                actual: weights.len(),
            }
            .into());
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { index, value }.into());
            }
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum).into());
        }
        self.weights = weights.to_vec();
        Ok(())
    }

    /// Produce a fresh batch of `num_simulations` resampled matrices.
    ///
    /// Every call regenerates the batch from the current weights and random
    /// stream; prior draws are never reused. The previous risk result is
    /// invalidated.
    pub fn run_simulation(&mut self, method: BootstrapMethod) -> Result<()> {
        let matrix = match &self.selected {
            Some(matrix) => matrix,
            None => return Err(StateError::NotSelected.into()),
        };
        method.validate(matrix.num_steps())?;

        let mut batch = Vec::with_capacity(self.config.num_simulations);
        for _ in 0..self.config.num_simulations {
            batch.push(method.generate(
                matrix,
                &self.weights,
                self.config.num_samples,
                &mut self.rng,
            )?);
        }
        self.batch = batch;
        self.last_risk.clear();
        Ok(())
    }

    /// The most recent simulated batch (read-only; empty before the first
    /// simulation and after re-selection).
    #[must_use]
    pub fn simulated_batch(&self) -> &[Vec<Vec<f64>>] {
        &self.batch
    }

    /// Compute marginal risk contributions from the last simulated batch.
    ///
    /// Returns the N weight-scaled per-asset entries; the portfolio figure
    /// is retained and exposed through [`MonteCarloEngine::portfolio_loss`].
    /// Calling this twice without an intervening simulation returns
    /// bit-identical results — no randomness is consumed here.
    pub fn compute_risk_contributions(&mut self, measure: RiskMeasure) -> Result<Vec<f64>> {
        if self.batch.is_empty() {
            return Err(StateError::NoSimulation.into());
        }
        self.last_risk = compute_risk(
            &self.batch,
            &self.weights,
            self.config.alpha_pct,
            measure,
        );
        Ok(self.last_risk[..self.weights.len()].to_vec())
    }

    /// Portfolio risk figure from the most recent measurement (0.0 if none).
    #[must_use]
    pub fn portfolio_loss(&self) -> f64 {
        self.last_risk.last().copied().unwrap_or(0.0)
    }

    /// Solve for Equal-Risk-Contribution weights with this engine.
    ///
    /// See [`crate::optimization::solve_erc`].
    pub fn solve_erc(
        &mut self,
        method: BootstrapMethod,
        config: &ErcConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<ErcSolution> {
        crate::optimization::solve_erc(self, method, config, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let bad_alpha = EngineConfig {
            alpha_pct: 100,
            ..Default::default()
        };
        assert!(matches!(
            bad_alpha.validate(),
            Err(ConfigError::InvalidAlpha(100))
        ));

        let zero_alpha = EngineConfig {
            alpha_pct: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_alpha.validate(),
            Err(ConfigError::InvalidAlpha(0))
        ));

        let no_sims = EngineConfig {
            num_simulations: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_sims.validate(),
            Err(ConfigError::InvalidCount { .. })
        ));
    }
}
