//! Equal-Risk-Contribution weight optimization.
//!
//! The solver drives repeated simulate-and-measure cycles against one
//! engine: push weights, resample a fresh batch, measure marginal Expected
//! Shortfall contributions, and rescale each weight multiplicatively toward
//! the common target `ES / N`, with damping and simplex renormalization.
//!
//! # Example
//!
//! ```ignore
//! use riskboot_core::{BootstrapMethod, EngineConfig, ErcConfig, MonteCarloEngine};
//!
//! let mut engine = MonteCarloEngine::new(panel, EngineConfig::default())?;
//! engine.set_seed(420);
//! engine.select_category("Close")?;
//!
//! let solution = engine.solve_erc(
//!     BootstrapMethod::Stationary { mean_block_len: 10, theta: 30.0 },
//!     &ErcConfig::default(),
//!     None,
//! )?;
//! println!("weights: {:?}", solution.weights);
//! ```

mod config;
mod erc;
mod result;

pub use config::ErcConfig;
pub use erc::{ProgressCallback, solve_erc};
pub use result::{ErcHistory, ErcIteration, ErcSolution, TerminationReason};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::bootstrap::BootstrapMethod;
use crate::engine::{EngineConfig, MonteCarloEngine};
use crate::error::Result;
use crate::panel::PricePanel;

/// Solve one ERC problem per seed, each on its own engine instance.
///
/// Every seed gets an independent engine (own panel copy, weight vector and
/// random stream), so runs are reproducible individually and can execute in
/// parallel under the `parallel` feature. Results come back in seed order.
pub fn solve_erc_ensemble(
    panel: &PricePanel,
    category: &str,
    engine_config: &EngineConfig,
    method: BootstrapMethod,
    erc_config: &ErcConfig,
    seeds: &[u64],
) -> Result<Vec<ErcSolution>> {
    #[cfg(feature = "parallel")]
    let results: Vec<Result<ErcSolution>> = seeds
        .par_iter()
        .map(|&seed| solve_seeded(panel, category, engine_config, method, erc_config, seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<ErcSolution>> = seeds
        .iter()
        .map(|&seed| solve_seeded(panel, category, engine_config, method, erc_config, seed))
        .collect();

    results.into_iter().collect()
}

fn solve_seeded(
    panel: &PricePanel,
    category: &str,
    engine_config: &EngineConfig,
    method: BootstrapMethod,
    erc_config: &ErcConfig,
    seed: u64,
) -> Result<ErcSolution> {
    let mut engine = MonteCarloEngine::new(panel.clone(), engine_config.clone())?;
    engine.set_seed(seed);
    engine.select_category(category)?;
    solve_erc(&mut engine, method, erc_config, None)
}
