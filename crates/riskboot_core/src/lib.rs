//! Monte Carlo portfolio risk-simulation and ERC optimization library
//!
//! This crate resamples historical asset-return histories with three block
//! bootstrap variants, measures tail risk (Value-at-Risk, Expected
//! Shortfall) with per-asset marginal decomposition, and solves for
//! Equal-Risk-Contribution portfolio weights with a damped multiplicative
//! fixed-point iteration. It supports:
//! - Price panels (date -> category -> ticker -> value, NaN = missing) with
//!   whole-date filtering of incomplete cross-sections
//! - Vanilla, loss-biased and stationary (circular, geometric-length) block
//!   bootstrap, all preserving cross-sectional correlation
//! - VaR/ES over weighted sums of per-asset compounded losses
//! - Seedable, instance-owned random streams for reproducible runs
//! - Parallel multi-seed ERC ensembles (`parallel` feature)
//!
//! # Example
//!
//! ```ignore
//! use riskboot_core::{BootstrapMethod, EngineConfig, ErcConfig, MonteCarloEngine};
//!
//! let mut engine = MonteCarloEngine::new(panel, EngineConfig::default())?;
//! engine.set_seed(420);
//! engine.select_category("Close")?;
//! engine.run_simulation(BootstrapMethod::Vanilla { block_size: 10 })?;
//! let contributions = engine.compute_risk_contributions(RiskMeasure::ExpectedShortfall)?;
//! println!("portfolio ES: {}", engine.portfolio_loss());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod bootstrap;
pub mod engine;
pub mod error;
pub mod optimization;
pub mod panel;
pub mod risk;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use bootstrap::BootstrapMethod;
pub use engine::{EngineConfig, MonteCarloEngine};
pub use error::{ConfigError, DataError, EngineError, StateError};
pub use optimization::{ErcConfig, ErcSolution, ProgressCallback, TerminationReason};
pub use panel::{PricePanel, ReturnMatrix};
pub use risk::RiskMeasure;
