//! Block-bootstrap resampling of historical return matrices.
//!
//! Three interchangeable methods produce synthetic `n_samples x N` return
//! matrices from a [`ReturnMatrix`], always copying whole rows so the
//! cross-sectional correlation between assets is preserved:
//!
//! - [`BootstrapMethod::Vanilla`]: fixed-length blocks, uniform start draws.
//! - [`BootstrapMethod::LambdaBias`]: fixed-length blocks, start draws tilted
//!   toward historical loss periods by a squared-badness score.
//! - [`BootstrapMethod::Stationary`]: geometric block lengths and circular
//!   row indexing (blocks wrap past the end of the series), with an optional
//!   exponential loss tilt on the start distribution.
//!
//! Vanilla and lambda-bias blocks never cross the end of the series; their
//! final block is truncated instead of resampled. The wrap-around of the
//! stationary variant is deliberate and must not be replaced by truncation.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_distr::Geometric;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::panel::ReturnMatrix;

/// Lower clamp for the geometric success probability, so very large mean
/// block lengths cannot degenerate into an unsamplable distribution.
const MIN_BLOCK_PROB: f64 = 1e-9;

/// Resampling method plus its numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BootstrapMethod {
    /// Uniform block bootstrap with fixed block size.
    Vanilla { block_size: usize },
    /// Badness-weighted block bootstrap.
    ///
    /// Start indices are drawn from a categorical distribution built from
    /// `lambda * max(0, -r_t)^2 + (1 - lambda)` where `r_t` is the one-step
    /// portfolio return at the candidate start. `lambda = 0` degenerates to
    /// uniform sampling, `lambda = 1` always prefers high-loss starts.
    LambdaBias { block_size: usize, lambda: f64 },
    /// Stationary bootstrap with optional exponential tilt.
    ///
    /// Block lengths are geometric with success probability
    /// `1 / mean_block_len` (minimum length 1); start probabilities are
    /// proportional to `exp(theta * max(0, -r_t))` over all rows. Rows are
    /// read circularly, so blocks may wrap past the end of the series.
    Stationary { mean_block_len: usize, theta: f64 },
}

impl BootstrapMethod {
    /// Check the method parameters against a series of `series_len` rows.
    ///
    /// Fails synchronously, before any random draw is made.
    pub fn validate(&self, series_len: usize) -> Result<(), ConfigError> {
        match *self {
            BootstrapMethod::Vanilla { block_size } => {
                validate_block(block_size, series_len)
            }
            BootstrapMethod::LambdaBias { block_size, lambda } => {
                validate_block(block_size, series_len)?;
                if !(0.0..=1.0).contains(&lambda) {
                    return Err(ConfigError::InvalidLambda(lambda));
                }
                Ok(())
            }
            BootstrapMethod::Stationary {
                mean_block_len,
                theta,
            } => {
                validate_block(mean_block_len, series_len)?;
                if !theta.is_finite() || theta < 0.0 {
                    return Err(ConfigError::InvalidTheta(theta));
                }
                Ok(())
            }
        }
    }

    /// Generate one synthetic `n_samples x N` return matrix.
    ///
    /// `weights` is the current portfolio weight vector; it only influences
    /// the start-index distributions of the biased variants.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        returns: &ReturnMatrix,
        weights: &[f64],
        n_samples: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<f64>>, ConfigError> {
        self.validate(returns.num_steps())?;
        match *self {
            BootstrapMethod::Vanilla { block_size } => {
                Ok(vanilla_bootstrap(returns, block_size, n_samples, rng))
            }
            BootstrapMethod::LambdaBias { block_size, lambda } => Ok(lambda_bias_bootstrap(
                returns, weights, block_size, lambda, n_samples, rng,
            )),
            BootstrapMethod::Stationary {
                mean_block_len,
                theta,
            } => stationary_bootstrap(returns, weights, mean_block_len, theta, n_samples, rng),
        }
    }
}

fn validate_block(block: usize, series_len: usize) -> Result<(), ConfigError> {
    if block == 0 || block > series_len {
        return Err(ConfigError::InvalidBlock { block, series_len });
    }
    Ok(())
}

/// Start-index sampler: either uniform over `0..bound` or categorical.
enum StartDraw {
    Uniform { bound: usize },
    Weighted(WeightedIndex<f64>),
}

impl StartDraw {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self {
            StartDraw::Uniform { bound } => rng.random_range(0..*bound),
            StartDraw::Weighted(dist) => dist.sample(rng),
        }
    }
}

/// Build a categorical start distribution from raw scores, falling back to
/// uniform when the total score is zero (e.g. `lambda = 1` on a series with
/// no loss periods).
fn weighted_or_uniform(scores: Vec<f64>) -> StartDraw {
    let total: f64 = scores.iter().sum();
    if total > 0.0
        && let Ok(dist) = WeightedIndex::new(&scores)
    {
        StartDraw::Weighted(dist)
    } else {
        StartDraw::Uniform {
            bound: scores.len(),
        }
    }
}

/// Copy fixed-size blocks from sampled starts until `n_samples` rows are
/// filled. Valid starts are `[0, T - block_size]`, so blocks never cross the
/// end of the series; the final block is truncated to fit.
fn fill_from_blocks<R: Rng + ?Sized>(
    rows: &[Vec<f64>],
    block_size: usize,
    n_samples: usize,
    draw: &StartDraw,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut out = Vec::with_capacity(n_samples);
    while out.len() < n_samples {
        let start = draw.sample(rng);
        let take = block_size.min(n_samples - out.len());
        for offset in 0..take {
            out.push(rows[start + offset].clone());
        }
    }
    out
}

fn vanilla_bootstrap<R: Rng + ?Sized>(
    returns: &ReturnMatrix,
    block_size: usize,
    n_samples: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let num_starts = returns.num_steps() - block_size + 1;
    let draw = StartDraw::Uniform { bound: num_starts };
    fill_from_blocks(returns.rows(), block_size, n_samples, &draw, rng)
}

fn lambda_bias_bootstrap<R: Rng + ?Sized>(
    returns: &ReturnMatrix,
    weights: &[f64],
    block_size: usize,
    lambda: f64,
    n_samples: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let num_starts = returns.num_steps() - block_size + 1;
    let portfolio = returns.portfolio_returns(weights);
    let scores: Vec<f64> = portfolio[..num_starts]
        .iter()
        .map(|r| {
            let badness = (-r).max(0.0).powi(2);
            lambda * badness + (1.0 - lambda)
        })
        .collect();
    let draw = weighted_or_uniform(scores);
    fill_from_blocks(returns.rows(), block_size, n_samples, &draw, rng)
}

fn stationary_bootstrap<R: Rng + ?Sized>(
    returns: &ReturnMatrix,
    weights: &[f64],
    mean_block_len: usize,
    theta: f64,
    n_samples: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>, ConfigError> {
    let series_len = returns.num_steps();
    let prob = (1.0 / mean_block_len as f64).clamp(MIN_BLOCK_PROB, 1.0);
    let lengths = Geometric::new(prob).map_err(|_| ConfigError::InvalidBlock {
        block: mean_block_len,
        series_len,
    })?;

    // Start probabilities over all rows, tilted toward losses.
    let portfolio = returns.portfolio_returns(weights);
    let scores: Vec<f64> = portfolio
        .iter()
        .map(|r| (theta * (-r).max(0.0)).exp())
        .collect();
    let draw = weighted_or_uniform(scores);

    let rows = returns.rows();
    let mut out = Vec::with_capacity(n_samples);
    while out.len() < n_samples {
        let start = draw.sample(rng);
        let length = geometric_block_length(&lengths, rng);
        for offset in 0..length {
            if out.len() >= n_samples {
                break;
            }
            // Circular wrap for blocks that extend past the end
            out.push(rows[(start + offset) % series_len].clone());
        }
    }
    Ok(out)
}

/// Sample one block length: geometric number of failures plus one, so the
/// minimum length is 1 and the mean is `1 / p`.
fn geometric_block_length<R: Rng + ?Sized>(dist: &Geometric, rng: &mut R) -> usize {
    1 + dist.sample(rng) as usize
}
