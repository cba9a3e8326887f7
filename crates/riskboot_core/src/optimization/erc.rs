//! Damped multiplicative fixed-point iteration toward equal risk
//! contributions.

use crate::bootstrap::BootstrapMethod;
use crate::engine::MonteCarloEngine;
use crate::error::{Result, StateError};
use crate::risk::RiskMeasure;

use super::config::ErcConfig;
use super::result::{ErcHistory, ErcIteration, ErcSolution, TerminationReason};

/// Progress callback invoked once per solver iteration.
///
/// Arguments: (iteration, `rel_deviation`, `portfolio_es`). The callback is
/// observation-only; it must not influence the computation.
pub type ProgressCallback = Box<dyn Fn(usize, f64, f64) + Send + Sync>;

/// Solve for Equal-Risk-Contribution weights.
///
/// Starting from the engine's current weights (`1/N` right after category
/// selection), each iteration resimulates a fresh batch, measures marginal
/// Expected Shortfall contributions, and rescales every weight by
/// `target / contribution` with damping, renormalizing to the simplex.
/// Stops when the largest contribution deviation relative to portfolio ES
/// falls below `tolerance`, or after `max_iterations` — exhaustion is not an
/// error, the last weights are returned with the diagnostics needed to judge
/// them.
pub fn solve_erc(
    engine: &mut MonteCarloEngine,
    method: BootstrapMethod,
    config: &ErcConfig,
    progress: Option<ProgressCallback>,
) -> Result<ErcSolution> {
    config.validate()?;
    let num_assets = engine.num_assets();
    if num_assets == 0 {
        return Err(StateError::NotSelected.into());
    }

    let mut weights = engine.weights().to_vec();
    let mut history = ErcHistory::new();
    let mut rel_deviation = f64::INFINITY;

    for iteration in 0..config.max_iterations {
        // Fresh scenarios at the current iterate; no reuse of prior draws.
        engine.set_weights(&weights)?;
        engine.run_simulation(method)?;

        let contributions = engine.compute_risk_contributions(RiskMeasure::ExpectedShortfall)?;
        assert_eq!(
            contributions.len(),
            num_assets,
            "risk contribution count {} does not match asset count {}",
            contributions.len(),
            num_assets
        );

        let es = engine.portfolio_loss().abs();
        let target = es / num_assets as f64;
        let max_deviation = contributions
            .iter()
            .map(|rc| (rc - target).abs())
            .fold(0.0, f64::max);
        rel_deviation = if es > 0.0 {
            max_deviation / es
        } else {
            max_deviation
        };

        history.record(ErcIteration {
            iteration,
            portfolio_es: es,
            target,
            max_deviation,
            rel_deviation,
            weights: weights.clone(),
        });
        if let Some(callback) = &progress {
            callback(iteration, rel_deviation, es);
        }

        if rel_deviation <= config.tolerance {
            return Ok(build_solution(
                weights,
                TerminationReason::Converged,
                rel_deviation,
                history,
                engine,
            ));
        }

        // Multiplicative update: grow underweighted contributions, shrink
        // overweighted ones, then blend with the current iterate.
        let mut proposal: Vec<f64> = weights
            .iter()
            .zip(contributions.iter())
            .map(|(w, rc)| {
                let denom = rc.max(config.contribution_floor);
                (w * (target / denom)).max(0.0)
            })
            .collect();

        let proposal_sum: f64 = proposal.iter().sum();
        if proposal_sum <= 0.0 {
            proposal = vec![1.0 / num_assets as f64; num_assets];
        } else {
            for value in &mut proposal {
                *value /= proposal_sum;
            }
        }

        for (current, proposed) in weights.iter_mut().zip(proposal.iter()) {
            *current = (1.0 - config.damping) * *current + config.damping * proposed;
        }
        let blended_sum: f64 = weights.iter().sum();
        if blended_sum != 0.0 {
            for value in &mut weights {
                *value /= blended_sum;
            }
        }
    }

    Ok(build_solution(
        weights,
        TerminationReason::MaxIterationsReached,
        rel_deviation,
        history,
        engine,
    ))
}

fn build_solution(
    weights: Vec<f64>,
    termination_reason: TerminationReason,
    rel_deviation: f64,
    history: ErcHistory,
    engine: &MonteCarloEngine,
) -> ErcSolution {
    let iterations = history.num_iterations();
    ErcSolution {
        weights,
        converged: termination_reason == TerminationReason::Converged,
        termination_reason,
        iterations,
        rel_deviation,
        total_simulations: iterations * engine.config().num_simulations,
        history,
    }
}
