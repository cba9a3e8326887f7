//! Tail-risk measures over batches of simulated return matrices.
//!
//! Each simulated matrix is collapsed into per-asset compounded losses over
//! the full horizon, `loss_j = 1 - prod_t(1 + r_tj)`. The portfolio loss of a
//! simulation is the weighted *sum* of those per-asset losses — a linear
//! aggregation of independently compounded legs, not the compounded loss of
//! the weighted return series. The ERC solver depends on this aggregation;
//! keep it as is.
//!
//! "Marginal" VaR/ES here means the tail-quantile (or tail-average) raw asset
//! loss scaled by its weight, not a derivative-based contribution.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Tail risk measure to compute from a simulated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskMeasure {
    /// Value at Risk: the loss row at the tail quantile
    ValueAtRisk,
    /// Expected Shortfall: the mean of all rows from the tail quantile onward
    ExpectedShortfall,
}

/// Compute marginal risk contributions and the portfolio risk figure.
///
/// `batch` holds M simulated matrices of shape `n_samples x N`; `alpha_pct`
/// is an integer percent in (0, 100). Returns a vector of length N+1: the N
/// weight-scaled asset entries followed by the unscaled portfolio figure.
pub(crate) fn compute_risk(
    batch: &[Vec<Vec<f64>>],
    weights: &[f64],
    alpha_pct: u32,
    measure: RiskMeasure,
) -> Vec<f64> {
    let num_assets = weights.len();
    let table = loss_table(batch, weights);

    // Rank simulations by ascending portfolio loss.
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by(|&a, &b| {
        table[a][num_assets]
            .partial_cmp(&table[b][num_assets])
            .unwrap_or(Ordering::Equal)
    });

    let quantile = quantile_index(alpha_pct, table.len());

    let mut result = match measure {
        RiskMeasure::ValueAtRisk => table[order[quantile]].clone(),
        RiskMeasure::ExpectedShortfall => {
            let tail = &order[quantile..];
            let mut mean = vec![0.0; num_assets + 1];
            for &sim in tail {
                for (acc, value) in mean.iter_mut().zip(table[sim].iter()) {
                    *acc += value;
                }
            }
            for acc in &mut mean {
                *acc /= tail.len() as f64;
            }
            mean
        }
    };

    // Asset columns become "marginal" contributions via weight scaling; the
    // portfolio column stays unscaled.
    for (value, weight) in result.iter_mut().zip(weights.iter()) {
        *value *= weight;
    }
    result
}

/// Build the M x (N+1) loss table: per-asset compounded losses in the first
/// N columns, portfolio loss in the last.
fn loss_table(batch: &[Vec<Vec<f64>>], weights: &[f64]) -> Vec<Vec<f64>> {
    batch
        .iter()
        .map(|matrix| {
            let mut row = compounded_losses(matrix, weights.len());
            let portfolio: f64 = row.iter().zip(weights.iter()).map(|(l, w)| l * w).sum();
            row.push(portfolio);
            row
        })
        .collect()
}

/// Per-asset compounded loss over the full horizon: `1 - prod_t(1 + r_tj)`.
fn compounded_losses(matrix: &[Vec<f64>], num_assets: usize) -> Vec<f64> {
    let mut growth = vec![1.0; num_assets];
    for row in matrix {
        for (acc, r) in growth.iter_mut().zip(row.iter()) {
            *acc *= 1.0 + r;
        }
    }
    growth.into_iter().map(|g| 1.0 - g).collect()
}

/// Index of the tail quantile row in the loss-ascending ordering:
/// `floor((1 - alpha/100) * M)`, clamped into `[0, M - 1]`.
fn quantile_index(alpha_pct: u32, num_simulations: usize) -> usize {
    let raw = ((1.0 - f64::from(alpha_pct) / 100.0) * num_simulations as f64).floor() as usize;
    raw.min(num_simulations.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_index_clamped() {
        assert_eq!(quantile_index(5, 100), 95);
        assert_eq!(quantile_index(50, 10), 5);
        // A single simulation always selects row 0, whatever alpha is
        assert_eq!(quantile_index(1, 1), 0);
        assert_eq!(quantile_index(99, 1), 0);
        // The index always stays inside the table
        for alpha in 1..100 {
            assert!(quantile_index(alpha, 100) <= 99);
        }
    }

    #[test]
    fn test_compounded_losses_single_asset() {
        // Two steps of +10% compound to 1.21, so the loss is -0.21
        let matrix = vec![vec![0.1], vec![0.1]];
        let losses = compounded_losses(&matrix, 1);
        assert!((losses[0] - (1.0 - 1.21)).abs() < 1e-12);
    }

    #[test]
    fn test_loss_table_portfolio_is_weighted_sum() {
        // One simulation, two assets: asset 0 loses, asset 1 gains.
        let matrix = vec![vec![-0.5, 0.25]];
        let table = loss_table(&[matrix], &[0.4, 0.6]);
        let asset_losses = [1.0 - 0.5, 1.0 - 1.25];
        let expected = 0.4 * asset_losses[0] + 0.6 * asset_losses[1];
        assert!((table[0][0] - asset_losses[0]).abs() < 1e-12);
        assert!((table[0][1] - asset_losses[1]).abs() < 1e-12);
        assert!((table[0][2] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_var_equals_es_for_single_simulation() {
        let batch = vec![vec![vec![0.02, -0.03], vec![-0.01, 0.04]]];
        let weights = [0.5, 0.5];
        for alpha in [1, 5, 50, 99] {
            let var = compute_risk(&batch, &weights, alpha, RiskMeasure::ValueAtRisk);
            let es = compute_risk(&batch, &weights, alpha, RiskMeasure::ExpectedShortfall);
            assert_eq!(var, es);
        }
    }

    #[test]
    fn test_non_negative_returns_imply_non_positive_loss() {
        let batch = vec![
            vec![vec![0.0, 0.01], vec![0.02, 0.0]],
            vec![vec![0.03, 0.03], vec![0.0, 0.0]],
        ];
        let table = loss_table(&batch, &[0.5, 0.5]);
        for row in &table {
            assert!(row[2] <= 0.0, "portfolio loss {} should be <= 0", row[2]);
        }
    }
}
