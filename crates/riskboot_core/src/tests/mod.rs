//! Integration tests for the risk engine
//!
//! Tests are organized by topic:
//! - `panel` - Panel filtering, category selection, weight management
//! - `bootstrap` - The three resampling methods and their distributions
//! - `risk` - VaR/ES measurement through the engine
//! - `erc` - The ERC solver and multi-seed ensembles

mod risk;

use jiff::ToSpan;
use jiff::civil::date;

use crate::panel::PricePanel;

/// Build a one-category panel from parallel per-ticker price series.
///
/// All series must have the same length; day `i` of every series lands on
/// the same date, so the cross-sections are complete by construction.
pub(crate) fn panel_from_prices(category: &str, series: &[(&str, Vec<f64>)]) -> PricePanel {
    let mut panel = PricePanel::new();
    let start = date(2024, 1, 1);
    let num_days = series[0].1.len();
    for day in 0..num_days {
        let d = start.saturating_add((day as i64).days());
        for (ticker, prices) in series {
            panel.insert(d, category, *ticker, prices[day]);
        }
    }
    panel
}

/// Turn a return sequence into a price series starting at 100.
pub(crate) fn prices_from_returns(returns: &[f64]) -> Vec<f64> {
    let mut prices = vec![100.0];
    for r in returns {
        let last = *prices.last().unwrap();
        prices.push(last * (1.0 + r));
    }
    prices
}

/// Deterministic two-asset panel with identical marginals and zero
/// cross-correlation: A cycles `[+r, +r, -r, -r]`, B cycles `[+r, -r, +r, -r]`.
pub(crate) fn symmetric_two_asset_panel(num_steps: usize, r: f64) -> PricePanel {
    let pattern_a = [r, r, -r, -r];
    let pattern_b = [r, -r, r, -r];
    let returns_a: Vec<f64> = (0..num_steps).map(|i| pattern_a[i % 4]).collect();
    let returns_b: Vec<f64> = (0..num_steps).map(|i| pattern_b[i % 4]).collect();
    panel_from_prices(
        "Close",
        &[
            ("AAA", prices_from_returns(&returns_a)),
            ("BBB", prices_from_returns(&returns_b)),
        ],
    )
}
