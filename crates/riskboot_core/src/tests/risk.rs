//! Tests for VaR/ES measurement through the engine.

use crate::bootstrap::BootstrapMethod;
use crate::engine::{EngineConfig, MonteCarloEngine};
use crate::error::{EngineError, StateError};
use crate::risk::RiskMeasure;

use super::{panel_from_prices, prices_from_returns};

fn seeded_engine(config: EngineConfig) -> MonteCarloEngine {
    let panel = panel_from_prices(
        "Close",
        &[
            (
                "AAA",
                prices_from_returns(&[0.01, -0.03, 0.02, 0.01, -0.02, 0.04, -0.01, 0.02]),
            ),
            (
                "BBB",
                prices_from_returns(&[-0.02, 0.01, 0.03, -0.01, 0.02, -0.03, 0.01, 0.00]),
            ),
        ],
    );
    let mut engine = MonteCarloEngine::new(panel, config).unwrap();
    engine.set_seed(99);
    engine.select_category("Close").unwrap();
    engine
}

#[test]
fn test_measurement_requires_simulation() {
    let mut engine = seeded_engine(EngineConfig::default());
    assert!(matches!(
        engine.compute_risk_contributions(RiskMeasure::ValueAtRisk),
        Err(EngineError::State(StateError::NoSimulation))
    ));
    assert_eq!(engine.portfolio_loss(), 0.0);
}

#[test]
fn test_contributions_are_per_asset_and_loss_is_retained() {
    let mut engine = seeded_engine(EngineConfig {
        num_simulations: 50,
        num_samples: 20,
        alpha_pct: 5,
    });
    engine
        .run_simulation(BootstrapMethod::Vanilla { block_size: 2 })
        .unwrap();

    let contributions = engine
        .compute_risk_contributions(RiskMeasure::ExpectedShortfall)
        .unwrap();
    assert_eq!(contributions.len(), 2);

    // Linear aggregation: the weight-scaled contributions sum back to the
    // retained portfolio figure.
    let portfolio = engine.portfolio_loss();
    let contribution_sum: f64 = contributions.iter().sum();
    assert!(
        (portfolio - contribution_sum).abs() < 1e-9,
        "portfolio {portfolio} vs contribution sum {contribution_sum}"
    );
}

#[test]
fn test_repeated_measurement_is_bit_identical() {
    let mut engine = seeded_engine(EngineConfig {
        num_simulations: 40,
        num_samples: 15,
        alpha_pct: 10,
    });
    engine
        .run_simulation(BootstrapMethod::Stationary {
            mean_block_len: 3,
            theta: 5.0,
        })
        .unwrap();

    let first = engine
        .compute_risk_contributions(RiskMeasure::ExpectedShortfall)
        .unwrap();
    let first_loss = engine.portfolio_loss();
    let second = engine
        .compute_risk_contributions(RiskMeasure::ExpectedShortfall)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first_loss, engine.portfolio_loss());
}

#[test]
fn test_all_gains_mean_non_positive_losses() {
    // Every historical return is >= 0, so every resampled path compounds to
    // a gain and every simulation's portfolio "loss" must be <= 0.
    let panel = panel_from_prices(
        "Close",
        &[
            ("AAA", prices_from_returns(&[0.01, 0.0, 0.02, 0.03, 0.01])),
            ("BBB", prices_from_returns(&[0.02, 0.01, 0.0, 0.01, 0.02])),
        ],
    );
    let mut engine = MonteCarloEngine::new(
        panel,
        EngineConfig {
            num_simulations: 30,
            num_samples: 10,
            alpha_pct: 5,
        },
    )
    .unwrap();
    engine.set_seed(7);
    engine.select_category("Close").unwrap();
    engine
        .run_simulation(BootstrapMethod::Vanilla { block_size: 2 })
        .unwrap();

    for measure in [RiskMeasure::ValueAtRisk, RiskMeasure::ExpectedShortfall] {
        engine.compute_risk_contributions(measure).unwrap();
        assert!(
            engine.portfolio_loss() <= 0.0,
            "portfolio loss {} should be <= 0 for all-gain returns",
            engine.portfolio_loss()
        );
    }
}

#[test]
fn test_var_equals_es_with_single_simulation() {
    for alpha_pct in [1, 5, 50, 95] {
        let mut engine = seeded_engine(EngineConfig {
            num_simulations: 1,
            num_samples: 12,
            alpha_pct,
        });
        engine
            .run_simulation(BootstrapMethod::Vanilla { block_size: 3 })
            .unwrap();

        let var = engine
            .compute_risk_contributions(RiskMeasure::ValueAtRisk)
            .unwrap();
        let var_loss = engine.portfolio_loss();
        let es = engine
            .compute_risk_contributions(RiskMeasure::ExpectedShortfall)
            .unwrap();

        assert_eq!(var, es);
        assert_eq!(var_loss, engine.portfolio_loss());
    }
}

#[test]
fn test_new_simulation_invalidates_risk_result() {
    let mut engine = seeded_engine(EngineConfig {
        num_simulations: 20,
        num_samples: 10,
        alpha_pct: 5,
    });
    engine
        .run_simulation(BootstrapMethod::Vanilla { block_size: 2 })
        .unwrap();
    engine
        .compute_risk_contributions(RiskMeasure::ExpectedShortfall)
        .unwrap();
    assert_ne!(engine.portfolio_loss(), 0.0);

    engine
        .run_simulation(BootstrapMethod::Vanilla { block_size: 2 })
        .unwrap();
    assert_eq!(engine.portfolio_loss(), 0.0);
}
