//! Command-line ERC solver over CSV price panels.
//!
//! Loads a long-format price panel, runs the configured bootstrap method and
//! solves for Equal-Risk-Contribution weights, then reports the weights and
//! marginal Expected Shortfall contributions at the solution.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use riskboot_core::{
    BootstrapMethod, EngineConfig, ErcConfig, MonteCarloEngine, ProgressCallback, RiskMeasure,
};
use tracing_subscriber::EnvFilter;

mod loader;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Uniform block bootstrap
    Vanilla,
    /// Badness-weighted block bootstrap
    LambdaBias,
    /// Stationary bootstrap with loss tilt
    Stationary,
}

#[derive(Debug, Parser)]
#[command(
    name = "riskboot",
    about = "Bootstrap-based portfolio tail risk and ERC weights"
)]
struct Cli {
    /// CSV panel with date,category,ticker,value rows
    #[arg(long)]
    data: PathBuf,

    /// Panel category to select (e.g. closing prices)
    #[arg(long, default_value = "Close")]
    category: String,

    /// Resampling method
    #[arg(long, value_enum, default_value_t = MethodArg::Vanilla)]
    method: MethodArg,

    /// Block size (vanilla / lambda-bias) or mean block length (stationary)
    #[arg(long, default_value_t = 10)]
    block_size: usize,

    /// Loss-bias strength in [0, 1] (lambda-bias only)
    #[arg(long, default_value_t = 0.7)]
    lambda: f64,

    /// Loss-tilt severity >= 0 (stationary only)
    #[arg(long, default_value_t = 30.0)]
    theta: f64,

    /// Simulated matrices per batch
    #[arg(long, default_value_t = 1_000)]
    simulations: usize,

    /// Resampled horizon length per simulation
    #[arg(long, default_value_t = 252)]
    samples: usize,

    /// Tail level as an integer percent in (0, 100)
    #[arg(long, default_value_t = 5)]
    alpha: u32,

    /// Seed for a reproducible run (entropy-seeded when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ERC iterations
    #[arg(long, default_value_t = 50)]
    iterations: usize,

    /// Relative tolerance on contribution dispersion
    #[arg(long, default_value_t = 1e-4)]
    tolerance: f64,

    /// Damping factor in (0, 1]
    #[arg(long, default_value_t = 0.5)]
    damping: f64,

    /// Emit the full solution (history included) as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log each solver iteration
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn bootstrap_method(&self) -> BootstrapMethod {
        match self.method {
            MethodArg::Vanilla => BootstrapMethod::Vanilla {
                block_size: self.block_size,
            },
            MethodArg::LambdaBias => BootstrapMethod::LambdaBias {
                block_size: self.block_size,
                lambda: self.lambda,
            },
            MethodArg::Stationary => BootstrapMethod::Stationary {
                mean_block_len: self.block_size,
                theta: self.theta,
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "riskboot=debug,riskboot_core=info"
    } else {
        "riskboot=info,riskboot_core=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let panel = loader::load_panel(&cli.data)?;
    let config = EngineConfig {
        num_simulations: cli.simulations,
        num_samples: cli.samples,
        alpha_pct: cli.alpha,
    };
    let mut engine = MonteCarloEngine::new(panel, config)?;
    if let Some(seed) = cli.seed {
        engine.set_seed(seed);
    }
    engine.select_category(&cli.category)?;
    let tickers = engine.tickers().to_vec();
    tracing::info!(
        "selected category {:?}: {} assets over {} return steps",
        cli.category,
        tickers.len(),
        engine.return_matrix().map_or(0, |m| m.num_steps())
    );

    let method = cli.bootstrap_method();
    let erc_config = ErcConfig {
        max_iterations: cli.iterations,
        tolerance: cli.tolerance,
        damping: cli.damping,
        ..Default::default()
    };
    let progress = cli.verbose.then(|| -> ProgressCallback {
        Box::new(|iteration, rel_dev, es| {
            tracing::info!(iteration, rel_dev, es, "erc iteration");
        })
    });

    let solution = engine.solve_erc(method, &erc_config, progress)?;

    // Measure once more at the solved weights so the report reflects them.
    engine.set_weights(&solution.weights)?;
    engine.run_simulation(method)?;
    let contributions = engine.compute_risk_contributions(RiskMeasure::ExpectedShortfall)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
        return Ok(());
    }

    let status = if solution.converged {
        "converged"
    } else {
        "iteration budget exhausted"
    };
    println!(
        "ERC solve: {status} after {} iterations (rel deviation {:.3e})",
        solution.iterations, solution.rel_deviation
    );
    for (ticker, (weight, contribution)) in tickers
        .iter()
        .zip(solution.weights.iter().zip(contributions.iter()))
    {
        println!("  {ticker:<10} weight {weight:>8.4}   es contribution {contribution:>10.6}");
    }
    println!("portfolio ES ({}% tail): {:.6}", cli.alpha, engine.portfolio_loss());

    Ok(())
}
