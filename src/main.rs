// src/main.rs
use crate::config::AppConfig;
use crate::connectors::bitfinex::BitfinexClient;
use crate::core::engine::ScreenerEngine;
use crate::error::ScreenerError;
use crate::optimizer::MaxSharpeOptimizer;
use crate::simulation::MonteCarloSimulator;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod connectors;
mod core;
mod error;
mod optimizer;
mod reporting;
mod simulation;
mod storage;
mod types;
mod utils;

#[derive(Parser)]
#[command(
    name = "crypto_screener",
    version,
    about = "Screens USD crypto pairs and builds a max-Sharpe portfolio"
)]
struct Cli {
    /// Settings file (toml/yaml/json), extension optional
    #[arg(long, global = true, default_value = "Settings")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Download daily history for every USD pair
    Pull,
    /// Load the coin store and report the combined dataset
    Import,
    /// Filter, simulate and rank; writes the keepers list
    Simulate,
    /// Optimize and allocate over the keepers list
    Portfolio,
    /// All stages in order (default)
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&cli.config)?;

    // 2. Logging: stdout plus a daily file; the guard flushes on exit
    let file_appender = tracing_appender::rolling::daily(&config.paths.log_dir, "screener.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    let command = cli.command.unwrap_or(Command::Run);

    println!("========================================");
    println!("       CRYPTO SCREENER - v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("Lookback:  {} days", config.lookback_days);
    println!("Horizon:   {} years x {} paths", config.sim_years, config.num_sims);
    println!("Portfolio: {} + {:?}", config.portfolio_size, config.forced_tickers);
    println!("Budget:    ${}", config.amount_to_invest);
    println!("========================================");

    // 3. Initialize Components
    let client = BitfinexClient::new(&config.exchange)?;
    let simulator = MonteCarloSimulator::new(config.simulation.seed);
    let optimizer = MaxSharpeOptimizer::new(&config.optimizer);
    let mut engine = ScreenerEngine::new(config, Box::new(client), simulator, optimizer);

    // 4. Run the selected stage
    let result = match command {
        Command::Pull => engine.pull().await.map(|summary| {
            info!(
                "Pulled {} of {} instruments ({} skipped)",
                summary.stored, summary.requested, summary.skipped
            );
        }),
        Command::Import => engine.import().map(|dataset| {
            let (rows, cols) = dataset.shape();
            info!("Dataset ready: {} rows x {} columns", rows, cols);
        }),
        Command::Simulate => engine
            .import()
            .and_then(|dataset| engine.simulate(&dataset))
            .map(|keepers| info!("{} keepers written", keepers.len())),
        Command::Portfolio => engine
            .import()
            .and_then(|dataset| engine.portfolio(&dataset))
            .map(|report| println!("{}", report)),
        Command::Run => engine.run().await.map(|report| println!("{}", report)),
    };

    Ok(finish(result))
}

/// Logs a stage failure once and maps it to the exit status; returning it
/// through `main` as well would print it a second time.
fn finish(result: Result<(), ScreenerError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal pipeline error: {}", e);
            ExitCode::FAILURE
        }
    }
}
