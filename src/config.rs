// src/config.rs

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl ExchangeConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Entries with mean/median at or above this are treated as degenerate.
    pub ratio_threshold: f64,
    pub seed: Option<u64>,
    /// Number of paths written to each ensemble chart file.
    pub plot_paths: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptimizerConfig {
    pub l2_gamma: f64,
    pub risk_free_rate: f64,
    pub frequency: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub store_dir: PathBuf,
    pub good_coins_file: PathBuf,
    pub rankings_file: PathBuf,
    pub keepers_file: PathBuf,
    pub sim_plot_dir: PathBuf,
    pub mean_median_plot_dir: PathBuf,
    pub weights_chart_file: PathBuf,
    pub allocation_file: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub lookback_days: u32,
    pub forced_tickers: Vec<String>,
    pub sim_years: u32,
    pub portfolio_size: usize,
    pub num_sims: usize,
    pub amount_to_invest: Decimal,
    pub exchange: ExchangeConfig,
    pub simulation: SimulationConfig,
    pub optimizer: OptimizerConfig,
    pub paths: PathsConfig,
}

impl AppConfig {
    /// Defaults, then the optional settings file, then `APP_*` variables
    /// (`APP_EXCHANGE__REQUEST_DELAY_MS`, `APP_FORCED_TICKERS=BTCUSD,ETHUSD`).
    pub fn load(settings_file: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name(settings_file).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("forced_tickers"),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("lookback_days", 365)?
            .set_default("forced_tickers", Vec::<String>::new())?
            .set_default("sim_years", 5)?
            .set_default("portfolio_size", 5)?
            .set_default("num_sims", 500)?
            .set_default("amount_to_invest", "10000")?
            .set_default("exchange.base_url", "https://api-pub.bitfinex.com")?
            .set_default("exchange.request_delay_ms", 4000)?
            .set_default("exchange.request_timeout_secs", 30)?
            .set_default("simulation.ratio_threshold", 50.0)?
            .set_default("simulation.plot_paths", 100)?
            .set_default("optimizer.l2_gamma", 0.1)?
            .set_default("optimizer.risk_free_rate", 0.02)?
            .set_default("optimizer.frequency", 365.0)?
            .set_default("paths.store_dir", "coin_csvs")?
            .set_default("paths.good_coins_file", "good_coins.csv")?
            .set_default("paths.rankings_file", "rankings.csv")?
            .set_default("paths.keepers_file", "keepers.txt")?
            .set_default("paths.sim_plot_dir", "monte_carlo_plots")?
            .set_default("paths.mean_median_plot_dir", "mean_median_plots")?
            .set_default("paths.weights_chart_file", "portfolio_weights.csv")?
            .set_default("paths.allocation_file", "allocation.csv")?
            .set_default("paths.log_dir", "logs")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));
        if self.lookback_days == 0 {
            return invalid("lookback_days must be positive");
        }
        if self.sim_years == 0 {
            return invalid("sim_years must be positive");
        }
        if self.num_sims == 0 {
            return invalid("num_sims must be positive");
        }
        if self.amount_to_invest <= Decimal::ZERO {
            return invalid("amount_to_invest must be positive");
        }
        if self.optimizer.frequency.is_nan() || self.optimizer.frequency <= 0.0 {
            return invalid("optimizer.frequency must be positive");
        }
        if self.optimizer.l2_gamma < 0.0 {
            return invalid("optimizer.l2_gamma must not be negative");
        }
        Ok(())
    }

    /// Crypto trades every calendar day.
    pub fn horizon_days(&self) -> usize {
        365 * self.sim_years as usize
    }
}
