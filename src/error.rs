// src/error.rs
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the exchange.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected response payload: {0}")]
    Payload(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

/// Failures reading or writing on-disk artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No instrument series found in {0}")]
    EmptyStore(PathBuf),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{symbol}: need at least 2 daily returns, got {returns}")]
    InsufficientHistory { symbol: String, returns: usize },

    #[error("{symbol}: invalid return distribution: {message}")]
    InvalidDistribution { symbol: String, message: String },

    #[error("Simulation requires at least one path and one day")]
    EmptyRun,
}

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("No assets to optimize")]
    NoAssets,

    #[error("{0}: not enough price history to estimate returns")]
    InsufficientHistory(String),

    #[error("No asset has an expected return above the risk-free rate {risk_free_rate:.4} (best {best:.4})")]
    NoExcessReturn { best: f64, risk_free_rate: f64 },

    #[error("{0}: latest price is missing or not positive")]
    InvalidPrice(String),

    #[error("Cannot buy a single unit: need {required}, have {available} (short {shortfall})")]
    Infeasible {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },
}

/// Stage-level failures surfaced to the operator.
#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error("No instrument has a positive realized return")]
    NoPositiveReturns,

    #[error("No candidates: {0}")]
    NoCandidates(String),

    #[error("Kept symbols missing from the combined dataset: {}", .0.join(", "))]
    UnknownSymbols(Vec<String>),
}
