//! Portfolio construction: return and risk estimates, max-Sharpe weights and
//! the conversion of weights into whole units.

pub mod discrete_allocation;
pub mod efficient_frontier;
pub mod expected_returns;
pub mod risk_models;

pub use discrete_allocation::DiscreteAllocation;
pub use efficient_frontier::MaxSharpeOptimizer;

use crate::error::OptimizerError;
use crate::types::PortfolioPerformance;

/// Close prices of the kept symbols, one row per date, one column per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrame {
    pub symbols: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl PriceFrame {
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |row| row[index])
    }
}

/// Turns expected returns and a covariance matrix into long-only weights summing to 1.
pub trait PortfolioOptimizer {
    fn optimize(
        &self,
        expected_returns: &[f64],
        covariance: &[Vec<f64>],
    ) -> Result<Vec<f64>, OptimizerError>;

    fn risk_free_rate(&self) -> f64;
}

pub fn portfolio_return(weights: &[f64], expected_returns: &[f64]) -> f64 {
    weights.iter().zip(expected_returns).map(|(w, r)| w * r).sum()
}

pub fn portfolio_variance(weights: &[f64], covariance: &[Vec<f64>]) -> f64 {
    let n = weights.len();
    let mut var = 0.0;
    for i in 0..n {
        for j in 0..n {
            var += weights[i] * weights[j] * covariance[i][j];
        }
    }
    var
}

pub fn portfolio_performance(
    weights: &[f64],
    expected_returns: &[f64],
    covariance: &[Vec<f64>],
    risk_free_rate: f64,
) -> PortfolioPerformance {
    let expected_return = portfolio_return(weights, expected_returns);
    let volatility = portfolio_variance(weights, covariance).max(0.0).sqrt();
    let sharpe_ratio = if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    };
    PortfolioPerformance {
        expected_return,
        volatility,
        sharpe_ratio,
    }
}

/// Zeroes weights below `1e-4`, rounds the rest to 5 dp and renormalises.
pub fn clean_weights(weights: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = weights
        .iter()
        .map(|&w| if w.abs() < 1e-4 { 0.0 } else { (w * 1e5).round() / 1e5 })
        .collect();
    let total: f64 = cleaned.iter().sum();
    if total > 0.0 {
        cleaned.iter().map(|w| w / total).collect()
    } else {
        cleaned
    }
}
