// src/core/portfolio.rs
use crate::config::AppConfig;
use crate::core::dataset::CombinedDataset;
use crate::error::{OptimizerError, ScreenerError};
use crate::optimizer::expected_returns::{latest_prices, mean_historical_return};
use crate::optimizer::risk_models::ledoit_wolf;
use crate::optimizer::{clean_weights, portfolio_performance, DiscreteAllocation, PortfolioOptimizer, PriceFrame};
use crate::reporting::{ChartWriter, PortfolioReport};
use crate::storage::artifacts;
use crate::types::Field;
use crate::utils::precision::to_decimal;
use std::collections::HashSet;
use tracing::{info, warn};

/// Reads the keepers artifact and turns it into a max-Sharpe portfolio with a
/// whole-unit allocation of `amount_to_invest`.
pub struct PortfolioBuilder<'a, O> {
    config: &'a AppConfig,
    optimizer: &'a O,
}

impl<'a, O> PortfolioBuilder<'a, O>
where
    O: PortfolioOptimizer,
{
    pub fn new(config: &'a AppConfig, optimizer: &'a O) -> Self {
        Self { config, optimizer }
    }

    pub fn build(&self, dataset: &CombinedDataset) -> Result<PortfolioReport, ScreenerError> {
        // 1. Keepers
        let keepers = self.load_keepers()?;
        let missing: Vec<String> = keepers
            .iter()
            .filter(|s| !dataset.contains(s))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ScreenerError::UnknownSymbols(missing));
        }

        // 2. Close prices of the keepers
        let frame = close_frame(dataset, &keepers);

        // 3. Estimates and weights
        let frequency = self.config.optimizer.frequency;
        let mu = mean_historical_return(&frame, frequency)?;
        let risk = ledoit_wolf(&frame, frequency)?;
        info!("Ledoit-Wolf shrinkage: {:.4}", risk.shrinkage);

        let raw = self.optimizer.optimize(&mu, &risk.covariance)?;
        let cleaned = clean_weights(&raw);
        let performance = portfolio_performance(
            &cleaned,
            &mu,
            &risk.covariance,
            self.optimizer.risk_free_rate(),
        );
        let weights: Vec<(String, f64)> = keepers.iter().cloned().zip(cleaned).collect();
        for (symbol, weight) in &weights {
            info!("weight {}: {:.5}", symbol, weight);
        }

        let charts = ChartWriter::new(
            &self.config.paths.sim_plot_dir,
            &self.config.paths.mean_median_plot_dir,
            self.config.simulation.plot_paths,
        );
        charts.write_weights(&self.config.paths.weights_chart_file, &weights)?;

        // 4. Whole-unit allocation at the latest prices
        let mut prices = Vec::with_capacity(keepers.len());
        for (symbol, price) in keepers.iter().zip(latest_prices(&frame)) {
            let price = price
                .filter(|p| *p > 0.0)
                .and_then(to_decimal)
                .ok_or_else(|| OptimizerError::InvalidPrice(symbol.clone()))?;
            prices.push((symbol.clone(), price));
        }
        let allocation =
            DiscreteAllocation::new(weights.clone(), prices, self.config.amount_to_invest).greedy_portfolio()?;
        artifacts::write_allocation(&self.config.paths.allocation_file, &allocation)?;
        info!(
            "Allocated {} of {}, leftover {}",
            allocation.spent(),
            self.config.amount_to_invest,
            allocation.leftover
        );

        Ok(PortfolioReport {
            weights,
            performance,
            allocation,
        })
    }

    fn load_keepers(&self) -> Result<Vec<String>, ScreenerError> {
        let path = &self.config.paths.keepers_file;
        let keepers = artifacts::read_keepers(path)?
            .ok_or_else(|| ScreenerError::NoCandidates(format!("{} not found", path.display())))?;
        if keepers.is_empty() {
            return Err(ScreenerError::NoCandidates(format!("{} is empty", path.display())));
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(keepers.len());
        for symbol in keepers {
            if seen.insert(symbol.clone()) {
                unique.push(symbol);
            } else {
                warn!("{} listed more than once in keepers, using it once", symbol);
            }
        }
        Ok(unique)
    }
}

/// Close prices of `symbols` aligned on the dataset dates.
pub fn close_frame(dataset: &CombinedDataset, symbols: &[String]) -> PriceFrame {
    let columns: Vec<Vec<Option<f64>>> = symbols
        .iter()
        .map(|s| dataset.field(s, Field::Close).unwrap_or_default())
        .collect();
    let rows = (0..dataset.dates().len())
        .map(|row| {
            columns
                .iter()
                .map(|col| col.get(row).copied().flatten())
                .collect()
        })
        .collect();
    PriceFrame {
        symbols: symbols.to_vec(),
        rows,
    }
}
