// src/core/engine.rs
use crate::config::AppConfig;
use crate::connectors::traits::ExchangeClient;
use crate::core::assembler::assemble;
use crate::core::dataset::CombinedDataset;
use crate::core::fetcher::MarketDataFetcher;
use crate::core::portfolio::PortfolioBuilder;
use crate::core::screener::ReturnScreener;
use crate::error::ScreenerError;
use crate::optimizer::PortfolioOptimizer;
use crate::reporting::PortfolioReport;
use crate::simulation::PathSimulator;
use crate::storage::CoinStore;
use crate::types::FetchSummary;
use tracing::info;

/// Runs the pipeline stages. Stages only hand data to each other through the
/// files under `config.paths`, so each one can also be run on its own.
pub struct ScreenerEngine<S, O> {
    config: AppConfig,
    client: Box<dyn ExchangeClient>,
    simulator: S,
    optimizer: O,
    store: CoinStore,
}

impl<S, O> ScreenerEngine<S, O>
where
    S: PathSimulator,
    O: PortfolioOptimizer,
{
    pub fn new(config: AppConfig, client: Box<dyn ExchangeClient>, simulator: S, optimizer: O) -> Self {
        let store = CoinStore::new(&config.paths.store_dir);
        Self {
            config,
            client,
            simulator,
            optimizer,
            store,
        }
    }

    /// Downloads every USD pair into the coin store.
    pub async fn pull(&self) -> Result<FetchSummary, ScreenerError> {
        info!("Stage: pull ({} days of history)", self.config.lookback_days);
        let fetcher = MarketDataFetcher::new(
            self.client.as_ref(),
            &self.store,
            self.config.exchange.request_delay(),
            self.config.exchange.request_timeout(),
        );
        fetcher.pull(self.config.lookback_days).await
    }

    /// Rebuilds the combined dataset from the coin store.
    pub fn import(&self) -> Result<CombinedDataset, ScreenerError> {
        info!("Stage: import from {}", self.store.dir().display());
        assemble(&self.store)
    }

    /// Filters, simulates and ranks; writes and returns the keepers.
    pub fn simulate(&mut self, dataset: &CombinedDataset) -> Result<Vec<String>, ScreenerError> {
        info!("Stage: simulate");
        ReturnScreener::new(&self.config, &mut self.simulator).run(dataset)
    }

    /// Optimizes and allocates over the persisted keepers.
    pub fn portfolio(&self, dataset: &CombinedDataset) -> Result<PortfolioReport, ScreenerError> {
        info!("Stage: portfolio");
        PortfolioBuilder::new(&self.config, &self.optimizer).build(dataset)
    }

    /// All four stages in order.
    pub async fn run(&mut self) -> Result<PortfolioReport, ScreenerError> {
        self.pull().await?;
        let dataset = self.import()?;
        self.simulate(&dataset)?;
        self.portfolio(&dataset)
    }
}
