// src/core/fetcher.rs
use crate::connectors::traits::ExchangeClient;
use crate::error::{ConnectorError, ScreenerError};
use crate::storage::CoinStore;
use crate::types::{Bar, FetchSummary, InstrumentSeries};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Prefixes listed pairs with the trading namespace and keeps USD-quoted ones.
pub fn usd_trading_symbols(pairs: &[String]) -> Vec<String> {
    pairs
        .iter()
        .map(|pair| format!("t{}", pair))
        .filter(|symbol| CoinStore::sanitize(symbol).ends_with("USD"))
        .collect()
}

/// Downloads daily history for every USD pair into the coin store.
///
/// Requests run one at a time with a fixed wait before each. Empty
/// responses, request errors and timeouts only skip the instrument.
pub struct MarketDataFetcher<'a> {
    client: &'a dyn ExchangeClient,
    store: &'a CoinStore,
    request_delay: Duration,
    request_timeout: Duration,
}

impl<'a> MarketDataFetcher<'a> {
    pub fn new(
        client: &'a dyn ExchangeClient,
        store: &'a CoinStore,
        request_delay: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            store,
            request_delay,
            request_timeout,
        }
    }

    pub async fn pull(&self, lookback_days: u32) -> Result<FetchSummary, ScreenerError> {
        // the pair list has no skip path: expiry is fatal
        let pairs = timeout(self.request_timeout, self.client.list_pairs())
            .await
            .map_err(|_| ConnectorError::Timeout(self.request_timeout))??;
        let symbols = usd_trading_symbols(&pairs);
        info!(
            "{} of {} listed pairs are USD-quoted",
            symbols.len(),
            pairs.len()
        );

        let mut summary = FetchSummary {
            requested: symbols.len(),
            ..FetchSummary::default()
        };

        for symbol in &symbols {
            sleep(self.request_delay).await;

            match self.fetch_series(symbol, lookback_days).await {
                Some(series) => {
                    let path = self.store.write_series(symbol, &series)?;
                    debug!("{}: {} bars -> {}", symbol, series.len(), path.display());
                    summary.stored += 1;
                }
                None => summary.skipped += 1,
            }
        }

        info!(
            "Fetch finished: {} stored, {} skipped of {}",
            summary.stored, summary.skipped, summary.requested
        );
        Ok(summary)
    }

    async fn fetch_series(&self, symbol: &str, lookback_days: u32) -> Option<InstrumentSeries> {
        let request = self.client.fetch_daily_candles(symbol, lookback_days);
        let candles = match timeout(self.request_timeout, request).await {
            Ok(Ok(candles)) => candles,
            Ok(Err(e)) => {
                warn!("{}: request failed, skipping: {}", symbol, e);
                return None;
            }
            Err(_) => {
                warn!(
                    "{}: no response within {:?}, skipping",
                    symbol, self.request_timeout
                );
                return None;
            }
        };

        info!("{} {}", symbol, candles.len());
        if candles.is_empty() {
            return None;
        }

        let bars: Vec<Bar> = candles.iter().filter_map(Bar::from_candle).collect();
        let clean = CoinStore::sanitize(symbol);
        let clean = clean.strip_prefix('t').unwrap_or(&clean);
        let series = InstrumentSeries::new(clean, bars);
        (!series.is_empty()).then_some(series)
    }
}
