// src/connectors/traits.rs
use crate::error::ConnectorError;
use crate::types::Candle;
use async_trait::async_trait;

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Pair names of the exchange's trading listing, e.g. `BTCUSD` or `AVAX:USD`.
    async fn list_pairs(&self) -> Result<Vec<String>, ConnectorError>;

    /// Up to `limit` most recent daily candles for a trading symbol (`tBTCUSD`).
    /// An empty vector means the exchange has no data for it.
    async fn fetch_daily_candles(&self, symbol: &str, limit: u32)
        -> Result<Vec<Candle>, ConnectorError>;
}
