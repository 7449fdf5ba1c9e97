// src/connectors/bitfinex.rs
use crate::config::ExchangeConfig;
use crate::connectors::messages::{BitfinexCandle, PairListResponse};
use crate::connectors::traits::ExchangeClient;
use crate::error::ConnectorError;
use crate::types::Candle;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

const PAIR_LIST_PATH: &str = "/v2/conf/pub:list:pair:exchange";

/// Public (unauthenticated) Bitfinex REST client.
pub struct BitfinexClient {
    http_client: Client,
    base_rest_url: Url,
}

impl BitfinexClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ConnectorError> {
        let http_client = Client::builder()
            .user_agent(concat!("crypto_screener/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_rest_url: Url::parse(&config.base_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConnectorError> {
        Ok(self.base_rest_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ConnectorError> {
        let body = self
            .http_client
            .get(url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        decode(&body)
    }
}

/// Bitfinex reports some failures as `["error", code, "message"]` with a 200.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ConnectorError> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(120).collect();
        ConnectorError::Payload(format!("{} in {}", e, preview))
    })
}

#[async_trait]
impl ExchangeClient for BitfinexClient {
    async fn list_pairs(&self) -> Result<Vec<String>, ConnectorError> {
        let url = self.endpoint(PAIR_LIST_PATH)?;
        let resp: PairListResponse = self.get_json(url, &[]).await?;

        let pairs = resp.into_pairs();
        if pairs.is_empty() {
            return Err(ConnectorError::Payload("pair list is empty".to_string()));
        }
        Ok(pairs)
    }

    async fn fetch_daily_candles(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, ConnectorError> {
        let url = self.endpoint(&format!("/v2/candles/trade:1D:{}/hist", symbol))?;
        debug!("GET {} limit={}", url, limit);

        let rows: Vec<BitfinexCandle> = self
            .get_json(url, &[("limit", limit.to_string())])
            .await?;

        Ok(rows.into_iter().map(Candle::from).collect())
    }
}
