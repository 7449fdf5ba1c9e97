// src/connectors/messages.rs
use crate::types::Candle;
use serde::Deserialize;

/// Candle row from `/v2/candles/trade:1D:{symbol}/hist`.
/// Bitfinex sends it positionally: `[MTS, OPEN, CLOSE, HIGH, LOW, VOLUME]`.
#[derive(Debug, Deserialize)]
pub struct BitfinexCandle(pub i64, pub f64, pub f64, pub f64, pub f64, pub f64);

impl From<BitfinexCandle> for Candle {
    fn from(raw: BitfinexCandle) -> Self {
        let BitfinexCandle(mts, open, close, high, low, volume) = raw;
        Candle {
            mts,
            open,
            close,
            high,
            low,
            volume,
        }
    }
}

/// `/v2/conf/pub:list:pair:exchange` wraps the pair names in an outer array.
#[derive(Debug, Deserialize)]
pub struct PairListResponse(pub Vec<Vec<String>>);

impl PairListResponse {
    pub fn into_pairs(self) -> Vec<String> {
        self.0.into_iter().next().unwrap_or_default()
    }
}
