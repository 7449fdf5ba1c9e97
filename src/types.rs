// src/types.rs
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw daily candle as returned by the exchange (epoch-millisecond stamp).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub mts: i64,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// One persisted daily bar. Field order is the column order of the
/// per-instrument CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub mts: i64,
    pub open: f64,
    pub volume: f64,
}

impl Bar {
    /// Converts an exchange candle, dropping candles whose stamp is out of range.
    pub fn from_candle(candle: &Candle) -> Option<Self> {
        let date = DateTime::from_timestamp_millis(candle.mts)?.date_naive();
        Some(Self {
            date,
            close: candle.close,
            high: candle.high,
            low: candle.low,
            mts: candle.mts,
            open: candle.open,
            volume: candle.volume,
        })
    }

    pub fn field(&self, field: Field) -> f64 {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Volume => self.volume,
        }
    }
}

/// Inner key of the combined dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Open, Field::High, Field::Low, Field::Close, Field::Volume];
}

/// Daily history of one instrument. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

impl InstrumentSeries {
    /// Sorts bars by date; on duplicate dates the bar seen last wins.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Terminal simulation statistics for one surviving instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStats {
    pub symbol: String,
    pub mean: f64,
    pub median: f64,
}

/// Row of the ranking artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub symbol: String,
    pub mean: f64,
    pub median: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioPerformance {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Integer share count for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub weight: f64,
    pub shares: u64,
    pub latest_price: Decimal,
}

impl Holding {
    pub fn dollars(&self) -> Decimal {
        Decimal::from(self.shares) * self.latest_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub holdings: Vec<Holding>,
    pub leftover: Decimal,
}

impl Allocation {
    pub fn spent(&self) -> Decimal {
        self.holdings.iter().map(Holding::dollars).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub requested: usize,
    pub stored: usize,
    pub skipped: usize,
}
