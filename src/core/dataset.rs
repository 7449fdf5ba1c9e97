// src/core/dataset.rs
use crate::types::{Bar, Field, InstrumentSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// All instruments aligned on the union of their dates.
///
/// Outer key is the clean symbol, inner key a [`Field`], rows are dates in
/// ascending order. A `None` cell means the instrument had no bar that day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedDataset {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<Bar>>>,
}

impl CombinedDataset {
    pub fn from_series(series: Vec<InstrumentSeries>) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.bars().iter().map(|b| b.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = BTreeMap::new();
        for s in series {
            let mut column = vec![None; dates.len()];
            for bar in s.bars() {
                if let Ok(row) = dates.binary_search(&bar.date) {
                    column[row] = Some(*bar);
                }
            }
            columns.insert(s.symbol, column);
        }

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.dates.is_empty()
    }

    /// `(rows, columns)` counting every [`Field`] of every instrument.
    pub fn shape(&self) -> (usize, usize) {
        (self.dates.len(), self.columns.len() * Field::ALL.len())
    }

    /// One field of one instrument, aligned to [`Self::dates`].
    pub fn field(&self, symbol: &str, field: Field) -> Option<Vec<Option<f64>>> {
        self.columns
            .get(symbol)
            .map(|col| col.iter().map(|cell| cell.map(|b| b.field(field))).collect())
    }

    /// The bars the instrument actually has, in date order.
    pub fn bars(&self, symbol: &str) -> Option<Vec<Bar>> {
        self.columns
            .get(symbol)
            .map(|col| col.iter().flatten().copied().collect())
    }

    /// Close prices of the present rows only.
    pub fn closes(&self, symbol: &str) -> Option<Vec<f64>> {
        self.columns
            .get(symbol)
            .map(|col| col.iter().flatten().map(|b| b.close).collect())
    }
}
