// src/core/assembler.rs
use crate::core::dataset::CombinedDataset;
use crate::error::{ScreenerError, StoreError};
use crate::storage::CoinStore;
use tracing::{info, warn};

/// Loads every persisted series from the store into one combined dataset.
///
/// Unparsable files abort the stage; empty files are skipped with a warning.
pub fn assemble(store: &CoinStore) -> Result<CombinedDataset, ScreenerError> {
    let entries = store.list_series()?;
    if entries.is_empty() {
        return Err(StoreError::EmptyStore(store.dir().to_path_buf()).into());
    }

    let mut series = Vec::with_capacity(entries.len());
    for (symbol, path) in entries {
        let s = store.read_series(&symbol, &path)?;
        if s.is_empty() {
            warn!("{}: stored series has no bars, skipping", symbol);
            continue;
        }
        series.push(s);
    }

    let dataset = CombinedDataset::from_series(series);
    if dataset.is_empty() {
        return Err(StoreError::EmptyStore(store.dir().to_path_buf()).into());
    }

    let (rows, cols) = dataset.shape();
    info!("Combined dataset size: {} rows x {} columns", rows, cols);
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, InstrumentSeries};
    use chrono::NaiveDate;
    use std::fs;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            close,
            high: close * 1.1,
            low: close * 0.9,
            mts: 0,
            open: close,
            volume: 3.0,
        }
    }

    fn seeded_store(dir: &std::path::Path) -> CoinStore {
        let store = CoinStore::new(dir);
        store
            .write_series("tBTCUSD", &InstrumentSeries::new("BTCUSD", vec![bar(1, 100.0), bar(2, 110.0)]))
            .unwrap();
        store
            .write_series("tSOL:USD", &InstrumentSeries::new("SOLUSD", vec![bar(2, 20.0), bar(3, 21.0)]))
            .unwrap();
        fs::write(dir.join("notes.csv"), "ignored").unwrap();
        store
    }

    #[test]
    fn assembles_conforming_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let dataset = assemble(&store).unwrap();
        assert_eq!(dataset.symbols().collect::<Vec<_>>(), vec!["BTCUSD", "SOLUSD"]);
        assert_eq!(dataset.dates().len(), 3);
    }

    #[test]
    fn reassembling_an_unchanged_store_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        assert_eq!(assemble(&store).unwrap(), assemble(&store).unwrap());
    }

    #[test]
    fn empty_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = CoinStore::new(dir.path());
        assert!(matches!(
            assemble(&store),
            Err(ScreenerError::Store(StoreError::EmptyStore(_)))
        ));
    }

    #[test]
    fn malformed_file_fails_the_stage() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());
        fs::write(dir.path().join("tBROKENUSD.csv"), "date,close\nnot-a-date,1\n").unwrap();
        assert!(matches!(
            assemble(&store),
            Err(ScreenerError::Store(StoreError::Csv { .. }))
        ));
    }
}
