// src/storage/coin_store.rs
use crate::error::StoreError;
use crate::types::{Bar, InstrumentSeries};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TRADING_PREFIX: char = 't';
const EXTENSION: &str = ".csv";

/// One CSV file per instrument, named after the sanitized trading symbol
/// (`tBTCUSD.csv`, `tAVAXUSD.csv`).
#[derive(Debug, Clone)]
pub struct CoinStore {
    dir: PathBuf,
}

impl CoinStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `tAVAX:USD` -> `tAVAXUSD`
    pub fn sanitize(symbol: &str) -> String {
        symbol.replace(':', "")
    }

    /// Recovers the clean symbol from a store file name, if it follows the
    /// trading-symbol naming convention.
    pub fn symbol_from_file_name(name: &str) -> Option<&str> {
        let stem = name.strip_suffix(EXTENSION)?;
        let symbol = stem.strip_prefix(TRADING_PREFIX)?;
        (!symbol.is_empty()).then_some(symbol)
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}{}", Self::sanitize(symbol), EXTENSION))
    }

    /// Overwrites the instrument's file with its full history.
    pub fn write_series(&self, trading_symbol: &str, series: &InstrumentSeries) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.path_for(trading_symbol);

        let mut writer = csv::Writer::from_path(&path).map_err(|e| StoreError::csv(&path, e))?;
        for bar in series.bars() {
            writer.serialize(bar).map_err(|e| StoreError::csv(&path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    /// Lists `(clean symbol, path)` for every conforming file, sorted by file name.
    pub fn list_series(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::EmptyStore(self.dir.clone()))
            }
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(symbol) = Self::symbol_from_file_name(name) {
                found.push((symbol.to_string(), entry.path()));
            }
        }
        found.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(found)
    }

    /// Loads one persisted series; any unparsable row fails the whole read.
    pub fn read_series(&self, symbol: &str, path: &Path) -> Result<InstrumentSeries, StoreError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| StoreError::csv(path, e))?;
        let bars = reader
            .deserialize::<Bar>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::csv(path, e))?;
        Ok(InstrumentSeries::new(symbol, bars))
    }
}
