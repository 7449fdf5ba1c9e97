// src/storage/artifacts.rs
use crate::error::StoreError;
use crate::types::{Allocation, RankedCandidate};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Writes the keepers list, one symbol per line.
pub fn write_keepers(path: &Path, keepers: &[String]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut body = String::new();
    for symbol in keepers {
        body.push_str(symbol);
        body.push('\n');
    }
    fs::write(path, body).map_err(|e| StoreError::io(path, e))
}

/// Reads the keepers list. A missing file yields `None`; blank lines are ignored.
pub fn read_keepers(path: &Path) -> Result<Option<Vec<String>>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    Ok(Some(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Date-indexed table with one column per symbol; missing values are empty cells.
pub fn write_close_table(
    path: &Path,
    dates: &[NaiveDate],
    columns: &[(String, Vec<Option<f64>>)],
) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| StoreError::csv(path, e))?;

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("date".to_string());
    header.extend(columns.iter().map(|(symbol, _)| symbol.clone()));
    writer.write_record(&header).map_err(|e| StoreError::csv(path, e))?;

    for (row, date) in dates.iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(date.format("%Y-%m-%d").to_string());
        for (_, values) in columns {
            record.push(match values.get(row).copied().flatten() {
                Some(v) => v.to_string(),
                None => String::new(),
            });
        }
        writer.write_record(&record).map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}

pub fn write_rankings(path: &Path, ranked: &[RankedCandidate]) -> Result<(), StoreError> {
    write_rows(path, ranked)
}

#[derive(Debug, Serialize)]
struct AllocationRow<'a> {
    symbol: &'a str,
    weight: f64,
    shares: u64,
    latest_price: Decimal,
    dollars: Decimal,
}

pub fn write_allocation(path: &Path, allocation: &Allocation) -> Result<(), StoreError> {
    let rows: Vec<AllocationRow<'_>> = allocation
        .holdings
        .iter()
        .map(|h| AllocationRow {
            symbol: &h.symbol,
            weight: h.weight,
            shares: h.shares,
            latest_price: h.latest_price,
            dollars: h.dollars(),
        })
        .collect();
    write_rows(path, &rows)
}

pub(crate) fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| StoreError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}
