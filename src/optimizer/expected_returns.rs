// src/optimizer/expected_returns.rs
use crate::error::OptimizerError;
use crate::optimizer::PriceFrame;

/// Carries the last seen price forward over gaps; leading gaps stay empty.
pub fn forward_fill(frame: &PriceFrame) -> PriceFrame {
    let mut last: Vec<Option<f64>> = vec![None; frame.symbols.len()];
    let rows: Vec<Vec<Option<f64>>> = frame
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    if cell.is_some() {
                        last[i] = *cell;
                    }
                    last[i]
                })
                .collect::<Vec<_>>()
        })
        .collect();
    PriceFrame {
        symbols: frame.symbols.clone(),
        rows,
    }
}

/// Daily simple returns of the forward-filled prices. Rows where no symbol
/// has a return are dropped.
pub fn returns_from_prices(frame: &PriceFrame) -> Vec<Vec<Option<f64>>> {
    let filled = forward_fill(frame);
    filled
        .rows
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(prev, cur)| match (prev, cur) {
                    (Some(p), Some(c)) if *p != 0.0 => Some(c / p - 1.0),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(Option::is_some))
        .collect()
}

/// Compounded annual return: `prod(1 + r) ^ (frequency / count) - 1` per symbol.
pub fn mean_historical_return(frame: &PriceFrame, frequency: f64) -> Result<Vec<f64>, OptimizerError> {
    let returns = returns_from_prices(frame);
    (0..frame.symbols.len())
        .map(|i| {
            let present: Vec<f64> = returns.iter().filter_map(|row| row[i]).collect();
            if present.is_empty() {
                return Err(OptimizerError::InsufficientHistory(frame.symbols[i].clone()));
            }
            let growth: f64 = present.iter().map(|r| 1.0 + r).product();
            Ok(growth.powf(frequency / present.len() as f64) - 1.0)
        })
        .collect()
}

/// Last observed price of every symbol.
pub fn latest_prices(frame: &PriceFrame) -> Vec<Option<f64>> {
    (0..frame.symbols.len())
        .map(|i| frame.column(i).flatten().last())
        .collect()
}
