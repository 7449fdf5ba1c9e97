// src/reporting/charts.rs
use crate::error::StoreError;
use crate::simulation::{DailySummary, SimulatedPaths};
use crate::storage::artifacts::write_rows;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the series behind each chart as CSV; rendering is left to
/// whatever plotting tool reads them.
#[derive(Debug, Clone)]
pub struct ChartWriter {
    sim_plot_dir: PathBuf,
    mean_median_dir: PathBuf,
    max_paths: usize,
}

#[derive(Serialize)]
struct MeanMedianRow {
    day: usize,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
}

#[derive(Serialize)]
struct WeightRow<'a> {
    symbol: &'a str,
    weight: f64,
}

impl ChartWriter {
    pub fn new(sim_plot_dir: impl Into<PathBuf>, mean_median_dir: impl Into<PathBuf>, max_paths: usize) -> Self {
        Self {
            sim_plot_dir: sim_plot_dir.into(),
            mean_median_dir: mean_median_dir.into(),
            max_paths,
        }
    }

    /// `day,sim_0,sim_1,...` for the first `max_paths` paths.
    pub fn write_path_ensemble(&self, symbol: &str, paths: &SimulatedPaths) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.sim_plot_dir).map_err(|e| StoreError::io(&self.sim_plot_dir, e))?;
        let path = self.sim_plot_dir.join(format!("{}_sim_paths.csv", symbol));
        let shown = &paths.paths()[..paths.num_paths().min(self.max_paths)];

        let mut writer = csv::Writer::from_path(&path).map_err(|e| StoreError::csv(&path, e))?;
        let mut header = vec!["day".to_string()];
        header.extend((0..shown.len()).map(|i| format!("sim_{}", i)));
        writer.write_record(&header).map_err(|e| StoreError::csv(&path, e))?;

        for day in 0..=paths.horizon() {
            let mut record = Vec::with_capacity(shown.len() + 1);
            record.push(day.to_string());
            record.extend(shown.iter().map(|p| p[day].to_string()));
            writer.write_record(&record).map_err(|e| StoreError::csv(&path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    pub fn write_mean_median(&self, symbol: &str, daily: &[DailySummary]) -> Result<PathBuf, StoreError> {
        let path = self.mean_median_dir.join(format!("{}_mean_median.csv", symbol));
        let rows: Vec<MeanMedianRow> = daily
            .iter()
            .enumerate()
            .map(|(day, d)| MeanMedianRow {
                day,
                mean: d.mean,
                median: d.median,
                min: d.min,
                max: d.max,
            })
            .collect();
        write_rows(&path, &rows)?;
        Ok(path)
    }

    /// Bar-chart data: non-zero weights only.
    pub fn write_weights(&self, path: &Path, weights: &[(String, f64)]) -> Result<(), StoreError> {
        let rows: Vec<WeightRow> = weights
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(symbol, weight)| WeightRow { symbol, weight: *weight })
            .collect();
        write_rows(path, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensemble_is_capped_and_mean_median_has_every_day() {
        let dir = tempfile::tempdir().unwrap();
        let charts = ChartWriter::new(dir.path().join("mc"), dir.path().join("mm"), 2);
        let paths = SimulatedPaths::new(vec![
            vec![1.0, 1.5],
            vec![1.0, 0.5],
            vec![1.0, 2.0],
        ])
        .unwrap();

        let ensemble = charts.write_path_ensemble("BTCUSD", &paths).unwrap();
        let text = fs::read_to_string(ensemble).unwrap();
        assert_eq!(text, "day,sim_0,sim_1\n0,1,1\n1,1.5,0.5\n");

        let mm = charts
            .write_mean_median("BTCUSD", &paths.daily_summary())
            .unwrap();
        let text = fs::read_to_string(mm).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("day,mean,median,min,max\n"));
    }

    #[test]
    fn weights_chart_drops_zero_weights() {
        let dir = tempfile::tempdir().unwrap();
        let charts = ChartWriter::new(dir.path(), dir.path(), 10);
        let path = dir.path().join("weights.csv");
        charts
            .write_weights(
                &path,
                &[("BTCUSD".to_string(), 0.75), ("ETHUSD".to_string(), 0.0), ("SOLUSD".to_string(), 0.25)],
            )
            .unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "symbol,weight\nBTCUSD,0.75\nSOLUSD,0.25\n");
    }
}
