// src/simulation/traits.rs
use crate::error::SimulationError;
use crate::types::Bar;
use crate::utils::stats;

pub trait PathSimulator {
    fn name(&self) -> String;

    /// Projects `num_sims` cumulative-return paths of `horizon_days` steps
    /// from the instrument's daily history.
    fn simulate(
        &mut self,
        symbol: &str,
        history: &[Bar],
        horizon_days: usize,
        num_sims: usize,
    ) -> Result<SimulatedPaths, SimulationError>;
}

/// Cross-path statistics for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Distribution of terminal cumulative returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Cumulative-return paths; every path starts at 1.0 and has `horizon + 1` points.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPaths {
    paths: Vec<Vec<f64>>,
}

impl SimulatedPaths {
    pub fn new(paths: Vec<Vec<f64>>) -> Result<Self, SimulationError> {
        let len = paths.first().map(Vec::len).unwrap_or(0);
        if len < 2 || paths.iter().any(|p| p.len() != len) {
            return Err(SimulationError::EmptyRun);
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[Vec<f64>] {
        &self.paths
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    /// Simulated steps, excluding the starting point.
    pub fn horizon(&self) -> usize {
        self.paths[0].len() - 1
    }

    fn day(&self, t: usize) -> Vec<f64> {
        self.paths.iter().map(|p| p[t]).collect()
    }

    /// Mean, median, min and max across paths for every day.
    pub fn daily_summary(&self) -> Vec<DailySummary> {
        (0..=self.horizon())
            .map(|t| {
                let values = stats::sorted(&self.day(t));
                DailySummary {
                    mean: stats::mean(&values).unwrap_or(f64::NAN),
                    median: stats::quantile_sorted(&values, 0.5).unwrap_or(f64::NAN),
                    min: values[0],
                    max: values[values.len() - 1],
                }
            })
            .collect()
    }

    pub fn terminal_summary(&self) -> TerminalSummary {
        let values = stats::sorted(&self.day(self.horizon()));
        let q = |p: f64| stats::quantile_sorted(&values, p).unwrap_or(f64::NAN);
        TerminalSummary {
            count: values.len(),
            mean: stats::mean(&values).unwrap_or(f64::NAN),
            std: stats::sample_std(&values).unwrap_or(0.0),
            min: values[0],
            p25: q(0.25),
            median: q(0.5),
            p75: q(0.75),
            max: values[values.len() - 1],
            ci_lower: q(0.025),
            ci_upper: q(0.975),
        }
    }
}
