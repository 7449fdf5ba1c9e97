// src/simulation/monte_carlo.rs
use crate::error::SimulationError;
use crate::simulation::traits::{PathSimulator, SimulatedPaths};
use crate::types::Bar;
use crate::utils::stats;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Forward simulation with normally distributed daily returns.
///
/// Daily returns are drawn from `N(mean, std)` of the historical close-to-close
/// returns and compounded from 1.0, so each path is a cumulative-return series.
pub struct MonteCarloSimulator {
    rng: StdRng,
}

impl MonteCarloSimulator {
    /// A fixed seed makes a whole run reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn return_distribution(symbol: &str, history: &[Bar]) -> Result<Normal<f64>, SimulationError> {
        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        let returns: Vec<f64> = stats::pct_change(&closes)
            .into_iter()
            .filter(|r| r.is_finite())
            .collect();

        let insufficient = || SimulationError::InsufficientHistory {
            symbol: symbol.to_string(),
            returns: returns.len(),
        };
        let mean = stats::mean(&returns).ok_or_else(insufficient)?;
        let std = stats::sample_std(&returns).ok_or_else(insufficient)?;

        debug!("{}: daily return mean={:.6} std={:.6}", symbol, mean, std);
        Normal::new(mean, std).map_err(|e| SimulationError::InvalidDistribution {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })
    }
}

impl PathSimulator for MonteCarloSimulator {
    fn name(&self) -> String {
        "monte-carlo-normal".to_string()
    }

    fn simulate(
        &mut self,
        symbol: &str,
        history: &[Bar],
        horizon_days: usize,
        num_sims: usize,
    ) -> Result<SimulatedPaths, SimulationError> {
        if horizon_days == 0 || num_sims == 0 {
            return Err(SimulationError::EmptyRun);
        }
        let normal = Self::return_distribution(symbol, history)?;

        let mut paths = Vec::with_capacity(num_sims);
        for _ in 0..num_sims {
            let mut path = Vec::with_capacity(horizon_days + 1);
            let mut level = 1.0;
            path.push(level);
            for _ in 0..horizon_days {
                level *= 1.0 + normal.sample(&mut self.rng);
                path.push(level);
            }
            paths.push(path);
        }

        SimulatedPaths::new(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn history(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                close,
                high: close,
                low: close,
                mts: 0,
                open: close,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn paths_have_requested_shape() {
        let mut sim = MonteCarloSimulator::new(Some(42));
        let paths = sim
            .simulate("BTCUSD", &history(&[100.0, 103.0, 99.0, 104.0, 108.0]), 30, 25)
            .unwrap();
        assert_eq!(paths.num_paths(), 25);
        assert_eq!(paths.horizon(), 30);
        assert!(paths.paths().iter().all(|p| p[0] == 1.0));
    }

    #[test]
    fn same_seed_same_paths() {
        let closes = history(&[10.0, 11.0, 10.5, 12.0, 11.7, 12.4]);
        let a = MonteCarloSimulator::new(Some(7)).simulate("X", &closes, 20, 10).unwrap();
        let b = MonteCarloSimulator::new(Some(7)).simulate("X", &closes, 20, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_volatility_compounds_exactly() {
        let mut sim = MonteCarloSimulator::new(Some(1));
        let paths = sim.simulate("X", &history(&[1.0, 2.0, 4.0, 8.0]), 3, 4).unwrap();
        for path in paths.paths() {
            assert_eq!(path, &vec![1.0, 2.0, 4.0, 8.0]);
        }
        let terminal = paths.terminal_summary();
        assert_eq!(terminal.mean, 8.0);
        assert_eq!(terminal.median, 8.0);
    }

    #[test]
    fn short_history_is_rejected() {
        let mut sim = MonteCarloSimulator::new(Some(1));
        let err = sim.simulate("X", &history(&[1.0, 2.0]), 3, 4).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InsufficientHistory { returns: 1, .. }
        ));
    }

    #[test]
    fn empty_run_is_rejected() {
        let mut sim = MonteCarloSimulator::new(Some(1));
        assert!(matches!(
            sim.simulate("X", &history(&[1.0, 2.0, 3.0]), 0, 4),
            Err(SimulationError::EmptyRun)
        ));
    }
}
