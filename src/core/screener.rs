// src/core/screener.rs
use crate::config::AppConfig;
use crate::core::dataset::CombinedDataset;
use crate::error::{ScreenerError, SimulationError};
use crate::reporting::ChartWriter;
use crate::simulation::PathSimulator;
use crate::storage::artifacts;
use crate::types::{CandidateStats, Field, RankedCandidate};
use crate::utils::stats;
use std::cmp::Ordering;
use tracing::{info, warn};

/// Exchange test instruments carry this marker in their symbol.
const TEST_MARKER: &str = "TEST";

/// Final value of `cumprod(1 + pct_change(close)) - 1`.
/// Fewer than two closes, or a non-finite result, yields `None`.
pub fn realized_cumulative_return(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let growth: f64 = stats::pct_change(closes).iter().map(|r| 1.0 + r).product();
    let total = growth - 1.0;
    total.is_finite().then_some(total)
}

/// Symbols with a strictly positive realized return that are not test instruments,
/// in dataset order.
pub fn positive_performers(dataset: &CombinedDataset) -> Vec<String> {
    dataset
        .symbols()
        .filter_map(|symbol| {
            let closes = dataset.closes(symbol)?;
            match realized_cumulative_return(&closes) {
                Some(r) if r > 0.0 => Some(symbol.to_string()),
                Some(_) => None,
                None => {
                    warn!("{}: no usable realized return, excluded", symbol);
                    None
                }
            }
        })
        .filter(|symbol| !symbol.contains(TEST_MARKER))
        .collect()
}

/// Orders candidates by `mean / median` ascending and keeps those below
/// `threshold`. A non-positive median or non-finite ratio excludes the entry.
pub fn rank_candidates(stats: &[CandidateStats], threshold: f64) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = stats
        .iter()
        .filter_map(|s| {
            if s.median <= 0.0 {
                warn!("{}: simulated median {} is not positive, excluded", s.symbol, s.median);
                return None;
            }
            let ratio = s.mean / s.median;
            if !ratio.is_finite() {
                warn!("{}: mean/median ratio is not finite, excluded", s.symbol);
                return None;
            }
            Some(RankedCandidate {
                symbol: s.symbol.clone(),
                mean: s.mean,
                median: s.median,
                ratio,
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.ratio.partial_cmp(&b.ratio).unwrap_or(Ordering::Equal));
    ranked.retain(|c| c.ratio < threshold);
    ranked
}

/// The first `portfolio_size` ranked symbols followed by every forced ticker.
pub fn select_keepers(ranked: &[RankedCandidate], portfolio_size: usize, forced: &[String]) -> Vec<String> {
    ranked
        .iter()
        .take(portfolio_size)
        .map(|c| c.symbol.clone())
        .chain(forced.iter().cloned())
        .collect()
}

/// Return filter, simulation and ranking stage.
pub struct ReturnScreener<'a, S> {
    config: &'a AppConfig,
    simulator: &'a mut S,
    charts: ChartWriter,
}

impl<'a, S> ReturnScreener<'a, S>
where
    S: PathSimulator,
{
    pub fn new(config: &'a AppConfig, simulator: &'a mut S) -> Self {
        let charts = ChartWriter::new(
            &config.paths.sim_plot_dir,
            &config.paths.mean_median_plot_dir,
            config.simulation.plot_paths,
        );
        Self {
            config,
            simulator,
            charts,
        }
    }

    /// Runs the stage over `dataset` and returns the keepers it persisted.
    pub fn run(&mut self, dataset: &CombinedDataset) -> Result<Vec<String>, ScreenerError> {
        // 1. Realized-return filter
        let survivors = positive_performers(dataset);
        info!(
            "{} of {} instruments have a positive realized return",
            survivors.len(),
            dataset.symbols().count()
        );
        if survivors.is_empty() {
            return Err(ScreenerError::NoPositiveReturns);
        }

        let columns: Vec<(String, Vec<Option<f64>>)> = survivors
            .iter()
            .filter_map(|s| dataset.field(s, Field::Close).map(|c| (s.clone(), c)))
            .collect();
        artifacts::write_close_table(&self.config.paths.good_coins_file, dataset.dates(), &columns)?;

        // 2. Forward simulation per survivor
        let horizon = self.config.horizon_days();
        info!(
            "Simulating {} paths over {} days with {}",
            self.config.num_sims,
            horizon,
            self.simulator.name()
        );
        let mut candidates = Vec::with_capacity(survivors.len());
        for symbol in &survivors {
            if let Some(stats) = self.simulate_one(dataset, symbol, horizon)? {
                candidates.push(stats);
            }
        }
        if candidates.is_empty() {
            return Err(ScreenerError::NoCandidates(
                "no surviving instrument could be simulated".to_string(),
            ));
        }

        // 3. Ranking and keepers
        let ranked = rank_candidates(&candidates, self.config.simulation.ratio_threshold);
        artifacts::write_rankings(&self.config.paths.rankings_file, &ranked)?;

        let keepers = select_keepers(&ranked, self.config.portfolio_size, &self.config.forced_tickers);
        if keepers.is_empty() {
            return Err(ScreenerError::NoCandidates(format!(
                "every simulated ratio was degenerate or >= {}",
                self.config.simulation.ratio_threshold
            )));
        }
        artifacts::write_keepers(&self.config.paths.keepers_file, &keepers)?;
        info!("Keepers: {}", keepers.join(", "));
        Ok(keepers)
    }

    fn simulate_one(
        &mut self,
        dataset: &CombinedDataset,
        symbol: &str,
        horizon: usize,
    ) -> Result<Option<CandidateStats>, ScreenerError> {
        let history = dataset.bars(symbol).unwrap_or_default();
        let paths = match self
            .simulator
            .simulate(symbol, &history, horizon, self.config.num_sims)
        {
            Ok(paths) => paths,
            Err(e @ SimulationError::InsufficientHistory { .. })
            | Err(e @ SimulationError::InvalidDistribution { .. }) => {
                warn!("{}, skipping", e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let daily = paths.daily_summary();
        self.charts.write_path_ensemble(symbol, &paths)?;
        self.charts.write_mean_median(symbol, &daily)?;

        let t = paths.terminal_summary();
        info!(
            "{}: terminal mean={:.4} median={:.4} std={:.4} min={:.4} p25={:.4} p75={:.4} max={:.4} 95% CI=[{:.4}, {:.4}]",
            symbol, t.mean, t.median, t.std, t.min, t.p25, t.p75, t.max, t.ci_lower, t.ci_upper
        );

        let last = daily.last().copied();
        Ok(last.map(|d| CandidateStats {
            symbol: symbol.to_string(),
            mean: d.mean,
            median: d.median,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::MonteCarloSimulator;
    use crate::types::{Bar, InstrumentSeries};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::path::Path;

    fn stats(symbol: &str, mean: f64, median: f64) -> CandidateStats {
        CandidateStats {
            symbol: symbol.to_string(),
            mean,
            median,
        }
    }

    fn series(symbol: &str, closes: &[f64]) -> InstrumentSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + i as u32).unwrap(),
                close,
                high: close,
                low: close,
                mts: 0,
                open: close,
                volume: 1.0,
            })
            .collect();
        InstrumentSeries::new(symbol, bars)
    }

    fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::load("does-not-exist").unwrap();
        config.sim_years = 1;
        config.num_sims = 8;
        config.portfolio_size = 2;
        config.forced_tickers = vec!["BTCUSD".to_string()];
        config.simulation.seed = Some(11);
        config.simulation.plot_paths = 3;
        config.paths.good_coins_file = dir.join("good_coins.csv");
        config.paths.rankings_file = dir.join("rankings.csv");
        config.paths.keepers_file = dir.join("keepers.txt");
        config.paths.sim_plot_dir = dir.join("mc");
        config.paths.mean_median_plot_dir = dir.join("mm");
        config
    }

    #[test]
    fn cumulative_return_compounds() {
        assert_relative_eq!(
            realized_cumulative_return(&[100.0, 110.0, 121.0]).unwrap(),
            0.21,
            epsilon = 1e-12
        );
        assert_eq!(realized_cumulative_return(&[100.0]), None);
    }

    #[test]
    fn only_positive_non_test_instruments_survive() {
        // returns: 0.5, -0.1, 0.0, 2.0
        let dataset = CombinedDataset::from_series(vec![
            series("AAAUSD", &[10.0, 15.0]),
            series("BBBUSD", &[10.0, 9.0]),
            series("CCCUSD", &[10.0, 10.0]),
            series("DDDUSD", &[10.0, 30.0]),
            series("TESTUSD", &[10.0, 40.0]),
            series("EEEUSD", &[10.0]),
        ]);
        assert_eq!(positive_performers(&dataset), vec!["AAAUSD", "DDDUSD"]);
    }

    #[test]
    fn ranking_is_ascending_by_ratio() {
        let ranked = rank_candidates(
            &[stats("A", 1.2, 1.0), stats("B", 3.0, 0.5), stats("C", 1.1, 1.05)],
            50.0,
        );
        let order: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        assert_relative_eq!(ranked[2].ratio, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_ratios_are_excluded() {
        let ranked = rank_candidates(
            &[
                stats("ZERO", 1.0, 0.0),
                stats("NEG", 1.0, -2.0),
                stats("HUGE", 60.0, 1.0),
                stats("EDGE", 50.0, 1.0),
                stats("OK", 2.0, 1.0),
            ],
            50.0,
        );
        let order: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["OK"]);
    }

    #[test]
    fn forced_tickers_are_appended_after_the_cut() {
        let ranked = rank_candidates(
            &[stats("A", 1.2, 1.0), stats("B", 3.0, 0.5), stats("C", 1.1, 1.05)],
            50.0,
        );
        let keepers = select_keepers(&ranked, 2, &["ETHUSD".to_string(), "B".to_string()]);
        assert_eq!(keepers, vec!["C", "A", "ETHUSD", "B"]);
    }

    #[test]
    fn stage_persists_candidates_and_keepers() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let dataset = CombinedDataset::from_series(vec![
            series("AAAUSD", &[10.0, 10.2, 10.1, 10.4, 10.6]),
            series("BBBUSD", &[10.0, 9.0, 8.5, 8.0, 7.0]),
            series("CCCUSD", &[5.0, 5.5, 6.05, 6.655, 7.3205]),
        ]);

        let mut simulator = MonteCarloSimulator::new(config.simulation.seed);
        let keepers = ReturnScreener::new(&config, &mut simulator).run(&dataset).unwrap();

        assert_eq!(keepers.len(), 3);
        assert_eq!(keepers[2], "BTCUSD");
        assert!(!keepers[..2].contains(&"BBBUSD".to_string()));

        let persisted = artifacts::read_keepers(&config.paths.keepers_file).unwrap().unwrap();
        assert_eq!(persisted, keepers);

        let good = std::fs::read_to_string(&config.paths.good_coins_file).unwrap();
        assert!(good.starts_with("date,AAAUSD,CCCUSD"));
        assert!(dir.path().join("mc").join("AAAUSD_sim_paths.csv").exists());
        assert!(dir.path().join("mm").join("CCCUSD_mean_median.csv").exists());
    }

    #[test]
    fn no_positive_performer_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let dataset = CombinedDataset::from_series(vec![series("BBBUSD", &[10.0, 9.0])]);

        let mut simulator = MonteCarloSimulator::new(Some(1));
        let err = ReturnScreener::new(&config, &mut simulator).run(&dataset).unwrap_err();
        assert!(matches!(err, ScreenerError::NoPositiveReturns));
        assert!(!config.paths.keepers_file.exists());
    }
}
