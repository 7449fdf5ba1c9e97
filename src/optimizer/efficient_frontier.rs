// src/optimizer/efficient_frontier.rs
use crate::config::OptimizerConfig;
use crate::error::OptimizerError;
use crate::optimizer::{portfolio_return, portfolio_variance, PortfolioOptimizer};
use std::cmp::Ordering;
use tracing::debug;

const MAX_ITERATIONS: usize = 20_000;
const TOLERANCE: f64 = 1e-8;
const MIN_STEP: f64 = 1e-12;

/// Long-only maximum Sharpe ratio with an L2 penalty:
/// maximise `(w'mu - rf) / sqrt(w'Sw) - gamma * |w|^2` over the simplex.
#[derive(Debug, Clone)]
pub struct MaxSharpeOptimizer {
    l2_gamma: f64,
    risk_free_rate: f64,
}

impl MaxSharpeOptimizer {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            l2_gamma: config.l2_gamma,
            risk_free_rate: config.risk_free_rate,
        }
    }

    fn objective(&self, w: &[f64], mu: &[f64], cov: &[Vec<f64>]) -> f64 {
        let excess = portfolio_return(w, mu) - self.risk_free_rate;
        let sigma = portfolio_variance(w, cov).max(1e-18).sqrt();
        let l2: f64 = w.iter().map(|x| x * x).sum();
        excess / sigma - self.l2_gamma * l2
    }

    fn gradient(&self, w: &[f64], mu: &[f64], cov: &[Vec<f64>]) -> Vec<f64> {
        let excess = portfolio_return(w, mu) - self.risk_free_rate;
        let var = portfolio_variance(w, cov).max(1e-18);
        let sigma = var.sqrt();
        (0..w.len())
            .map(|i| {
                let cov_w: f64 = cov[i].iter().zip(w).map(|(c, x)| c * x).sum();
                mu[i] / sigma - excess * cov_w / (var * sigma) - 2.0 * self.l2_gamma * w[i]
            })
            .collect()
    }
}

impl PortfolioOptimizer for MaxSharpeOptimizer {
    fn optimize(&self, mu: &[f64], cov: &[Vec<f64>]) -> Result<Vec<f64>, OptimizerError> {
        let n = mu.len();
        if n == 0 {
            return Err(OptimizerError::NoAssets);
        }
        let best = mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if best <= self.risk_free_rate {
            return Err(OptimizerError::NoExcessReturn {
                best,
                risk_free_rate: self.risk_free_rate,
            });
        }
        if n == 1 {
            return Ok(vec![1.0]);
        }

        // start from an equal mix of the assets that beat the risk-free rate
        let winners = mu.iter().filter(|&&r| r > self.risk_free_rate).count() as f64;
        let mut w: Vec<f64> = mu
            .iter()
            .map(|&r| if r > self.risk_free_rate { 1.0 / winners } else { 0.0 })
            .collect();
        let mut value = self.objective(&w, mu, cov);
        let mut step = 0.1;

        for iteration in 0..MAX_ITERATIONS {
            let grad = self.gradient(&w, mu, cov);
            let candidate: Vec<f64> = w.iter().zip(&grad).map(|(x, g)| x + step * g).collect();
            let candidate = project_onto_simplex(&candidate);
            let candidate_value = self.objective(&candidate, mu, cov);

            if candidate_value + 1e-15 < value {
                step *= 0.5;
                if step < MIN_STEP {
                    debug!("max-sharpe: step collapsed after {} iterations", iteration);
                    break;
                }
                continue;
            }

            let moved = w
                .iter()
                .zip(&candidate)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            w = candidate;
            value = candidate_value;
            // projected-gradient norm, independent of the current step size
            let converged = moved / step < TOLERANCE;
            step *= 1.2;
            if converged {
                debug!("max-sharpe: converged after {} iterations", iteration);
                break;
            }
        }

        Ok(w)
    }

    fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }
}

/// Euclidean projection onto `{w : w >= 0, sum(w) = 1}`.
pub fn project_onto_simplex(v: &[f64]) -> Vec<f64> {
    let mut u = v.to_vec();
    u.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (j, &value) in u.iter().enumerate() {
        cumulative += value;
        let t = (cumulative - 1.0) / (j + 1) as f64;
        if value - t > 0.0 {
            theta = t;
        }
    }
    v.iter().map(|x| (x - theta).max(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::portfolio_performance;
    use approx::assert_relative_eq;

    fn optimizer(gamma: f64) -> MaxSharpeOptimizer {
        MaxSharpeOptimizer::new(&OptimizerConfig {
            l2_gamma: gamma,
            risk_free_rate: 0.02,
            frequency: 365.0,
        })
    }

    #[test]
    fn projection_lands_on_the_simplex() {
        let w = project_onto_simplex(&[0.8, 0.6, -0.3]);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| x >= 0.0));
        assert_relative_eq!(w[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.4, epsilon = 1e-12);
        assert_eq!(w[2], 0.0);
    }

    #[test]
    fn uncorrelated_assets_match_the_closed_form() {
        // without the penalty, w ∝ S^-1 (mu - rf) for a diagonal S
        let mu = [0.22, 0.12];
        let cov = vec![vec![0.04, 0.0], vec![0.0, 0.01]];
        let w = optimizer(0.0).optimize(&mu, &cov).unwrap();

        let raw = [(0.22 - 0.02) / 0.04, (0.12 - 0.02) / 0.01];
        let total = raw[0] + raw[1];
        assert_relative_eq!(w[0], raw[0] / total, epsilon = 1e-4);
        assert_relative_eq!(w[1], raw[1] / total, epsilon = 1e-4);
    }

    #[test]
    fn l2_penalty_spreads_the_weights() {
        let mu = [0.5, 0.1, 0.08];
        let cov = vec![
            vec![0.09, 0.01, 0.0],
            vec![0.01, 0.04, 0.0],
            vec![0.0, 0.0, 0.03],
        ];
        let plain = optimizer(0.0).optimize(&mu, &cov).unwrap();
        let penalised = optimizer(1.0).optimize(&mu, &cov).unwrap();

        let max = |w: &[f64]| w.iter().copied().fold(0.0, f64::max);
        assert!(max(&penalised) < max(&plain));
        assert_relative_eq!(penalised.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

        // the unpenalised solution really is the best Sharpe of the two
        let sharpe = |w: &[f64]| portfolio_performance(w, &mu, &cov, 0.02).sharpe_ratio;
        assert!(sharpe(&plain) >= sharpe(&penalised) - 1e-9);
    }

    #[test]
    fn no_asset_beats_the_risk_free_rate() {
        let err = optimizer(0.1)
            .optimize(&[0.01, -0.2], &[vec![0.1, 0.0], vec![0.0, 0.1]])
            .unwrap_err();
        assert!(matches!(err, OptimizerError::NoExcessReturn { .. }));
    }

    #[test]
    fn single_asset_takes_everything() {
        let w = optimizer(0.1).optimize(&[0.3], &[vec![0.2]]).unwrap();
        assert_eq!(w, vec![1.0]);
    }
}
