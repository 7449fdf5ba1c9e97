// src/optimizer/risk_models.rs
use crate::error::OptimizerError;
use crate::optimizer::expected_returns::returns_from_prices;
use crate::optimizer::PriceFrame;

/// Annualised covariance estimate and the shrinkage intensity used for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskEstimate {
    pub covariance: Vec<Vec<f64>>,
    pub shrinkage: f64,
}

/// Ledoit-Wolf shrinkage of the sample covariance toward `mu * I`, where
/// `mu` is the average sample variance. Missing returns count as 0.
pub fn ledoit_wolf(frame: &PriceFrame, frequency: f64) -> Result<RiskEstimate, OptimizerError> {
    let p = frame.symbols.len();
    if p == 0 {
        return Err(OptimizerError::NoAssets);
    }
    let returns = returns_from_prices(frame);
    let n = returns.len();
    if n == 0 {
        return Err(OptimizerError::InsufficientHistory(frame.symbols.join(",")));
    }

    // centred sample matrix, n x p
    let mut x: Vec<Vec<f64>> = returns
        .iter()
        .map(|row| row.iter().map(|r| r.unwrap_or(0.0)).collect())
        .collect();
    for j in 0..p {
        let mean = x.iter().map(|row| row[j]).sum::<f64>() / n as f64;
        for row in x.iter_mut() {
            row[j] -= mean;
        }
    }

    let nf = n as f64;
    let pf = p as f64;
    let mut emp_cov = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in i..p {
            let c = x.iter().map(|row| row[i] * row[j]).sum::<f64>() / nf;
            emp_cov[i][j] = c;
            emp_cov[j][i] = c;
        }
    }
    let mu = (0..p).map(|i| emp_cov[i][i]).sum::<f64>() / pf;

    let shrinkage = if p == 1 {
        0.0
    } else {
        // beta_: sum over (i, j) of <x_i^2, x_j^2>; delta_: squared entries of X'X / n^2
        let mut beta_ = 0.0;
        let mut delta_ = 0.0;
        for i in 0..p {
            for j in 0..p {
                beta_ += x.iter().map(|row| row[i] * row[i] * row[j] * row[j]).sum::<f64>();
                delta_ += (emp_cov[i][j] * nf).powi(2);
            }
        }
        delta_ /= nf * nf;

        let trace_sum: f64 = (0..p).map(|i| emp_cov[i][i]).sum();
        let beta = (beta_ / nf - delta_) / (pf * nf);
        let delta = (delta_ - 2.0 * mu * trace_sum + pf * mu * mu) / pf;
        let beta = beta.min(delta);
        if beta == 0.0 || delta == 0.0 {
            0.0
        } else {
            beta / delta
        }
    };

    let covariance = (0..p)
        .map(|i| {
            (0..p)
                .map(|j| {
                    let target = if i == j { shrinkage * mu } else { 0.0 };
                    ((1.0 - shrinkage) * emp_cov[i][j] + target) * frequency
                })
                .collect()
        })
        .collect();

    Ok(RiskEstimate {
        covariance,
        shrinkage,
    })
}
