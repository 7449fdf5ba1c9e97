// src/reporting/report.rs
use crate::types::{Allocation, PortfolioPerformance};
use crate::utils::precision::round_cents;
use std::fmt;

/// What the portfolio stage hands back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReport {
    pub weights: Vec<(String, f64)>,
    pub performance: PortfolioPerformance,
    pub allocation: Allocation,
}

impl fmt::Display for PortfolioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Discrete allocation:")?;
        for h in &self.allocation.holdings {
            writeln!(f, "  {:<12} {:>8} shares", h.symbol, h.shares)?;
        }
        writeln!(f, "Funds remaining: ${}", round_cents(self.allocation.leftover))?;

        writeln!(f, "Dollars per coin:")?;
        for h in &self.allocation.holdings {
            writeln!(
                f,
                "  {:<12} ${:>12} ({:.2}%)",
                h.symbol,
                round_cents(h.dollars()),
                h.weight * 100.0
            )?;
        }

        let p = &self.performance;
        writeln!(f, "Expected annual return: {:.1}%", p.expected_return * 100.0)?;
        writeln!(f, "Annual volatility: {:.1}%", p.volatility * 100.0)?;
        write!(f, "Sharpe Ratio: {:.2}", p.sharpe_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Holding;
    use rust_decimal::Decimal;

    #[test]
    fn report_lists_shares_cash_and_performance() {
        let report = PortfolioReport {
            weights: vec![("BTCUSD".to_string(), 1.0)],
            performance: PortfolioPerformance {
                expected_return: 0.4567,
                volatility: 0.61,
                sharpe_ratio: 0.7159,
            },
            allocation: Allocation {
                holdings: vec![Holding {
                    symbol: "BTCUSD".to_string(),
                    weight: 1.0,
                    shares: 3,
                    latest_price: Decimal::new(2_500_125, 2),
                }],
                leftover: Decimal::new(2_496_251, 3),
            },
        };

        let text = report.to_string();
        assert!(text.contains(&format!("{:<12} {:>8} shares", "BTCUSD", 3)));
        assert!(text.contains("Funds remaining: $2496.25"));
        assert!(text.contains("75003.75 (100.00%)"));
        assert!(text.contains("Expected annual return: 45.7%"));
        assert!(text.contains("Sharpe Ratio: 0.72"));
    }
}
