// src/optimizer/discrete_allocation.rs
use crate::error::OptimizerError;
use crate::types::{Allocation, Holding};
use crate::utils::precision::affordable_units;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Converts continuous weights into whole units of each asset for a fixed budget.
#[derive(Debug, Clone)]
pub struct DiscreteAllocation {
    weights: Vec<(String, f64)>,
    latest_prices: HashMap<String, Decimal>,
    total_value: Decimal,
}

struct Position {
    symbol: String,
    weight: f64,
    price: Decimal,
    shares: u64,
}

impl Position {
    fn dollars(&self) -> Decimal {
        Decimal::from(self.shares) * self.price
    }
}

impl DiscreteAllocation {
    pub fn new(
        weights: Vec<(String, f64)>,
        latest_prices: Vec<(String, Decimal)>,
        total_value: Decimal,
    ) -> Self {
        Self {
            weights,
            latest_prices: latest_prices.into_iter().collect(),
            total_value,
        }
    }

    /// Two-round greedy allocation.
    ///
    /// Round one buys `floor(w * V / p)` units of every weighted asset, largest
    /// weight first. Round two spends the remainder on the affordable assets,
    /// buying the whole dollar deficit of the furthest-behind one at a time
    /// (at least one unit), until no weighted asset is affordable.
    pub fn greedy_portfolio(&self) -> Result<Allocation, OptimizerError> {
        // 1. Weighted assets, largest weight first
        let mut positions = Vec::new();
        for (symbol, weight) in &self.weights {
            if *weight <= 0.0 {
                continue;
            }
            let price = match self.latest_prices.get(symbol) {
                Some(p) if *p > Decimal::ZERO => *p,
                _ => return Err(OptimizerError::InvalidPrice(symbol.clone())),
            };
            positions.push(Position {
                symbol: symbol.clone(),
                weight: *weight,
                price,
                shares: 0,
            });
        }
        if positions.is_empty() {
            return Err(OptimizerError::NoAssets);
        }
        positions.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));

        // 2. Feasibility: at least one unit of something must be affordable
        let cheapest = positions
            .iter()
            .map(|p| p.price)
            .min()
            .unwrap_or(Decimal::ZERO);
        if self.total_value < cheapest {
            return Err(OptimizerError::Infeasible {
                required: cheapest,
                available: self.total_value,
                shortfall: cheapest - self.total_value,
            });
        }

        // 3. Round one: floor of the ideal unit count
        let mut available = self.total_value;
        let weight_sum: f64 = positions.iter().map(|p| p.weight).sum();
        for position in positions.iter_mut() {
            let share = Decimal::try_from(position.weight / weight_sum).unwrap_or(Decimal::ZERO);
            let budget = (self.total_value * share).min(available);
            position.shares = affordable_units(budget, position.price);
            available -= position.dollars();
        }
        debug!("allocation round one leaves {} unspent", available);

        // 4. Round two: the remainder goes to the affordable assets, each step
        //    topping up the one furthest below its share of what they can absorb
        loop {
            let affordable: Vec<usize> = (0..positions.len())
                .filter(|&i| positions[i].price <= available)
                .collect();

            let (i, units) = match affordable.as_slice() {
                [] => break,
                [only] => (*only, affordable_units(available, positions[*only].price)),
                _ => {
                    let Some((i, deficit)) = largest_deficit(&positions, &affordable, available) else {
                        break;
                    };
                    let price = positions[i].price;
                    (i, affordable_units(deficit, price).clamp(1, affordable_units(available, price)))
                }
            };
            positions[i].shares += units;
            available -= Decimal::from(units) * positions[i].price;
        }

        let holdings = positions
            .into_iter()
            .filter(|p| p.shares > 0)
            .map(|p| Holding {
                symbol: p.symbol,
                weight: p.weight,
                shares: p.shares,
                latest_price: p.price,
            })
            .collect();

        Ok(Allocation {
            holdings,
            leftover: available,
        })
    }
}

/// The affordable position furthest below its weight-proportional share of the
/// money those positions hold plus `available`, with that shortfall in dollars.
fn largest_deficit(positions: &[Position], affordable: &[usize], available: Decimal) -> Option<(usize, Decimal)> {
    let pool_weight: f64 = affordable.iter().map(|&i| positions[i].weight).sum();
    let pool_value = available + affordable.iter().map(|&i| positions[i].dollars()).sum::<Decimal>();

    let mut best: Option<(usize, Decimal)> = None;
    for &i in affordable {
        let share = Decimal::try_from(positions[i].weight / pool_weight).unwrap_or(Decimal::ZERO);
        let deficit = pool_value * share - positions[i].dollars();
        if best.map_or(true, |(_, d)| deficit > d) {
            best = Some((i, deficit));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn allocate(weights: &[(&str, f64)], prices: &[(&str, Decimal)], total: Decimal) -> Result<Allocation, OptimizerError> {
        DiscreteAllocation::new(
            weights.iter().map(|(s, w)| (s.to_string(), *w)).collect(),
            prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            total,
        )
        .greedy_portfolio()
    }

    fn shares(allocation: &Allocation, symbol: &str) -> u64 {
        allocation
            .holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map(|h| h.shares)
            .unwrap_or(0)
    }

    #[test]
    fn remainder_goes_to_the_affordable_asset() {
        let alloc = allocate(&[("A", 0.5), ("B", 0.5)], &[("A", dec(10)), ("B", dec(30))], dec(100)).unwrap();
        assert_eq!(shares(&alloc, "A"), 7);
        assert_eq!(shares(&alloc, "B"), 1);
        assert_eq!(alloc.leftover, Decimal::ZERO);
        assert_eq!(alloc.spent() + alloc.leftover, dec(100));
    }

    #[test]
    fn leftover_cannot_buy_another_unit() {
        let prices = [
            ("BTC", Decimal::new(6_512_345, 2)),
            ("ETH", Decimal::new(345_678, 2)),
            ("SOL", Decimal::new(14_321, 2)),
        ];
        let alloc = allocate(&[("BTC", 0.6), ("ETH", 0.3), ("SOL", 0.1)], &prices, dec(10_000)).unwrap();

        assert_eq!(alloc.spent() + alloc.leftover, dec(10_000));
        assert!(alloc.leftover >= Decimal::ZERO);
        let cheapest = prices.iter().map(|(_, p)| *p).min().unwrap();
        assert!(alloc.leftover < cheapest);
    }

    #[test]
    fn zero_weights_are_not_bought() {
        let alloc = allocate(&[("A", 1.0), ("B", 0.0)], &[("A", dec(3)), ("B", dec(1))], dec(10)).unwrap();
        assert_eq!(shares(&alloc, "A"), 3);
        assert_eq!(shares(&alloc, "B"), 0);
        assert_eq!(alloc.leftover, dec(1));
    }

    #[test]
    fn budget_below_cheapest_price_is_infeasible() {
        let err = allocate(&[("A", 0.5), ("B", 0.5)], &[("A", dec(120)), ("B", dec(150))], dec(100)).unwrap_err();
        match err {
            OptimizerError::Infeasible { shortfall, .. } => assert_eq!(shortfall, dec(20)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_price_is_rejected() {
        let err = allocate(&[("A", 1.0)], &[], dec(100)).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidPrice(s) if s == "A"));
    }

    #[test]
    fn micro_priced_asset_is_bought_in_bulk() {
        let started = std::time::Instant::now();
        let alloc = allocate(
            &[("BTCUSD", 0.9), ("SHIBUSD", 0.1)],
            &[("BTCUSD", dec(65_000)), ("SHIBUSD", Decimal::new(1, 5))],
            dec(10_000),
        )
        .unwrap();

        assert_eq!(shares(&alloc, "BTCUSD"), 0);
        assert_eq!(shares(&alloc, "SHIBUSD"), 1_000_000_000);
        assert_eq!(alloc.leftover, Decimal::ZERO);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn several_micro_priced_assets_share_the_remainder() {
        let started = std::time::Instant::now();
        let prices = [
            ("BTCUSD", dec(65_000)),
            ("SHIBUSD", Decimal::new(1, 5)),
            ("PEPEUSD", Decimal::new(2, 5)),
        ];
        let alloc = allocate(
            &[("BTCUSD", 0.8), ("SHIBUSD", 0.1), ("PEPEUSD", 0.1)],
            &prices,
            dec(10_000),
        )
        .unwrap();

        assert_eq!(alloc.spent() + alloc.leftover, dec(10_000));
        assert!(alloc.leftover < Decimal::new(1, 5));
        // the unaffordable weight is split evenly between the two cheap coins
        let shib = alloc.holdings.iter().find(|h| h.symbol == "SHIBUSD").unwrap().dollars();
        let pepe = alloc.holdings.iter().find(|h| h.symbol == "PEPEUSD").unwrap().dollars();
        assert!((shib - pepe).abs() <= Decimal::new(2, 5));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
