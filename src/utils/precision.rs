// src/utils/precision.rs
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Whole units of `price` that `budget` can buy, rounded DOWN.
/// Example: budget=100, price=30 -> 3
pub fn affordable_units(budget: Decimal, price: Decimal) -> u64 {
    if price <= Decimal::ZERO || budget <= Decimal::ZERO {
        return 0;
    }
    (budget / price).floor().to_u64().unwrap_or(0)
}

/// Rounds a cash amount to cents (banker's rounding).
/// Example: 12.346 -> 12.35, 12.345 -> 12.34
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Converts a float price into a `Decimal`; NaN and infinities give `None`.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}
