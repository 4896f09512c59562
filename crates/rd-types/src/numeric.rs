//! Rounding shared by alert messages and the printed report.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to `dp` places, halves away from zero.
pub fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// A fraction in percentage points (`0.1234` -> `12.34`), rounded to `dp`
/// places. Saturates at the ends of the `Decimal` range.
pub fn percent_points(value: Decimal, dp: u32) -> Decimal {
    round_half_away(value.saturating_mul(Decimal::ONE_HUNDRED), dp)
}
