//! Core rate calculation functions.
//!
//! Pure functions for nightly pricing math - no database access.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::prelude::*;

use super::models::{Adjustment, AdjustmentKind, RateWindow, SeasonalRate};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias
/// when many nightly amounts are summed.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use hotel_rate_engine::rates::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Seasonal nightly value before the multiplier is applied.
///
/// Uses `weekend_rate` on Saturday and Sunday nights when the season sets one.
pub fn seasonal_nightly_value(season: &SeasonalRate, date: NaiveDate) -> Decimal {
    match season.weekend_rate {
        Some(weekend_rate) if is_weekend(date) => weekend_rate,
        _ => season.base_rate,
    }
}

/// Seasonal base for a night: nightly value × multiplier, rounded to cents.
///
/// # Returns
/// Tuple of (rate, adjustment recording the multiplier when it is not 1)
pub fn seasonal_rate_for(season: &SeasonalRate, date: NaiveDate) -> (Decimal, Option<Adjustment>) {
    let nightly = seasonal_nightly_value(season, date);
    let rate = round_money(nightly * season.multiplier, 2);

    let adjustment = (season.multiplier != Decimal::ONE).then(|| Adjustment {
        name: format!("Seasonal Multiplier ({})", season.season),
        kind: AdjustmentKind::Percentage,
        value: (season.multiplier - Decimal::ONE) * Decimal::ONE_HUNDRED,
        amount: rate - nightly,
    });

    (rate, adjustment)
}

/// Occupancy-adjusted rate from a rate window.
///
/// - One adult and a single rate: the single rate
/// - More than two adults and an extra person rate: base + (adults - 2) × extra
/// - Otherwise: the base rate
///
/// # Returns
/// Tuple of (rate, adjustment describing the difference from the base rate)
pub fn occupancy_adjusted_rate(window: &RateWindow, adults: u32) -> (Decimal, Option<Adjustment>) {
    match (adults, window.single_rate, window.extra_person_rate) {
        (1, Some(single_rate), _) => {
            let delta = single_rate - window.base_rate;
            (
                single_rate,
                Some(Adjustment {
                    name: "Single Occupancy".to_string(),
                    kind: AdjustmentKind::Fixed,
                    value: delta,
                    amount: delta,
                }),
            )
        }
        (adults, _, Some(extra_person_rate)) if adults > 2 => {
            let extra = Decimal::from(adults - 2) * extra_person_rate;
            (
                window.base_rate + extra,
                Some(Adjustment {
                    name: format!("Extra Person x{}", adults - 2),
                    kind: AdjustmentKind::Fixed,
                    value: extra_person_rate,
                    amount: extra,
                }),
            )
        }
        _ => (window.base_rate, None),
    }
}

/// Final nightly amount: rounded to cents and never negative
pub fn finalize_nightly(amount: Decimal) -> Decimal {
    round_money(amount, 2).max(Decimal::ZERO)
}
