//! Demand-based yield adjustment.
//!
//! The multiplier is applied once to the stay total, not per night.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calculators::round_money;
use super::error::RateError;
use super::models::{Adjustment, AdjustmentKind};

pub const YIELD_ADJUSTMENT_NAME: &str = "Yield Management";

/// Occupancy threshold and the multiplier it unlocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldTier {
    pub min_occupancy: f64,
    pub multiplier: Decimal,
}

/// Result of applying yield to a subtotal
#[derive(Debug, Clone, PartialEq)]
pub struct YieldResult {
    pub adjusted_total: Decimal,
    pub multiplier: Decimal,
    pub adjustment: Adjustment,
}

/// Step-function yield table over occupancy
#[derive(Debug, Clone)]
pub struct YieldAdjuster {
    /// Sorted by `min_occupancy` descending
    tiers: Vec<YieldTier>,
    floor_multiplier: Decimal,
}

impl Default for YieldAdjuster {
    fn default() -> Self {
        Self::new(
            vec![
                YieldTier { min_occupancy: 0.90, multiplier: dec!(1.30) },
                YieldTier { min_occupancy: 0.80, multiplier: dec!(1.15) },
                YieldTier { min_occupancy: 0.70, multiplier: dec!(1.00) },
                YieldTier { min_occupancy: 0.50, multiplier: dec!(0.90) },
            ],
            dec!(0.80),
        )
    }
}

impl YieldAdjuster {
    /// Build an adjuster; `floor_multiplier` applies below the lowest tier.
    pub fn new(mut tiers: Vec<YieldTier>, floor_multiplier: Decimal) -> Self {
        tiers.sort_by(|a, b| b.min_occupancy.total_cmp(&a.min_occupancy));
        Self {
            tiers,
            floor_multiplier,
        }
    }

    pub fn multiplier_for(&self, occupancy: f64) -> Result<Decimal, RateError> {
        validate_occupancy(occupancy)?;

        Ok(self
            .tiers
            .iter()
            .find(|tier| occupancy >= tier.min_occupancy)
            .map(|tier| tier.multiplier)
            .unwrap_or(self.floor_multiplier))
    }

    /// Apply the yield multiplier to a stay subtotal.
    ///
    /// The delta is recorded as a "Yield Management" adjustment even when the
    /// multiplier is neutral.
    pub fn apply_yield(&self, subtotal: Decimal, occupancy: f64) -> Result<YieldResult, RateError> {
        let multiplier = self.multiplier_for(occupancy)?;
        let adjusted_total = round_money(subtotal * multiplier, 2);

        Ok(YieldResult {
            adjusted_total,
            multiplier,
            adjustment: Adjustment {
                name: YIELD_ADJUSTMENT_NAME.to_string(),
                kind: AdjustmentKind::Percentage,
                value: (multiplier - Decimal::ONE) * Decimal::ONE_HUNDRED,
                amount: adjusted_total - subtotal,
            },
        })
    }
}

/// Occupancy must be a fraction in [0, 1]
pub fn validate_occupancy(occupancy: f64) -> Result<(), RateError> {
    if (0.0..=1.0).contains(&occupancy) {
        Ok(())
    } else {
        Err(RateError::YieldInput { occupancy })
    }
}
