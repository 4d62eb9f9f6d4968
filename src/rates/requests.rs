//! Request DTOs for rate API endpoints.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::batch::RepriceJob;
use super::models::{GuestType, StayRequest};
use super::services::YieldMode;

/// Request to calculate the price of a stay
#[derive(Debug, Deserialize)]
pub struct CalculateRateRequest {
    pub organization_id: Uuid,
    pub room_type_id: Uuid,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub guest_type: GuestType,
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Explicit occupancy fraction; implies yield management
    #[serde(default)]
    pub occupancy: Option<f64>,
    /// Apply yield management using the property's current occupancy
    #[serde(default)]
    pub apply_yield: bool,
}

fn default_adults() -> u32 {
    2
}

impl CalculateRateRequest {
    pub fn stay(&self) -> StayRequest {
        StayRequest {
            organization_id: self.organization_id,
            room_type_id: self.room_type_id,
            arrival_date: self.arrival_date,
            departure_date: self.departure_date,
            adults: self.adults,
            children: self.children,
            guest_type: self.guest_type,
            promo_code: self.promo_code.clone(),
        }
    }

    pub fn yield_mode(&self) -> YieldMode {
        match (self.occupancy, self.apply_yield) {
            (Some(occupancy), _) => YieldMode::Fixed(occupancy),
            (None, true) => YieldMode::FromSource,
            (None, false) => YieldMode::None,
        }
    }
}

/// Request to re-price many room types and date ranges
#[derive(Debug, Deserialize)]
pub struct RepriceRequest {
    pub organization_id: Uuid,
    pub stays: Vec<RepriceStayRequest>,
    #[serde(default)]
    pub occupancy: Option<f64>,
    #[serde(default)]
    pub apply_yield: bool,
}

/// A single stay in a re-pricing batch
#[derive(Debug, Deserialize)]
pub struct RepriceStayRequest {
    pub room_type_id: Uuid,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    #[serde(default = "default_adults")]
    pub adults: u32,
}

impl RepriceRequest {
    pub fn jobs(&self) -> Vec<RepriceJob> {
        self.stays
            .iter()
            .map(|stay| RepriceJob {
                organization_id: self.organization_id,
                room_type_id: stay.room_type_id,
                arrival_date: stay.arrival_date,
                departure_date: stay.departure_date,
                adults: stay.adults,
            })
            .collect()
    }

    pub fn yield_mode(&self) -> YieldMode {
        match (self.occupancy, self.apply_yield) {
            (Some(occupancy), _) => YieldMode::Fixed(occupancy),
            (None, true) => YieldMode::FromSource,
            (None, false) => YieldMode::None,
        }
    }
}

/// Request to drop cached rule data
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateCacheRequest {
    #[serde(default)]
    pub organization_id: Option<Uuid>,
}
