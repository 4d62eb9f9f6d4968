//! Rate calculation service.
//!
//! Fetches rules through the injected store, resolves every night of the stay
//! and optionally applies yield management to the stay total.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::error::RateError;
use super::models::{RateBreakdown, RateCalculationResult, StayRequest};
use super::occupancy::OccupancySource;
use super::resolver::DailyRateResolver;
use super::store::{RuleStore, StoreError};
use super::yield_management::{validate_occupancy, YieldAdjuster};

/// Tunables for the calculation service
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    /// Applied to each rule store fetch
    pub fetch_timeout: Duration,
    pub max_stay_nights: i64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            max_stay_nights: 365,
        }
    }
}

/// How yield management takes part in a quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YieldMode {
    /// Plain calculation
    None,
    /// Use the caller-supplied occupancy fraction
    Fixed(f64),
    /// Ask the occupancy source for the arrival date
    FromSource,
}

#[derive(Clone)]
pub struct RateCalculationService {
    store: Arc<dyn RuleStore>,
    occupancy: Arc<dyn OccupancySource>,
    yield_adjuster: YieldAdjuster,
    settings: ServiceSettings,
}

impl RateCalculationService {
    pub fn new(
        store: Arc<dyn RuleStore>,
        occupancy: Arc<dyn OccupancySource>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            occupancy,
            yield_adjuster: YieldAdjuster::default(),
            settings,
        }
    }

    pub fn with_yield_adjuster(mut self, yield_adjuster: YieldAdjuster) -> Self {
        self.yield_adjuster = yield_adjuster;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Reject malformed requests before any store access
    pub fn validate(&self, request: &StayRequest) -> Result<(), RateError> {
        let nights = request.nights();
        if nights <= 0 {
            return Err(RateError::validation(
                "departure_date",
                format!(
                    "departure {} must be after arrival {}",
                    request.departure_date, request.arrival_date
                ),
            ));
        }
        if nights > self.settings.max_stay_nights {
            return Err(RateError::validation(
                "departure_date",
                format!(
                    "stay of {} nights exceeds the maximum of {}",
                    nights, self.settings.max_stay_nights
                ),
            ));
        }
        if request.adults < 1 {
            return Err(RateError::validation("adults", "at least one adult is required"));
        }
        Ok(())
    }

    /// Price a stay without yield management
    pub async fn calculate(&self, request: &StayRequest) -> Result<RateCalculationResult, RateError> {
        self.quote(request, YieldMode::None).await
    }

    /// Price a stay and apply yield management once to the stay total
    pub async fn calculate_with_yield(
        &self,
        request: &StayRequest,
        occupancy: f64,
    ) -> Result<RateCalculationResult, RateError> {
        self.quote(request, YieldMode::Fixed(occupancy)).await
    }

    /// Single calculation path behind both entry points.
    ///
    /// Either returns a complete breakdown or one error; never a partial result.
    pub async fn quote(
        &self,
        request: &StayRequest,
        yield_mode: YieldMode,
    ) -> Result<RateCalculationResult, RateError> {
        self.validate(request)?;
        if let YieldMode::Fixed(occupancy) = yield_mode {
            validate_occupancy(occupancy)?;
        }
        if let Some(code) = &request.promo_code {
            debug!("Promo code {} accepted but not priced by the rate engine", code);
        }

        let from = request.arrival_date;
        let to = request
            .last_night()
            .ok_or_else(|| RateError::validation("departure_date", "stay has no nights"))?;

        let windows_fetch = self.store.windows(
            request.organization_id,
            Some(request.room_type_id),
            from,
            to,
        );
        let seasons_fetch = self.store.seasonal_rates(
            request.organization_id,
            request.room_type_id,
            from,
            to,
        );
        let (windows, seasons) = tokio::try_join!(
            self.with_timeout(request, windows_fetch),
            self.with_timeout(request, seasons_fetch),
        )?;

        let resolver =
            DailyRateResolver::new(&windows, &seasons, request.room_type_id, request.adults);
        let (daily_rates, warnings) =
            resolver.resolve_stay(request.arrival_date, request.departure_date);

        let breakdown = RateBreakdown {
            accommodation: daily_rates.iter().map(|d| d.adjusted_rate).sum(),
            extras: Decimal::ZERO,
            taxes: Decimal::ZERO,
        };

        let occupancy = match yield_mode {
            YieldMode::None => None,
            YieldMode::Fixed(occupancy) => Some(occupancy),
            YieldMode::FromSource => Some(self.source_occupancy(request).await?),
        };

        let mut adjustments = Vec::new();
        let accommodation_total = match occupancy {
            Some(occupancy) => {
                let applied = self
                    .yield_adjuster
                    .apply_yield(breakdown.accommodation, occupancy)?;
                adjustments.push(applied.adjustment);
                applied.adjusted_total
            }
            None => breakdown.accommodation,
        };
        let total_amount = accommodation_total + breakdown.extras + breakdown.taxes;

        info!(
            organization_id = %request.organization_id,
            room_type_id = %request.room_type_id,
            nights = daily_rates.len(),
            %total_amount,
            warnings = warnings.len(),
            "Rate calculated"
        );

        Ok(RateCalculationResult {
            total_amount,
            daily_rates,
            breakdown,
            adjustments,
            warnings,
        })
    }

    /// Occupancy for the arrival date, bounded by the fetch timeout
    async fn source_occupancy(&self, request: &StayRequest) -> Result<f64, RateError> {
        let lookup = self
            .occupancy
            .occupancy(request.organization_id, request.arrival_date);

        match tokio::time::timeout(self.settings.fetch_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(RateError::OccupancyUnavailable {
                message: format!(
                    "occupancy lookup timed out after {:?}",
                    self.settings.fetch_timeout
                ),
            }),
        }
    }

    async fn with_timeout<T, F>(&self, request: &StayRequest, fetch: F) -> Result<T, RateError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.fetch_timeout, fetch).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RateError::StoreUnavailable {
                organization_id: request.organization_id,
                room_type_id: request.room_type_id,
                message: e.to_string(),
            }),
            Err(_) => Err(RateError::StoreTimeout {
                organization_id: request.organization_id,
                room_type_id: request.room_type_id,
                timeout: self.settings.fetch_timeout,
            }),
        }
    }
}
