//! Occupancy sources for yield management.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::RateError;
use super::queries;
use super::yield_management::validate_occupancy;

/// Supplies the occupancy fraction used for yield adjustment
#[async_trait]
pub trait OccupancySource: Send + Sync {
    async fn occupancy(&self, organization_id: Uuid, date: NaiveDate) -> Result<f64, RateError>;
}

/// Always reports the same occupancy
#[derive(Debug, Clone, Copy)]
pub struct FixedOccupancy(pub f64);

#[async_trait]
impl OccupancySource for FixedOccupancy {
    async fn occupancy(&self, _organization_id: Uuid, _date: NaiveDate) -> Result<f64, RateError> {
        validate_occupancy(self.0)?;
        Ok(self.0)
    }
}

/// Current room status occupancy from the rooms table.
///
/// The query reflects today's status; the date is only used for logging.
#[derive(Clone)]
pub struct PgOccupancySource {
    pool: PgPool,
}

impl PgOccupancySource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OccupancySource for PgOccupancySource {
    async fn occupancy(&self, organization_id: Uuid, date: NaiveDate) -> Result<f64, RateError> {
        let fraction = queries::find_occupancy_fraction(&self.pool, organization_id)
            .await
            .map_err(|e| RateError::OccupancyUnavailable {
                message: e.to_string(),
            })?
            .unwrap_or(0.0);

        tracing::debug!(%organization_id, %date, fraction, "Occupancy loaded");
        validate_occupancy(fraction)?;
        Ok(fraction)
    }
}
