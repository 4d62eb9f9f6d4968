//! Database queries for the rate engine.
//!
//! Read-only: rule records are written by external administration tooling.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{RateWindow, SeasonalRate};

/// Active rate windows overlapping [from, to], optionally scoped to a room
/// type (universal windows always included)
pub async fn find_rate_windows(
    pool: &PgPool,
    organization_id: Uuid,
    room_type_id: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<RateWindow>, sqlx::Error> {
    sqlx::query_as::<_, RateWindow>(
        r#"
        SELECT
            id, organization_id, room_type_id, name,
            valid_from, valid_until,
            COALESCE(day_conditions, '{}'::jsonb) AS day_conditions,
            base_rate, single_rate, extra_person_rate,
            priority, is_active
        FROM rate_windows
        WHERE organization_id = $1
          AND is_active = true
          AND valid_from <= $4
          AND valid_until >= $3
          AND ($2::uuid IS NULL OR room_type_id IS NULL OR room_type_id = $2)
        ORDER BY priority DESC, id ASC
        "#,
    )
    .bind(organization_id)
    .bind(room_type_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Active seasonal rates for one room type overlapping [from, to]
pub async fn find_seasonal_rates(
    pool: &PgPool,
    organization_id: Uuid,
    room_type_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SeasonalRate>, sqlx::Error> {
    sqlx::query_as::<_, SeasonalRate>(
        r#"
        SELECT
            id, organization_id, room_type_id, season,
            valid_from, valid_until,
            base_rate, weekend_rate,
            COALESCE(multiplier, 1.0) AS multiplier,
            is_active
        FROM seasonal_rates
        WHERE organization_id = $1
          AND room_type_id = $2
          AND is_active = true
          AND valid_from <= $4
          AND valid_until >= $3
        ORDER BY valid_from DESC, id ASC
        "#,
    )
    .bind(organization_id)
    .bind(room_type_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Fraction of rooms currently occupied, `None` when the property has no rooms
pub async fn find_occupancy_fraction(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status = 'occupied')::float8
                / NULLIF(COUNT(*), 0)::float8
        FROM rooms
        WHERE organization_id = $1
          AND is_active = true
        "#,
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await
}
