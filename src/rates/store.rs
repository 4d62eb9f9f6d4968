//! Read access to rate rules.
//!
//! `RuleStore` is the seam between the engine and wherever rules live. The
//! PostgreSQL store is used in production; the in-memory store backs tests
//! and local tooling.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{RateWindow, SeasonalRate};
use super::queries;
use super::resolver::window_precedence;

/// Failure reading from a rule store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active windows intersecting [from, to], ordered by priority descending.
    /// With a room type, only windows for that type or for all types.
    async fn windows(
        &self,
        organization_id: Uuid,
        room_type_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateWindow>, StoreError>;

    /// Active seasonal rates for one room type intersecting [from, to]
    async fn seasonal_rates(
        &self,
        organization_id: Uuid,
        room_type_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, StoreError>;
}

/// Rule store backed by the rate_windows and seasonal_rates tables
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleStore for PgRuleStore {
    async fn windows(
        &self,
        organization_id: Uuid,
        room_type_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateWindow>, StoreError> {
        Ok(queries::find_rate_windows(&self.pool, organization_id, room_type_id, from, to).await?)
    }

    async fn seasonal_rates(
        &self,
        organization_id: Uuid,
        room_type_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, StoreError> {
        Ok(queries::find_seasonal_rates(&self.pool, organization_id, room_type_id, from, to).await?)
    }
}

/// In-memory rule store applying the same filters as the SQL queries
#[derive(Clone, Default)]
pub struct InMemoryRuleStore {
    windows: Arc<RwLock<Vec<RateWindow>>>,
    seasonal_rates: Arc<RwLock<Vec<SeasonalRate>>>,
    unavailable: Arc<RwLock<Option<String>>>,
}

impl InMemoryRuleStore {
    pub fn new(windows: Vec<RateWindow>, seasonal_rates: Vec<SeasonalRate>) -> Self {
        Self {
            windows: Arc::new(RwLock::new(windows)),
            seasonal_rates: Arc::new(RwLock::new(seasonal_rates)),
            unavailable: Arc::default(),
        }
    }

    pub fn replace_windows(&self, windows: Vec<RateWindow>) {
        if let Ok(mut guard) = self.windows.write() {
            *guard = windows;
        }
    }

    pub fn replace_seasonal_rates(&self, seasonal_rates: Vec<SeasonalRate>) {
        if let Ok(mut guard) = self.seasonal_rates.write() {
            *guard = seasonal_rates;
        }
    }

    /// Make every read fail with the given message (`None` restores reads)
    pub fn set_unavailable(&self, message: Option<&str>) {
        if let Ok(mut guard) = self.unavailable.write() {
            *guard = message.map(str::to_string);
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        let guard = self
            .unavailable
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        match guard.as_deref() {
            Some(message) => Err(StoreError::Unavailable(message.to_string())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn windows(
        &self,
        organization_id: Uuid,
        room_type_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateWindow>, StoreError> {
        self.check_available()?;
        let guard = self
            .windows
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        let mut windows: Vec<RateWindow> = guard
            .iter()
            .filter(|w| w.organization_id == organization_id && w.is_active)
            .filter(|w| w.overlaps(from, to))
            .filter(|w| room_type_id.map_or(true, |id| w.applies_to_room_type(id)))
            .cloned()
            .collect();
        windows.sort_by(window_precedence);

        Ok(windows)
    }

    async fn seasonal_rates(
        &self,
        organization_id: Uuid,
        room_type_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, StoreError> {
        self.check_available()?;
        let guard = self
            .seasonal_rates
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;

        Ok(guard
            .iter()
            .filter(|s| s.organization_id == organization_id && s.room_type_id == room_type_id)
            .filter(|s| s.is_active && s.overlaps(from, to))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::models::WeeklyConditions;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(id: u128, room_type_id: Option<Uuid>, priority: i32) -> RateWindow {
        RateWindow {
            id: Uuid::from_u128(id),
            organization_id: Uuid::from_u128(100),
            room_type_id,
            name: Some(format!("window-{}", id)),
            valid_from: date(2024, 6, 1),
            valid_until: date(2024, 6, 30),
            day_conditions: WeeklyConditions::default(),
            base_rate: dec!(50000),
            single_rate: None,
            extra_person_rate: None,
            priority,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_windows_filtered_and_ordered() {
        let room = Uuid::from_u128(1);
        let other_room = Uuid::from_u128(2);
        let mut inactive = window(4, None, 99);
        inactive.is_active = false;

        let store = InMemoryRuleStore::new(
            vec![
                window(1, Some(room), 1),
                window(2, None, 5),
                window(3, Some(other_room), 10),
                inactive,
            ],
            vec![],
        );

        let windows = store
            .windows(Uuid::from_u128(100), Some(room), date(2024, 6, 10), date(2024, 6, 12))
            .await
            .unwrap();
        let ids: Vec<u128> = windows.iter().map(|w| w.id.as_u128()).collect();
        assert_eq!(ids, vec![2, 1]);

        let all = store
            .windows(Uuid::from_u128(100), None, date(2024, 6, 10), date(2024, 6, 12))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_windows_outside_range_excluded() {
        let store = InMemoryRuleStore::new(vec![window(1, None, 1)], vec![]);
        let windows = store
            .windows(Uuid::from_u128(100), None, date(2024, 7, 1), date(2024, 7, 5))
            .await
            .unwrap();
        assert!(windows.is_empty());

        // Touching the last valid day counts as an intersection
        let windows = store
            .windows(Uuid::from_u128(100), None, date(2024, 6, 30), date(2024, 7, 5))
            .await
            .unwrap();
        assert_eq!(windows.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = InMemoryRuleStore::default();
        store.set_unavailable(Some("connection refused"));

        let err = store
            .windows(Uuid::nil(), None, date(2024, 6, 1), date(2024, 6, 2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        store.set_unavailable(None);
        assert!(store
            .windows(Uuid::nil(), None, date(2024, 6, 1), date(2024, 6, 2))
            .await
            .is_ok());
    }
}
