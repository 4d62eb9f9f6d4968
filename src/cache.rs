//! In-memory caching using moka
//!
//! Read-through cache for rate rules, keyed by organization, room type and
//! date range. TTLs are short so administrative rule edits show up quickly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::rates::models::{RateWindow, SeasonalRate};
use crate::rates::store::{RuleStore, StoreError};

pub const MIN_RULE_TTL: Duration = Duration::from_secs(60);
pub const MAX_RULE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache key for a rule query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub organization_id: Uuid,
    pub room_type_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Rule cache holding rate windows and seasonal rates
#[derive(Clone)]
pub struct RuleCache {
    /// Rate windows (query -> windows ordered by priority)
    pub windows: Cache<RuleKey, Arc<Vec<RateWindow>>>,
    /// Seasonal rates (query -> seasons for one room type)
    pub seasonal_rates: Cache<RuleKey, Arc<Vec<SeasonalRate>>>,
}

impl RuleCache {
    /// Create a cache; the TTL is clamped to 1-5 minutes.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let ttl = ttl.clamp(MIN_RULE_TTL, MAX_RULE_TTL);
        Self {
            windows: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
            seasonal_rates: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            windows_size: self.windows.entry_count(),
            seasonal_rates_size: self.seasonal_rates.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.windows.invalidate_all();
        self.seasonal_rates.invalidate_all();
        info!("All rule caches invalidated");
    }

    /// Invalidate every cached query for one organization
    pub fn invalidate_organization(&self, organization_id: Uuid) {
        let windows = self
            .windows
            .invalidate_entries_if(move |key, _| key.organization_id == organization_id);
        let seasons = self
            .seasonal_rates
            .invalidate_entries_if(move |key, _| key.organization_id == organization_id);

        match windows.and(seasons) {
            Ok(_) => info!("Rule cache invalidated for organization: {}", organization_id),
            Err(e) => {
                warn!("Selective invalidation failed ({}), clearing rule cache", e);
                self.invalidate_all();
            }
        }
    }

    /// Apply pending evictions; entry counts are eventually consistent
    pub async fn sync(&self) {
        self.windows.run_pending_tasks().await;
        self.seasonal_rates.run_pending_tasks().await;
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(120), 1_000)
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub windows_size: u64,
    pub seasonal_rates_size: u64,
}

/// Rule store that reads through a `RuleCache`
#[derive(Clone)]
pub struct CachedRuleStore {
    inner: Arc<dyn RuleStore>,
    cache: RuleCache,
}

impl CachedRuleStore {
    pub fn new(inner: Arc<dyn RuleStore>, cache: RuleCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }
}

#[async_trait]
impl RuleStore for CachedRuleStore {
    async fn windows(
        &self,
        organization_id: Uuid,
        room_type_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateWindow>, StoreError> {
        let key = RuleKey {
            organization_id,
            room_type_id,
            from,
            to,
        };

        if let Some(cached) = self.cache.windows.get(&key).await {
            debug!("Cache HIT for rate windows: {:?}", key);
            return Ok((*cached).clone());
        }

        debug!("Cache MISS for rate windows: {:?}", key);
        let windows = self.inner.windows(organization_id, room_type_id, from, to).await?;
        self.cache
            .windows
            .insert(key, Arc::new(windows.clone()))
            .await;
        Ok(windows)
    }

    async fn seasonal_rates(
        &self,
        organization_id: Uuid,
        room_type_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, StoreError> {
        let key = RuleKey {
            organization_id,
            room_type_id: Some(room_type_id),
            from,
            to,
        };

        if let Some(cached) = self.cache.seasonal_rates.get(&key).await {
            debug!("Cache HIT for seasonal rates: {:?}", key);
            return Ok((*cached).clone());
        }

        debug!("Cache MISS for seasonal rates: {:?}", key);
        let seasons = self
            .inner
            .seasonal_rates(organization_id, room_type_id, from, to)
            .await?;
        self.cache
            .seasonal_rates
            .insert(key, Arc::new(seasons.clone()))
            .await;
        Ok(seasons)
    }
}
