//! Hotel rate engine.
//!
//! Prices hotel stays from rate windows and seasonal rates, with yield
//! management, behind a small JSON API.

pub mod cache;
pub mod config;
pub mod error;
pub mod rates;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{CachedRuleStore, RuleCache};
use crate::config::Config;
use crate::rates::{
    BatchRepricer, OccupancySource, RateCalculationService, RuleStore, ServiceSettings,
};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub rates: RateCalculationService,
    pub repricer: BatchRepricer,
    pub cache: RuleCache,
    /// Cancelled on shutdown so long-running batches stop cleanly
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the engine: the rule store is wrapped in a read-through cache.
    pub fn new(
        config: &Config,
        store: Arc<dyn RuleStore>,
        occupancy: Arc<dyn OccupancySource>,
        shutdown: CancellationToken,
    ) -> Self {
        let cache = RuleCache::new(config.rule_cache_ttl, config.rule_cache_capacity);
        let cached_store = Arc::new(CachedRuleStore::new(store, cache.clone()));

        let rates = RateCalculationService::new(
            cached_store,
            occupancy,
            ServiceSettings {
                fetch_timeout: config.store_timeout,
                max_stay_nights: config.max_stay_nights,
            },
        );
        let repricer = BatchRepricer::new(rates.clone(), config.batch_concurrency)
            .with_max_jobs(config.max_batch_jobs);

        Self {
            rates,
            repricer,
            cache,
            shutdown,
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/rates", rates::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
