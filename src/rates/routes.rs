//! Rate API route handlers

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;

use crate::cache::CacheStats;
use crate::error::Result;
use crate::AppState;

use super::requests::{CalculateRateRequest, InvalidateCacheRequest, RepriceRequest};
use super::responses::{RateCalculationResponse, RepriceResponse};

/// Routes mounted under /api/rates
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/reprice", post(reprice))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/stats", get(cache_stats))
}

/// Calculate the price of a single stay
pub async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRateRequest>,
) -> Result<Json<RateCalculationResponse>> {
    let result = state
        .rates
        .quote(&request.stay(), request.yield_mode())
        .await?;

    Ok(Json(RateCalculationResponse::from(&result)))
}

/// Re-price a batch of stays. The batch stops early on server shutdown.
pub async fn reprice(
    State(state): State<AppState>,
    Json(request): Json<RepriceRequest>,
) -> Result<Json<RepriceResponse>> {
    let cancel: CancellationToken = state.shutdown.child_token();
    let report = state
        .repricer
        .run(request.jobs(), request.yield_mode(), cancel)
        .await?;

    Ok(Json(RepriceResponse::from(&report)))
}

/// Drop cached rule data, for one organization or all of them
pub async fn invalidate_cache(
    State(state): State<AppState>,
    body: Option<Json<InvalidateCacheRequest>>,
) -> Json<CacheStats> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    match request.organization_id {
        Some(organization_id) => state.cache.invalidate_organization(organization_id),
        None => state.cache.invalidate_all(),
    }
    state.cache.sync().await;

    Json(state.cache.stats())
}

/// Cache statistics for monitoring
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    state.cache.sync().await;
    Json(state.cache.stats())
}
