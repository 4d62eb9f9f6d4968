//! Runtime configuration from environment variables (.env supported)

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::rates::batch::DEFAULT_MAX_BATCH_JOBS;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub rule_cache_ttl: Duration,
    pub rule_cache_capacity: u64,
    pub store_timeout: Duration,
    pub batch_concurrency: usize,
    pub max_batch_jobs: usize,
    pub max_stay_nights: i64,
}

impl Config {
    /// Load from the process environment after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32)?;

        Ok(Self {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            db_max_connections,
            rule_cache_ttl: Duration::from_secs(parse_or(&lookup, "RULE_CACHE_TTL_SECS", 120u64)?),
            rule_cache_capacity: parse_or(&lookup, "RULE_CACHE_CAPACITY", 1_000u64)?,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 5_000u64)?),
            batch_concurrency: parse_or(
                &lookup,
                "BATCH_CONCURRENCY",
                db_max_connections as usize,
            )?,
            max_batch_jobs: parse_or(&lookup, "MAX_BATCH_JOBS", DEFAULT_MAX_BATCH_JOBS)?,
            max_stay_nights: parse_or(&lookup, "MAX_STAY_NIGHTS", 365i64)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}
