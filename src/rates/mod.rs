//! Rate calculation and yield management engine.
//!
//! Resolves nightly accommodation prices from rate windows and seasonal
//! rates, adjusts for occupancy, and applies demand-driven yield to the stay
//! total.

pub mod batch;
pub mod calculators;
pub mod error;
pub mod models;
pub mod occupancy;
pub mod queries;
pub mod requests;
pub mod resolver;
pub mod responses;
pub mod routes;
pub mod services;
pub mod store;
pub mod yield_management;

// Re-export commonly used items
pub use batch::{BatchReport, BatchRepricer, RepriceJob};
pub use calculators::round_money;
pub use error::RateError;
pub use models::{RateCalculationResult, StayRequest};
pub use occupancy::{FixedOccupancy, OccupancySource, PgOccupancySource};
pub use resolver::DailyRateResolver;
pub use routes::router;
pub use services::{RateCalculationService, ServiceSettings, YieldMode};
pub use store::{InMemoryRuleStore, PgRuleStore, RuleStore, StoreError};
pub use yield_management::YieldAdjuster;
