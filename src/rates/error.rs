//! Rate calculation error types

use std::time::Duration;

use uuid::Uuid;

/// Errors surfaced by the rate engine. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("Invalid stay request ({field}): {message}")]
    Validation { field: &'static str, message: String },

    #[error("Rule store unavailable for organization {organization_id}, room type {room_type_id}: {message}")]
    StoreUnavailable {
        organization_id: Uuid,
        room_type_id: Uuid,
        message: String,
    },

    #[error("Rule store timed out after {timeout:?} for organization {organization_id}, room type {room_type_id}")]
    StoreTimeout {
        organization_id: Uuid,
        room_type_id: Uuid,
        timeout: Duration,
    },

    #[error("Occupancy must be within [0, 1], got {occupancy}")]
    YieldInput { occupancy: f64 },

    #[error("Occupancy source unavailable: {message}")]
    OccupancyUnavailable { message: String },

    #[error("Rate calculation cancelled")]
    Cancelled,
}

impl RateError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        RateError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Short machine-readable name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            RateError::Validation { .. } => "validation_error",
            RateError::StoreUnavailable { .. } => "store_unavailable",
            RateError::StoreTimeout { .. } => "store_timeout",
            RateError::YieldInput { .. } => "yield_input_error",
            RateError::OccupancyUnavailable { .. } => "occupancy_unavailable",
            RateError::Cancelled => "cancelled",
        }
    }
}
