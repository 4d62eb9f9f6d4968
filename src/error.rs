//! Error handling for the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::rates::responses::RateErrorResponse;
use crate::rates::RateError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rate(#[from] RateError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rate(RateError::Validation { .. } | RateError::YieldInput { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Rate(
                RateError::StoreUnavailable { .. }
                | RateError::StoreTimeout { .. }
                | RateError::OccupancyUnavailable { .. }
                | RateError::Cancelled,
            ) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let AppError::Rate(e) = &self;
        if status.is_server_error() {
            tracing::error!("Rate calculation failed: {}", e);
        } else {
            tracing::debug!("Rejected rate request: {}", e);
        }

        let body = RateErrorResponse {
            error_type: e.error_type().to_string(),
            message: e.to_string(),
            details: details_for(e),
        };

        (status, Json(body)).into_response()
    }
}

/// Structured context for diagnosing the failure
fn details_for(error: &RateError) -> Option<serde_json::Value> {
    match error {
        RateError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
        RateError::StoreUnavailable {
            organization_id,
            room_type_id,
            ..
        }
        | RateError::StoreTimeout {
            organization_id,
            room_type_id,
            ..
        } => Some(serde_json::json!({
            "organization_id": organization_id,
            "room_type_id": room_type_id,
        })),
        RateError::YieldInput { occupancy } => Some(serde_json::json!({ "occupancy": occupancy })),
        RateError::OccupancyUnavailable { .. } | RateError::Cancelled => None,
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation = AppError::from(RateError::validation("adults", "too few"));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let yield_input = AppError::from(RateError::YieldInput { occupancy: 2.0 });
        assert_eq!(yield_input.status(), StatusCode::BAD_REQUEST);

        let store = AppError::from(RateError::StoreUnavailable {
            organization_id: uuid::Uuid::nil(),
            room_type_id: uuid::Uuid::nil(),
            message: "down".to_string(),
        });
        assert_eq!(store.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
