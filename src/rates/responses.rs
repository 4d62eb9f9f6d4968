//! Response DTOs for rate API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::batch::{BatchReport, RepriceOutcome};
use super::models::{
    Adjustment, AdjustmentKind, AppliedRule, DailyRate, RateCalculationResult,
};

/// A named adjustment in JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentResponse {
    pub name: String,
    pub kind: AdjustmentKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

impl From<&Adjustment> for AdjustmentResponse {
    fn from(adjustment: &Adjustment) -> Self {
        Self {
            name: adjustment.name.clone(),
            kind: adjustment.kind,
            value: adjustment.value,
            amount: adjustment.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyRateResponse {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub adjusted_rate: Decimal,
    pub applied_rule: AppliedRule,
    pub adjustments: Vec<AdjustmentResponse>,
}

impl From<&DailyRate> for DailyRateResponse {
    fn from(rate: &DailyRate) -> Self {
        Self {
            date: rate.date,
            base_rate: rate.base_rate,
            adjusted_rate: rate.adjusted_rate,
            applied_rule: rate.rule,
            adjustments: rate.adjustments.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub accommodation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extras: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub taxes: Decimal,
}

/// Response for rate calculation
#[derive(Debug, Serialize)]
pub struct RateCalculationResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub nights: usize,
    pub daily_rates: Vec<DailyRateResponse>,
    pub breakdown: BreakdownResponse,
    pub adjustments: Vec<AdjustmentResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&RateCalculationResult> for RateCalculationResponse {
    fn from(result: &RateCalculationResult) -> Self {
        Self {
            total_amount: result.total_amount,
            nights: result.daily_rates.len(),
            daily_rates: result.daily_rates.iter().map(Into::into).collect(),
            breakdown: BreakdownResponse {
                accommodation: result.breakdown.accommodation,
                extras: result.breakdown.extras,
                taxes: result.breakdown.taxes,
            },
            adjustments: result.adjustments.iter().map(Into::into).collect(),
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// One job of a re-pricing batch
#[derive(Debug, Serialize)]
pub struct RepriceOutcomeResponse {
    pub room_type_id: uuid::Uuid,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RateCalculationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RateErrorResponse>,
}

impl From<&RepriceOutcome> for RepriceOutcomeResponse {
    fn from(outcome: &RepriceOutcome) -> Self {
        let (result, error) = match &outcome.result {
            Ok(result) => (Some(result.into()), None),
            Err(e) => (
                None,
                Some(RateErrorResponse {
                    error_type: e.error_type().to_string(),
                    message: e.to_string(),
                    details: None,
                }),
            ),
        };
        Self {
            room_type_id: outcome.job.room_type_id,
            arrival_date: outcome.job.arrival_date,
            departure_date: outcome.job.departure_date,
            result,
            error,
        }
    }
}

/// Response for batch re-pricing
#[derive(Debug, Serialize)]
pub struct RepriceResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub panicked: usize,
    pub outcomes: Vec<RepriceOutcomeResponse>,
}

impl From<&BatchReport> for RepriceResponse {
    fn from(report: &BatchReport) -> Self {
        Self {
            succeeded: report.succeeded(),
            failed: report.failed(),
            cancelled: report.cancelled,
            panicked: report.panicked,
            outcomes: report.outcomes.iter().map(Into::into).collect(),
        }
    }
}

/// Generic rate error response
#[derive(Debug, Serialize)]
pub struct RateErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
