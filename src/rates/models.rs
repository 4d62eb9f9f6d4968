//! Rate rule records and stay pricing types.
//!
//! Rule records use sqlx's FromRow derive for direct database deserialization.
//! They are read-only from the engine's point of view.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Role a night plays within a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightRole {
    pub is_arrival: bool,
    pub is_departure: bool,
}

impl NightRole {
    /// Role of `date` in a stay spanning `[arrival, departure)`
    pub fn for_night(date: NaiveDate, arrival: NaiveDate, departure: NaiveDate) -> Self {
        Self {
            is_arrival: date == arrival,
            is_departure: date.checked_add_days(Days::new(1)) == Some(departure),
        }
    }

    pub fn is_mid_stay(&self) -> bool {
        !self.is_arrival && !self.is_departure
    }
}

/// Per-weekday applicability flags. `None` means allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay: Option<bool>,
}

impl DayCondition {
    /// Only an explicit `false` for the night's role is a veto.
    pub fn permits(&self, role: NightRole) -> bool {
        let vetoed = |flag: Option<bool>| flag == Some(false);

        if role.is_arrival && vetoed(self.arrival) {
            return false;
        }
        if role.is_departure && vetoed(self.departure) {
            return false;
        }
        if role.is_mid_stay() && vetoed(self.stay) {
            return false;
        }
        true
    }

    fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }
}

/// Day conditions for all seven weekdays, Monday first.
///
/// Stored upstream as a JSON object keyed by weekday name; missing days are
/// fully permissive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, DayCondition>",
    into = "BTreeMap<String, DayCondition>"
)]
pub struct WeeklyConditions([DayCondition; 7]);

impl WeeklyConditions {
    pub fn for_weekday(&self, weekday: Weekday) -> &DayCondition {
        &self.0[weekday.num_days_from_monday() as usize]
    }

    /// Replace the condition for one weekday
    pub fn with(mut self, weekday: Weekday, condition: DayCondition) -> Self {
        self.0[weekday.num_days_from_monday() as usize] = condition;
        self
    }

    pub fn permits(&self, date: NaiveDate, role: NightRole) -> bool {
        self.for_weekday(date.weekday()).permits(role)
    }
}

impl From<BTreeMap<String, DayCondition>> for WeeklyConditions {
    fn from(map: BTreeMap<String, DayCondition>) -> Self {
        let mut conditions = Self::default();
        for (key, condition) in map {
            match key.trim().parse::<Weekday>() {
                Ok(weekday) => conditions = conditions.with(weekday, condition),
                Err(_) => tracing::warn!("Ignoring unknown day condition key: {}", key),
            }
        }
        conditions
    }
}

impl From<WeeklyConditions> for BTreeMap<String, DayCondition> {
    fn from(conditions: WeeklyConditions) -> Self {
        WEEKDAY_NAMES
            .iter()
            .zip(conditions.0)
            .filter(|(_, condition)| !condition.is_unrestricted())
            .map(|(name, condition)| (name.to_string(), condition))
            .collect()
    }
}

/// Rate window from rate_windows
#[derive(Debug, Clone, FromRow)]
pub struct RateWindow {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// `None` applies to every room type
    pub room_type_id: Option<Uuid>,
    pub name: Option<String>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    #[sqlx(json)]
    pub day_conditions: WeeklyConditions,
    pub base_rate: Decimal,
    pub single_rate: Option<Decimal>,
    pub extra_person_rate: Option<Decimal>,
    pub priority: i32,
    pub is_active: bool,
}

impl RateWindow {
    /// Check if the window is active and covers the given night
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.valid_from <= date && date <= self.valid_until
    }

    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.valid_from <= to && from <= self.valid_until
    }

    pub fn applies_to_room_type(&self, room_type_id: Uuid) -> bool {
        self.room_type_id.map_or(true, |id| id == room_type_id)
    }
}

/// Seasonal rate from seasonal_rates
#[derive(Debug, Clone, FromRow)]
pub struct SeasonalRate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub room_type_id: Uuid,
    pub season: String,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub base_rate: Decimal,
    pub weekend_rate: Option<Decimal>,
    pub multiplier: Decimal,
    pub is_active: bool,
}

impl SeasonalRate {
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.valid_from <= date && date <= self.valid_until
    }

    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.valid_from <= to && from <= self.valid_until
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestType {
    #[default]
    Individual,
    Group,
    Corporate,
}

/// A stay to be priced. `departure_date` is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct StayRequest {
    pub organization_id: Uuid,
    pub room_type_id: Uuid,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub guest_type: GuestType,
    pub promo_code: Option<String>,
}

impl StayRequest {
    pub fn nights(&self) -> i64 {
        (self.departure_date - self.arrival_date).num_days()
    }

    /// The nights of the stay, in order
    pub fn night_dates(&self) -> impl Iterator<Item = NaiveDate> {
        let departure = self.departure_date;
        self.arrival_date
            .iter_days()
            .take_while(move |date| *date < departure)
    }

    /// Date of the final night, if the stay has any
    pub fn last_night(&self) -> Option<NaiveDate> {
        self.departure_date.pred_opt().filter(|d| *d >= self.arrival_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Percentage,
    Fixed,
}

/// A named change applied on top of a rate
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub name: String,
    pub kind: AdjustmentKind,
    /// Percent points for `Percentage`, money for `Fixed`
    pub value: Decimal,
    /// Signed money delta actually applied
    pub amount: Decimal,
}

/// The rule a night's price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum AppliedRule {
    Window(Uuid),
    Seasonal(Uuid),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRate {
    pub date: NaiveDate,
    /// Seasonal base for the night (zero when no season covers it)
    pub base_rate: Decimal,
    pub adjusted_rate: Decimal,
    pub rule: AppliedRule,
    pub adjustments: Vec<Adjustment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateBreakdown {
    pub accommodation: Decimal,
    /// Not computed by this engine
    pub extras: Decimal,
    /// Not computed by this engine
    pub taxes: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateWarning {
    NoApplicableRule { date: NaiveDate, room_type_id: Uuid },
}

impl std::fmt::Display for RateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateWarning::NoApplicableRule { date, room_type_id } => write!(
                f,
                "No rate window or seasonal rate applies to room type {} on {}",
                room_type_id, date
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateCalculationResult {
    pub total_amount: Decimal,
    pub daily_rates: Vec<DailyRate>,
    pub breakdown: RateBreakdown,
    /// Stay-level adjustments such as yield management
    pub adjustments: Vec<Adjustment>,
    pub warnings: Vec<RateWarning>,
}
