//! Per-night rule selection.
//!
//! For each night of a stay the resolver picks one seasonal base and at most
//! one rate window. Windows never accumulate: the single highest-priority
//! candidate wins, with the rule id as a deterministic tie-break.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::calculators::{finalize_nightly, occupancy_adjusted_rate, seasonal_rate_for};
use super::models::{
    Adjustment, AppliedRule, DailyRate, NightRole, RateWarning, RateWindow, SeasonalRate,
};

/// Priority descending, then id ascending
pub fn window_precedence(a: &RateWindow, b: &RateWindow) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id))
}

/// Latest season start wins, then lowest id
fn season_precedence(a: &SeasonalRate, b: &SeasonalRate) -> Ordering {
    b.valid_from
        .cmp(&a.valid_from)
        .then_with(|| a.id.cmp(&b.id))
}

/// Resolves nightly rates against an already-fetched rule set
#[derive(Debug)]
pub struct DailyRateResolver<'a> {
    windows: Vec<&'a RateWindow>,
    seasons: Vec<&'a SeasonalRate>,
    room_type_id: Uuid,
    adults: u32,
}

/// Output for a single night
#[derive(Debug, Clone, PartialEq)]
pub struct NightResolution {
    pub daily_rate: DailyRate,
    pub warning: Option<RateWarning>,
}

impl<'a> DailyRateResolver<'a> {
    /// Rules are re-sorted here; store ordering is never relied on.
    pub fn new(
        windows: &'a [RateWindow],
        seasons: &'a [SeasonalRate],
        room_type_id: Uuid,
        adults: u32,
    ) -> Self {
        let mut windows: Vec<&RateWindow> = windows
            .iter()
            .filter(|w| w.applies_to_room_type(room_type_id))
            .collect();
        windows.sort_by(|a, b| window_precedence(a, b));

        let mut seasons: Vec<&SeasonalRate> = seasons
            .iter()
            .filter(|s| s.room_type_id == room_type_id)
            .collect();
        seasons.sort_by(|a, b| season_precedence(a, b));

        Self {
            windows,
            seasons,
            room_type_id,
            adults,
        }
    }

    /// Season covering the night, if any
    pub fn season_for(&self, date: NaiveDate) -> Option<&'a SeasonalRate> {
        self.seasons.iter().copied().find(|s| s.is_valid_on(date))
    }

    /// Highest-precedence window valid for the night and not vetoed by its
    /// day conditions
    pub fn window_for(&self, date: NaiveDate, role: NightRole) -> Option<&'a RateWindow> {
        self.windows
            .iter()
            .copied()
            .find(|w| w.is_valid_on(date) && w.day_conditions.permits(date, role))
    }

    pub fn resolve_night(
        &self,
        date: NaiveDate,
        arrival: NaiveDate,
        departure: NaiveDate,
    ) -> NightResolution {
        let role = NightRole::for_night(date, arrival, departure);

        let season = self.season_for(date);
        let (seasonal_base, seasonal_adjustment) = match season {
            Some(season) => seasonal_rate_for(season, date),
            None => (Decimal::ZERO, None),
        };

        let mut adjustments: Vec<Adjustment> = Vec::new();
        let mut warning = None;

        let (adjusted_rate, rule) = match (self.window_for(date, role), season) {
            (Some(window), _) => {
                let (rate, occupancy_adjustment) = occupancy_adjusted_rate(window, self.adults);
                adjustments.extend(occupancy_adjustment);
                (rate, AppliedRule::Window(window.id))
            }
            (None, Some(season)) => {
                adjustments.extend(seasonal_adjustment);
                (seasonal_base, AppliedRule::Seasonal(season.id))
            }
            (None, None) => {
                tracing::warn!(
                    room_type_id = %self.room_type_id,
                    %date,
                    "No rate window or seasonal rate applies, pricing night at zero"
                );
                warning = Some(RateWarning::NoApplicableRule {
                    date,
                    room_type_id: self.room_type_id,
                });
                (Decimal::ZERO, AppliedRule::None)
            }
        };

        NightResolution {
            daily_rate: DailyRate {
                date,
                base_rate: finalize_nightly(seasonal_base),
                adjusted_rate: finalize_nightly(adjusted_rate),
                rule,
                adjustments,
            },
            warning,
        }
    }

    /// Resolve every night in `[arrival, departure)`, in order
    pub fn resolve_stay(
        &self,
        arrival: NaiveDate,
        departure: NaiveDate,
    ) -> (Vec<DailyRate>, Vec<RateWarning>) {
        let mut daily_rates = Vec::new();
        let mut warnings = Vec::new();

        for date in arrival.iter_days().take_while(|d| *d < departure) {
            let night = self.resolve_night(date, arrival, departure);
            daily_rates.push(night.daily_rate);
            warnings.extend(night.warning);
        }

        (daily_rates, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::models::{DayCondition, WeeklyConditions};
    use chrono::Weekday;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn room() -> Uuid {
        Uuid::from_u128(7)
    }

    fn window(id: u128, priority: i32, base: Decimal) -> RateWindow {
        RateWindow {
            id: Uuid::from_u128(id),
            organization_id: Uuid::nil(),
            room_type_id: Some(room()),
            name: None,
            valid_from: date(2024, 1, 1),
            valid_until: date(2024, 12, 31),
            day_conditions: WeeklyConditions::default(),
            base_rate: base,
            single_rate: None,
            extra_person_rate: None,
            priority,
            is_active: true,
        }
    }

    fn season(id: u128, from: NaiveDate, until: NaiveDate, base: Decimal) -> SeasonalRate {
        SeasonalRate {
            id: Uuid::from_u128(id),
            organization_id: Uuid::nil(),
            room_type_id: room(),
            season: "season".to_string(),
            valid_from: from,
            valid_until: until,
            base_rate: base,
            weekend_rate: None,
            multiplier: dec!(1),
            is_active: true,
        }
    }

    #[test]
    fn test_higher_priority_wins_regardless_of_input_order() {
        let windows = vec![window(1, 5, dec!(30000)), window(2, 10, dec!(45000))];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(45000));
        assert_eq!(night.daily_rate.rule, AppliedRule::Window(Uuid::from_u128(2)));
    }

    #[test]
    fn test_equal_priority_tie_broken_by_id() {
        let windows = vec![window(9, 10, dec!(30000)), window(3, 10, dec!(45000))];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(night.daily_rate.rule, AppliedRule::Window(Uuid::from_u128(3)));
    }

    #[test]
    fn test_windows_do_not_accumulate() {
        let windows = vec![
            window(1, 1, dec!(10000)),
            window(2, 2, dec!(20000)),
            window(3, 3, dec!(30000)),
        ];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);
        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(30000));
    }

    #[test]
    fn test_stay_false_vetoes_mid_stay_night() {
        // 2024-05-01 is a Wednesday
        let mut restricted = window(1, 10, dec!(90000));
        restricted.day_conditions = WeeklyConditions::default().with(
            Weekday::Wed,
            DayCondition {
                stay: Some(false),
                ..Default::default()
            },
        );
        let windows = vec![restricted, window(2, 1, dec!(50000))];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let (rates, _) = resolver.resolve_stay(date(2024, 4, 30), date(2024, 5, 3));
        assert_eq!(rates[0].rule, AppliedRule::Window(Uuid::from_u128(1)));
        assert_eq!(rates[1].date, date(2024, 5, 1));
        assert_eq!(rates[1].rule, AppliedRule::Window(Uuid::from_u128(2)));
        assert_eq!(rates[2].rule, AppliedRule::Window(Uuid::from_u128(1)));
    }

    #[test]
    fn test_stay_false_does_not_veto_arrival_night() {
        let mut restricted = window(1, 10, dec!(90000));
        restricted.day_conditions = WeeklyConditions::default().with(
            Weekday::Wed,
            DayCondition {
                stay: Some(false),
                ..Default::default()
            },
        );
        let windows = vec![restricted];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(90000));
    }

    #[test]
    fn test_arrival_false_vetoes_arrival_night_only() {
        let mut restricted = window(1, 10, dec!(90000));
        restricted.day_conditions = WeeklyConditions::default().with(
            Weekday::Wed,
            DayCondition {
                arrival: Some(false),
                ..Default::default()
            },
        );
        let windows = vec![restricted];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(night.daily_rate.rule, AppliedRule::None);
        assert!(night.warning.is_some());
    }

    #[test]
    fn test_falls_back_to_season() {
        let seasons = vec![season(4, date(2024, 1, 1), date(2024, 12, 31), dec!(35000))];
        let resolver = DailyRateResolver::new(&[], &seasons, room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(35000));
        assert_eq!(night.daily_rate.base_rate, dec!(35000));
        assert_eq!(night.daily_rate.rule, AppliedRule::Seasonal(Uuid::from_u128(4)));
        assert!(night.warning.is_none());
    }

    #[test]
    fn test_window_keeps_seasonal_base_as_base_rate() {
        let seasons = vec![season(4, date(2024, 1, 1), date(2024, 12, 31), dec!(35000))];
        let windows = vec![window(1, 1, dec!(50000))];
        let resolver = DailyRateResolver::new(&windows, &seasons, room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.base_rate, dec!(35000));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(50000));
    }

    #[test]
    fn test_overlapping_seasons_latest_start_wins() {
        let seasons = vec![
            season(1, date(2024, 1, 1), date(2024, 12, 31), dec!(30000)),
            season(2, date(2024, 4, 1), date(2024, 6, 30), dec!(42000)),
        ];
        let resolver = DailyRateResolver::new(&[], &seasons, room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(42000));
    }

    #[test]
    fn test_other_room_type_rules_ignored() {
        let mut other = window(1, 100, dec!(99000));
        other.room_type_id = Some(Uuid::from_u128(8));
        let mut universal = window(2, 1, dec!(50000));
        universal.room_type_id = None;
        let windows = vec![other, universal];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.rule, AppliedRule::Window(Uuid::from_u128(2)));
    }

    #[test]
    fn test_inactive_and_expired_windows_ignored() {
        let mut inactive = window(1, 100, dec!(99000));
        inactive.is_active = false;
        let mut expired = window(2, 50, dec!(88000));
        expired.valid_until = date(2024, 4, 30);
        let windows = vec![inactive, expired, window(3, 1, dec!(50000))];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 2);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.rule, AppliedRule::Window(Uuid::from_u128(3)));
    }

    #[test]
    fn test_no_rules_resolves_zero_with_warning() {
        let resolver = DailyRateResolver::new(&[], &[], room(), 2);
        let (rates, warnings) = resolver.resolve_stay(date(2024, 5, 1), date(2024, 5, 3));

        assert_eq!(rates.len(), 2);
        assert!(rates.iter().all(|r| r.adjusted_rate == Decimal::ZERO));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_negative_rate_floored() {
        let mut w = window(1, 1, dec!(50000));
        w.single_rate = Some(dec!(-100));
        let windows = vec![w];
        let resolver = DailyRateResolver::new(&windows, &[], room(), 1);

        let night = resolver.resolve_night(date(2024, 5, 1), date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(night.daily_rate.adjusted_rate, dec!(0));
    }
}
