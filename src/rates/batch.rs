//! Batch re-pricing across many room types and date ranges.
//!
//! Jobs are independent: each one runs on its own task, bounded by a
//! semaphore sized to the rule store's connection capacity. Cancelling the
//! token aborts outstanding tasks and the batch returns what finished.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::RateError;
use super::models::{GuestType, RateCalculationResult, StayRequest};
use super::services::{RateCalculationService, YieldMode};

/// One (room type, date range) tuple to price
#[derive(Debug, Clone, PartialEq)]
pub struct RepriceJob {
    pub organization_id: Uuid,
    pub room_type_id: Uuid,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub adults: u32,
}

impl RepriceJob {
    fn to_stay(&self) -> StayRequest {
        StayRequest {
            organization_id: self.organization_id,
            room_type_id: self.room_type_id,
            arrival_date: self.arrival_date,
            departure_date: self.departure_date,
            adults: self.adults,
            children: 0,
            guest_type: GuestType::Individual,
            promo_code: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepriceOutcome {
    pub job: RepriceJob,
    pub result: Result<RateCalculationResult, RateError>,
}

/// Summary of a batch run. Outcomes are in completion order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<RepriceOutcome>,
    /// Jobs that never finished because the batch was cancelled
    pub cancelled: usize,
    /// Jobs whose task panicked before producing an outcome
    pub panicked: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub const DEFAULT_MAX_BATCH_JOBS: usize = 1_000;

#[derive(Clone)]
pub struct BatchRepricer {
    service: RateCalculationService,
    concurrency: usize,
    max_jobs: usize,
}

impl BatchRepricer {
    pub fn new(service: RateCalculationService, concurrency: usize) -> Self {
        Self {
            service,
            concurrency: concurrency.max(1),
            max_jobs: DEFAULT_MAX_BATCH_JOBS,
        }
    }

    /// Largest batch accepted by `run`
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    /// Price every job. Oversized batches are rejected before any task starts.
    pub async fn run(
        &self,
        jobs: Vec<RepriceJob>,
        yield_mode: YieldMode,
        cancel: CancellationToken,
    ) -> Result<BatchReport, RateError> {
        let total = jobs.len();
        if total > self.max_jobs {
            return Err(RateError::validation(
                "stays",
                format!("batch of {} stays exceeds the maximum of {}", total, self.max_jobs),
            ));
        }
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        info!(jobs = total, concurrency = self.concurrency, "Batch re-pricing started");

        for job in jobs {
            let service = self.service.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(RateError::Cancelled),
                    result = async {
                        match semaphore.acquire_owned().await {
                            Ok(_permit) => service.quote(&job.to_stay(), yield_mode).await,
                            Err(_) => Err(RateError::Cancelled),
                        }
                    } => result,
                };
                RepriceOutcome { job, result }
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut panicked = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tasks.shutdown().await;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => outcomes.push(outcome),
                    Some(Err(e)) if e.is_panic() => {
                        error!("Re-pricing task panicked: {}", e);
                        panicked += 1;
                    }
                    Some(Err(e)) => warn!("Re-pricing task failed to complete: {}", e),
                    None => break,
                },
            }
        }

        let completed: Vec<RepriceOutcome> = outcomes
            .into_iter()
            .filter(|o| !matches!(o.result, Err(RateError::Cancelled)))
            .collect();
        let report = BatchReport {
            cancelled: total - completed.len() - panicked,
            panicked,
            outcomes: completed,
        };

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled,
            panicked = report.panicked,
            "Batch re-pricing finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::models::{RateWindow, SeasonalRate, WeeklyConditions};
    use crate::rates::occupancy::FixedOccupancy;
    use crate::rates::services::ServiceSettings;
    use crate::rates::store::{InMemoryRuleStore, RuleStore, StoreError};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const ORG: Uuid = Uuid::from_u128(1);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn job(room: u128, arrival: NaiveDate, departure: NaiveDate) -> RepriceJob {
        RepriceJob {
            organization_id: ORG,
            room_type_id: Uuid::from_u128(room),
            arrival_date: arrival,
            departure_date: departure,
            adults: 2,
        }
    }

    fn store() -> InMemoryRuleStore {
        InMemoryRuleStore::new(
            vec![RateWindow {
                id: Uuid::from_u128(50),
                organization_id: ORG,
                room_type_id: None,
                name: None,
                valid_from: date(2024, 1, 1),
                valid_until: date(2024, 12, 31),
                day_conditions: WeeklyConditions::default(),
                base_rate: dec!(50000),
                single_rate: None,
                extra_person_rate: None,
                priority: 1,
                is_active: true,
            }],
            vec![],
        )
    }

    fn repricer(store: Arc<dyn RuleStore>, concurrency: usize) -> BatchRepricer {
        let service = RateCalculationService::new(
            store,
            Arc::new(FixedOccupancy(0.6)),
            ServiceSettings::default(),
        );
        BatchRepricer::new(service, concurrency)
    }

    #[tokio::test]
    async fn test_batch_prices_every_job() {
        let jobs: Vec<RepriceJob> = (0..10)
            .map(|i| job(i, date(2024, 3, 1), date(2024, 3, 3 + i as u32)))
            .collect();

        let report = repricer(Arc::new(store()), 3)
            .run(jobs, YieldMode::None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 10);
        assert_eq!(report.succeeded(), 10);
        assert_eq!(report.cancelled, 0);
        for outcome in &report.outcomes {
            let result = outcome.result.as_ref().unwrap();
            let nights = (outcome.job.departure_date - outcome.job.arrival_date).num_days();
            assert_eq!(result.daily_rates.len() as i64, nights);
            assert!(result.daily_rates.windows(2).all(|w| w[0].date < w[1].date));
        }
    }

    #[tokio::test]
    async fn test_batch_reports_failures_per_job() {
        let jobs = vec![
            job(1, date(2024, 3, 1), date(2024, 3, 3)),
            job(2, date(2024, 3, 3), date(2024, 3, 1)),
        ];

        let report = repricer(Arc::new(store()), 2)
            .run(jobs, YieldMode::None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }

    struct StallingStore;

    #[async_trait]
    impl RuleStore for StallingStore {
        async fn windows(
            &self,
            _organization_id: Uuid,
            _room_type_id: Option<Uuid>,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<RateWindow>, StoreError> {
            std::future::pending::<()>().await;
            Ok(vec![])
        }

        async fn seasonal_rates(
            &self,
            _organization_id: Uuid,
            _room_type_id: Uuid,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<SeasonalRate>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_batch() {
        let jobs: Vec<RepriceJob> = (0..5)
            .map(|i| job(i, date(2024, 3, 1), date(2024, 3, 2)))
            .collect();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            repricer(Arc::new(StallingStore), 2).run(jobs, YieldMode::None, cancel),
        )
        .await
        .expect("batch should stop once cancelled")
        .unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(report.cancelled, 5);
        assert_eq!(report.panicked, 0);
    }

    const BROKEN_ROOM: u128 = 99;

    /// Panics on reads for one room type, otherwise delegates
    struct PanickingStore(InMemoryRuleStore);

    #[async_trait]
    impl RuleStore for PanickingStore {
        async fn windows(
            &self,
            organization_id: Uuid,
            room_type_id: Option<Uuid>,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<RateWindow>, StoreError> {
            if room_type_id == Some(Uuid::from_u128(BROKEN_ROOM)) {
                panic!("corrupt rule row");
            }
            self.0.windows(organization_id, room_type_id, from, to).await
        }

        async fn seasonal_rates(
            &self,
            organization_id: Uuid,
            room_type_id: Uuid,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<SeasonalRate>, StoreError> {
            self.0.seasonal_rates(organization_id, room_type_id, from, to).await
        }
    }

    #[tokio::test]
    async fn test_panicked_job_not_reported_as_cancelled() {
        let jobs = vec![
            job(1, date(2024, 3, 1), date(2024, 3, 3)),
            job(BROKEN_ROOM, date(2024, 3, 1), date(2024, 3, 3)),
            job(2, date(2024, 3, 1), date(2024, 3, 2)),
        ];

        let report = repricer(Arc::new(PanickingStore(store())), 2)
            .run(jobs, YieldMode::None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.panicked, 1);
        assert_eq!(report.cancelled, 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let jobs: Vec<RepriceJob> = (0..4)
            .map(|i| job(i, date(2024, 3, 1), date(2024, 3, 2)))
            .collect();

        let err = repricer(Arc::new(store()), 2)
            .with_max_jobs(3)
            .run(jobs, YieldMode::None, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RateError::Validation { field: "stays", .. }));
    }
}
