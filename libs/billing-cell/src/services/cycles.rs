use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, info};

use shared_models::{BillingCycle, BillingRecord, CycleStatus};
use shared_store::ClinicStore;

use crate::models::{BillingError, CycleSummary};

/// Month-bounded accounting windows over the billing records.
pub struct BillingCycleService {
    store: Arc<ClinicStore>,
}

impl BillingCycleService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// The calendar-month window containing `today`.
    pub fn current_cycle(&self, today: NaiveDate) -> BillingCycle {
        cycle_for(today.month(), today.year())
    }

    /// Totals for records whose date falls within the cycle, bounds
    /// inclusive. Collections sum only settled amounts.
    pub fn summarize(&self, cycle: &BillingCycle, records: &[BillingRecord]) -> CycleSummary {
        let in_window: Vec<&BillingRecord> =
            records.iter().filter(|r| cycle.contains(r.date)).collect();

        CycleSummary {
            pending_count: in_window
                .iter()
                .filter(|r| !r.status.is_settled())
                .count(),
            completed_count: in_window.iter().filter(|r| r.status.is_settled()).count(),
            collections: in_window
                .iter()
                .filter(|r| r.status.is_settled())
                .map(|r| r.amount)
                .sum(),
        }
    }

    /// Make sure a cycle is active, creating this month's lazily when the
    /// ledger has none yet.
    pub async fn ensure_active(&self, today: NaiveDate) -> Result<BillingCycle, BillingError> {
        if let Some(active) = self
            .store
            .active_cycle()
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
        {
            return Ok(active);
        }

        let mut cycle = self.current_cycle(today);
        cycle.status = CycleStatus::Active;
        debug!("activating cycle {}-{:02}", cycle.year, cycle.month);
        self.store
            .upsert_cycle(cycle)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))
    }

    /// Close the active cycle and activate the following month's, creating
    /// it if absent. Closing an already-closed ledger is a no-op for the
    /// closing half; the next month still becomes active, and a `(month,
    /// year)` pair is never duplicated.
    pub async fn rollover(&self, today: NaiveDate) -> Result<BillingCycle, BillingError> {
        let closed = match self
            .store
            .active_cycle()
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
        {
            Some(mut active) => {
                active.status = CycleStatus::Closed;
                self.store
                    .upsert_cycle(active.clone())
                    .await
                    .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
                info!("closed billing cycle {}-{:02}", active.year, active.month);
                active
            }
            // Nothing active: treat the current month as the cycle being
            // rolled past.
            None => self.current_cycle(today),
        };

        let (next_month, next_year) = if closed.month == 12 {
            (1, closed.year + 1)
        } else {
            (closed.month + 1, closed.year)
        };

        let mut next = match self
            .store
            .get_cycle(next_month, next_year)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
        {
            Some(existing) => existing,
            None => cycle_for(next_month, next_year),
        };
        next.status = CycleStatus::Active;

        info!("activated billing cycle {}-{:02}", next.year, next.month);
        self.store
            .upsert_cycle(next)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))
    }
}

fn cycle_for(month: u32, year: i32) -> BillingCycle {
    let start_date = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("month in 1..=12 always yields a first day");
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("month arithmetic stays in range");
    BillingCycle {
        month,
        year,
        start_date,
        end_date: next_month_start - Duration::days(1),
        status: CycleStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_models::{BillingStatus, CycleStatus};
    use uuid::Uuid;

    fn record(date: NaiveDate, amount: f64, status: BillingStatus) -> BillingRecord {
        BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: None,
            patient_id: Uuid::new_v4(),
            patient_name: "Test Patient".to_string(),
            clinician_name: None,
            amount,
            status,
            payment_mode: None,
            date,
            package: None,
            is_extra_treatment: false,
            created_at: Utc::now(),
        }
    }

    fn service() -> BillingCycleService {
        BillingCycleService::new(Arc::new(ClinicStore::new()))
    }

    #[test]
    fn cycle_bounds_are_calendar_month() {
        let cycle = service().current_cycle(NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(cycle.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(cycle.end_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!((cycle.month, cycle.year), (2, 2024));
    }

    #[test]
    fn december_cycle_ends_on_new_years_eve() {
        let cycle = service().current_cycle(NaiveDate::from_ymd_opt(2024, 12, 3).unwrap());
        assert_eq!(cycle.end_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn adjacent_cycles_partition_records_exactly() {
        let service = service();
        let may = service.current_cycle(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        let june = service.current_cycle(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());

        let records = vec![
            record(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                100.0,
                BillingStatus::Completed,
            ),
            record(
                NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                250.0,
                BillingStatus::AutoPaid,
            ),
            record(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                400.0,
                BillingStatus::Completed,
            ),
            record(
                NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                75.0,
                BillingStatus::Pending,
            ),
        ];

        let may_summary = service.summarize(&may, &records);
        let june_summary = service.summarize(&june, &records);

        assert_eq!(may_summary.collections, 350.0);
        assert_eq!(may_summary.completed_count, 2);
        assert_eq!(may_summary.pending_count, 0);

        assert_eq!(june_summary.collections, 400.0);
        assert_eq!(june_summary.completed_count, 1);
        assert_eq!(june_summary.pending_count, 1);

        // No record is double-counted or dropped across the boundary.
        let total_counted = may_summary.completed_count
            + may_summary.pending_count
            + june_summary.completed_count
            + june_summary.pending_count;
        assert_eq!(total_counted, records.len());
    }

    #[tokio::test]
    async fn rollover_closes_active_and_activates_next_month() {
        let service = service();
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        let active = service.ensure_active(today).await.unwrap();
        assert_eq!((active.month, active.year), (5, 2024));
        assert_eq!(active.status, CycleStatus::Active);

        let next = service.rollover(today).await.unwrap();
        assert_eq!((next.month, next.year), (6, 2024));
        assert_eq!(next.status, CycleStatus::Active);

        let closed = service.store.get_cycle(5, 2024).await.unwrap().unwrap();
        assert_eq!(closed.status, CycleStatus::Closed);

        // Exactly one cycle is active.
        let cycles = service.store.all_cycles().await.unwrap();
        let active_count = cycles
            .iter()
            .filter(|c| c.status == CycleStatus::Active)
            .count();
        assert_eq!(active_count, 1);
    }

    #[tokio::test]
    async fn rollover_across_year_boundary() {
        let service = service();
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

        service.ensure_active(today).await.unwrap();
        let next = service.rollover(today).await.unwrap();
        assert_eq!((next.month, next.year), (1, 2025));
    }

    #[tokio::test]
    async fn repeated_rollover_never_duplicates_cycles() {
        let service = service();
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        service.ensure_active(today).await.unwrap();
        service.rollover(today).await.unwrap();
        service.rollover(today).await.unwrap();

        let cycles = service.store.all_cycles().await.unwrap();
        let mut keys: Vec<(u32, i32)> = cycles.iter().map(|c| (c.month, c.year)).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), cycles.len());

        let active_count = cycles
            .iter()
            .filter(|c| c.status == CycleStatus::Active)
            .count();
        assert_eq!(active_count, 1);
    }
}
