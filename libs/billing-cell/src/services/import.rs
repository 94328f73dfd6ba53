use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use shared_models::{BillingRecord, BillingStatus};
use shared_store::ClinicStore;

use crate::models::{BillingError, ImportReport, ImportRow, RejectedRow};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Bulk ledger import. Rows come from spreadsheets kept outside the system,
/// so patient ids are synthesized and records land already Completed. Rows
/// without a usable date are reported back, never silently dropped.
pub struct BulkImportService {
    store: Arc<ClinicStore>,
}

impl BulkImportService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn import(&self, rows: Vec<ImportRow>) -> Result<ImportReport, BillingError> {
        let mut imported = Vec::new();
        let mut rejected = Vec::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            let Some(date) = parse_row_date(&row.date) else {
                warn!(
                    "import row {} rejected: unusable date {:?}",
                    row_index, row.date
                );
                rejected.push(RejectedRow {
                    row_index,
                    patient_name: row.patient_name,
                    reason: format!("unusable date: {:?}", row.date),
                });
                continue;
            };

            let record = BillingRecord {
                id: Uuid::new_v4(),
                appointment_id: None,
                patient_id: Uuid::new_v4(),
                patient_name: row.patient_name,
                clinician_name: row.doctor,
                amount: row.amount,
                status: BillingStatus::Completed,
                payment_mode: None,
                date,
                package: None,
                is_extra_treatment: false,
                created_at: Utc::now(),
            };
            let stored = self
                .store
                .insert_billing_record(record)
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
            imported.push(stored);
        }

        info!(
            "bulk import finished: {} imported, {} rejected",
            imported.len(),
            rejected.len()
        );
        Ok(ImportReport { imported, rejected })
    }
}

fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, amount: f64, date: &str) -> ImportRow {
        ImportRow {
            patient_name: name.to_string(),
            amount,
            date: date.to_string(),
            doctor: None,
        }
    }

    #[tokio::test]
    async fn valid_rows_become_completed_records() {
        let service = BulkImportService::new(Arc::new(ClinicStore::new()));
        let report = service
            .import(vec![
                row("Asha Naidoo", 1200.0, "2024-05-01"),
                row("Marco Li", 900.0, "15/05/2024"),
            ])
            .await
            .unwrap();

        assert_eq!(report.imported.len(), 2);
        assert!(report.rejected.is_empty());
        for record in &report.imported {
            assert_eq!(record.status, BillingStatus::Completed);
            assert!(record.appointment_id.is_none());
        }
        assert_eq!(
            report.imported[1].date,
            NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
        );
    }

    #[tokio::test]
    async fn rows_without_usable_dates_are_reported_not_imported() {
        let service = BulkImportService::new(Arc::new(ClinicStore::new()));
        let report = service
            .import(vec![
                row("Asha Naidoo", 1200.0, "2024-05-01"),
                row("No Date", 500.0, ""),
                row("Bad Date", 500.0, "sometime in May"),
            ])
            .await
            .unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].row_index, 1);
        assert_eq!(report.rejected[1].row_index, 2);

        let stored = service.store.all_billing_records().await.unwrap();
        assert_eq!(stored.len(), 1);
    }
}
