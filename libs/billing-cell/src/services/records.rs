use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_store::ClinicStore;

use crate::models::BillingError;

/// Explicit deletion of individual billing records.
///
/// Two classes of record are off limits here: package billing, which only
/// leaves the ledger through the package removal cascade, and settled
/// (Completed / Auto-Paid) records, which stay immutable outside an explicit
/// correction.
pub struct BillingRecordService {
    store: Arc<ClinicStore>,
}

impl BillingRecordService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn delete(&self, record_id: Uuid) -> Result<(), BillingError> {
        let record = self
            .store
            .get_billing_record(record_id)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            .ok_or(BillingError::RecordNotFound)?;

        if record.package.is_some() {
            return Err(BillingError::ValidationError(
                "Package billing is removed through package removal".to_string(),
            ));
        }
        if record.status.is_settled() {
            return Err(BillingError::ValidationError(
                "Settled billing records can only change through a correction".to_string(),
            ));
        }

        self.store
            .delete_billing_record(record_id)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        info!("billing record {} deleted", record_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use shared_models::{BillingRecord, BillingStatus, PackageBilling};

    fn pending_record() -> BillingRecord {
        BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: Some(Uuid::new_v4()),
            patient_id: Uuid::new_v4(),
            patient_name: "Sofia Almeida".to_string(),
            clinician_name: None,
            amount: 1200.0,
            status: BillingStatus::Pending,
            payment_mode: None,
            date: Utc::now().date_naive(),
            package: None,
            is_extra_treatment: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pending_record_can_be_deleted() {
        let store = Arc::new(ClinicStore::new());
        let record = store
            .insert_billing_record(pending_record())
            .await
            .unwrap();

        let service = BillingRecordService::new(store.clone());
        service.delete(record.id).await.unwrap();
        assert!(store.get_billing_record(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_record_is_reported() {
        let store = Arc::new(ClinicStore::new());
        let service = BillingRecordService::new(store);
        let result = service.delete(Uuid::new_v4()).await;
        assert_matches!(result, Err(BillingError::RecordNotFound));
    }

    #[tokio::test]
    async fn settled_record_refuses_deletion() {
        let store = Arc::new(ClinicStore::new());
        let mut record = pending_record();
        record.status = BillingStatus::AutoPaid;
        let record = store.insert_billing_record(record).await.unwrap();

        let service = BillingRecordService::new(store.clone());
        let result = service.delete(record.id).await;
        assert_matches!(result, Err(BillingError::ValidationError(_)));
        assert!(store.get_billing_record(record.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn package_billing_only_leaves_via_cascade() {
        let store = Arc::new(ClinicStore::new());
        let mut record = pending_record();
        record.appointment_id = None;
        record.package = Some(PackageBilling {
            package_id: Uuid::new_v4(),
            sessions: 6,
        });
        let record = store.insert_billing_record(record).await.unwrap();

        let service = BillingRecordService::new(store.clone());
        let result = service.delete(record.id).await;
        assert_matches!(result, Err(BillingError::ValidationError(_)));
        assert!(store.get_billing_record(record.id).await.unwrap().is_some());
    }
}
