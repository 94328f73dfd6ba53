use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::SessionAllowance;
use shared_store::ClinicStore;

use crate::models::{BillingError, UsageResult};

/// Tracks free/used/pending-paid sessions for subsidized-care patients.
///
/// Consumption only ever counts up; the explicit reset in the patient
/// directory is the single way down. Each appointment is recorded at most
/// once, guarded by the allowance's processed map, so redundant invocations
/// of the completion flow cannot double-count; the map also keeps the
/// appointment's free/paid attribution, so a replay reports the same
/// `was_free` as the original call.
pub struct SessionAllowanceService {
    store: Arc<ClinicStore>,
    free_quota: u32,
    flat_fee: f64,
}

impl SessionAllowanceService {
    pub fn new(store: Arc<ClinicStore>, config: &AppConfig) -> Self {
        Self {
            store,
            free_quota: config.free_session_quota,
            flat_fee: config.subsidized_flat_fee,
        }
    }

    /// Consume one session for a completed appointment. Below the free quota
    /// the free counter moves; past it the pending-paid counter and charge
    /// move instead. Exactly one of the two happens per new appointment.
    pub async fn record_usage(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<UsageResult, BillingError> {
        let mut patient = self
            .store
            .get_patient(patient_id)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            .ok_or(BillingError::PatientNotFound)?;

        let allowance = patient
            .session_allowance
            .as_mut()
            .ok_or(BillingError::NoAllowance)?;

        if let Some(was_free) = allowance.already_processed(&appointment_id) {
            debug!(
                "appointment {} already counted against allowance of {}",
                appointment_id, patient_id
            );
            return Ok(self.result_for(allowance.clone(), was_free));
        }

        let was_free = allowance.free_sessions_used < self.free_quota;
        if was_free {
            allowance.free_sessions_used += 1;
        } else {
            allowance.pending_paid_sessions += 1;
            allowance.pending_charge_amount += self.flat_fee;
        }
        allowance.processed_appointments.insert(appointment_id, was_free);

        let snapshot = allowance.clone();
        patient.updated_at = Utc::now();
        self.store
            .update_patient(patient)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;

        info!(
            "allowance usage recorded for patient {}: free={} pending_paid={}",
            patient_id, snapshot.free_sessions_used, snapshot.pending_paid_sessions
        );
        Ok(self.result_for(snapshot, was_free))
    }

    fn result_for(&self, allowance: SessionAllowance, was_free: bool) -> UsageResult {
        UsageResult {
            was_free,
            remaining_free_sessions: self.free_quota.saturating_sub(allowance.free_sessions_used),
            allowance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::{Patient, PatientCategory};

    async fn setup() -> (SessionAllowanceService, Uuid) {
        let store = Arc::new(ClinicStore::new());
        let patient = Patient::new("Asha Naidoo".to_string(), PatientCategory::SubsidizedCare);
        let id = patient.id;
        store.insert_patient(patient).await.unwrap();
        (
            SessionAllowanceService::new(store, &AppConfig::default()),
            id,
        )
    }

    #[tokio::test]
    async fn quota_exhaustion_flips_to_pending_paid() {
        let (service, patient_id) = setup().await;

        // Default quota is 4 free sessions.
        for n in 1..=4 {
            let result = service
                .record_usage(patient_id, Uuid::new_v4())
                .await
                .unwrap();
            assert!(result.was_free, "session {} should be free", n);
            assert_eq!(result.allowance.free_sessions_used, n);
            assert_eq!(result.allowance.pending_paid_sessions, 0);
        }

        let fifth = service
            .record_usage(patient_id, Uuid::new_v4())
            .await
            .unwrap();
        assert!(!fifth.was_free);
        assert_eq!(fifth.allowance.free_sessions_used, 4);
        assert_eq!(fifth.allowance.pending_paid_sessions, 1);
        assert_eq!(fifth.allowance.pending_charge_amount, 200.0);
    }

    #[tokio::test]
    async fn repeated_calls_for_one_appointment_do_not_double_count() {
        let (service, patient_id) = setup().await;
        let appointment_id = Uuid::new_v4();

        let first = service
            .record_usage(patient_id, appointment_id)
            .await
            .unwrap();
        assert!(first.was_free);
        assert_eq!(first.allowance.free_sessions_used, 1);

        // Replays keep the original free attribution and move no counters.
        let second = service
            .record_usage(patient_id, appointment_id)
            .await
            .unwrap();
        assert!(second.was_free);
        assert_eq!(second.allowance.free_sessions_used, 1);
        assert_eq!(second.allowance.pending_paid_sessions, 0);
    }

    #[tokio::test]
    async fn replay_of_a_paid_session_stays_paid() {
        let (service, patient_id) = setup().await;

        for _ in 0..4 {
            service
                .record_usage(patient_id, Uuid::new_v4())
                .await
                .unwrap();
        }
        let appointment_id = Uuid::new_v4();
        let fifth = service
            .record_usage(patient_id, appointment_id)
            .await
            .unwrap();
        assert!(!fifth.was_free);

        let replay = service
            .record_usage(patient_id, appointment_id)
            .await
            .unwrap();
        assert!(!replay.was_free);
        assert_eq!(replay.allowance.pending_paid_sessions, 1);
        assert_eq!(replay.allowance.pending_charge_amount, 200.0);
    }

    #[tokio::test]
    async fn exactly_one_counter_moves_per_call() {
        let (service, patient_id) = setup().await;

        for _ in 0..7 {
            let before = service
                .store
                .get_patient(patient_id)
                .await
                .unwrap()
                .unwrap()
                .session_allowance
                .unwrap();
            let after = service
                .record_usage(patient_id, Uuid::new_v4())
                .await
                .unwrap()
                .allowance;

            let free_delta = after.free_sessions_used - before.free_sessions_used;
            let paid_delta = after.pending_paid_sessions - before.pending_paid_sessions;
            assert_eq!(free_delta + paid_delta, 1);
        }
    }

    #[tokio::test]
    async fn patient_without_allowance_is_rejected() {
        let store = Arc::new(ClinicStore::new());
        let patient = Patient::new("Marco Li".to_string(), PatientCategory::Vip);
        let id = patient.id;
        store.insert_patient(patient).await.unwrap();
        let service = SessionAllowanceService::new(store, &AppConfig::default());

        let result = service.record_usage(id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(BillingError::NoAllowance)));
    }
}
