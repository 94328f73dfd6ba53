// libs/appointment-cell/src/services/sync.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use billing_cell::services::evaluate_billing_rule;
use shared_config::AppConfig;
use shared_models::{AppointmentStatus, BillingRecord};
use shared_store::ClinicStore;

use crate::models::{AppointmentError, BillingSyncReport};

/// Reconciliation sweep for completed appointments that never got billed,
/// typically because a completion-time side effect failed. Safe to run
/// repeatedly: already-billed and package-linked sessions are skipped.
/// Subsidized sessions backfill at zero when the allowance shows the
/// appointment consumed a free session, otherwise at the flat rate.
pub struct BillingSyncService {
    store: Arc<ClinicStore>,
    config: AppConfig,
}

impl BillingSyncService {
    pub fn new(store: Arc<ClinicStore>, config: &AppConfig) -> Self {
        Self {
            store,
            config: config.clone(),
        }
    }

    pub async fn sync(&self) -> Result<BillingSyncReport, AppointmentError> {
        let appointments = self
            .store
            .all_appointments()
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut report = BillingSyncReport::default();
        for appointment in appointments {
            if appointment.status != AppointmentStatus::Completed {
                continue;
            }
            if appointment.package.is_some() {
                report.skipped += 1;
                continue;
            }

            let existing = self
                .store
                .billing_record_for_appointment(appointment.id)
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
            if existing.is_some() {
                report.already_billed += 1;
                continue;
            }

            let patient = match self.store.get_patient(appointment.patient_id).await {
                Ok(Some(patient)) => patient,
                Ok(None) => {
                    warn!(
                        "sync: appointment {} references missing patient {}",
                        appointment.id, appointment.patient_id
                    );
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(AppointmentError::DatabaseError(e.to_string())),
            };

            let outcome = evaluate_billing_rule(&patient, &self.config);
            // Allowance attribution wins over the rule table: a session the
            // patient already consumed as free backfills at zero.
            let consumed_free = patient
                .session_allowance
                .as_ref()
                .and_then(|allowance| allowance.already_processed(&appointment.id))
                .unwrap_or(false);
            let record = BillingRecord {
                id: Uuid::new_v4(),
                appointment_id: Some(appointment.id),
                patient_id: patient.id,
                patient_name: patient.full_name.clone(),
                clinician_name: Some(appointment.clinician_name.clone()),
                amount: if consumed_free { 0.0 } else { outcome.amount },
                status: outcome.status,
                payment_mode: None,
                date: appointment.date.unwrap_or_else(|| Utc::now().date_naive()),
                package: None,
                is_extra_treatment: appointment.is_extra_treatment,
                created_at: Utc::now(),
            };
            self.store
                .insert_billing_record(record)
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
            report.records_created += 1;
        }

        info!(
            "billing sync: {} created, {} already billed, {} skipped",
            report.records_created, report.already_billed, report.skipped
        );
        Ok(report)
    }
}
