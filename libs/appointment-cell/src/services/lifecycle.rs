// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use billing_cell::services::{evaluate_billing_rule, SessionAllowanceService};
use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, BillingRecord, BillingStatus, ClinicEvent, EventBus, Patient,
    PatientCategory, PatientStatus, StaffRole,
};
use shared_store::ClinicStore;

use crate::models::AppointmentError;

/// Drives an appointment through its status lifecycle.
///
/// The front desk may request any transition; the engine cares about one
/// edge only: entering `completed` from a non-completed state, which settles
/// the session financially. Side effects are best-effort: a failed
/// allowance or billing write is logged and left for the billing sync pass
/// to heal, and never rolls back the status change itself.
pub struct AppointmentLifecycleService {
    store: Arc<ClinicStore>,
    config: AppConfig,
    events: EventBus,
}

impl AppointmentLifecycleService {
    pub fn new(store: Arc<ClinicStore>, config: &AppConfig, events: EventBus) -> Self {
        Self {
            store,
            config: config.clone(),
            events,
        }
    }

    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        performed_by: Option<StaffRole>,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .store
            .get_appointment(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;

        let old_status = appointment.status;
        if old_status == new_status {
            debug!("appointment {} already {}", appointment_id, new_status);
            return Ok(appointment);
        }

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        let appointment = self
            .store
            .update_appointment(appointment)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match performed_by {
            Some(role) => info!(
                "appointment {} moved {} -> {} by {}",
                appointment_id, old_status, new_status, role
            ),
            None => info!(
                "appointment {} moved {} -> {}",
                appointment_id, old_status, new_status
            ),
        }

        // Completion is the only financially relevant edge; it fires once
        // because re-completing an already completed appointment is a no-op
        // above and the allowance/billing writes are themselves idempotent.
        if new_status == AppointmentStatus::Completed {
            self.apply_completion_effects(&appointment).await;
        }

        self.events.publish(ClinicEvent::StatusChanged {
            patient_id: appointment.patient_id,
            appointment_id: appointment.id,
            old_status,
            new_status,
        });

        Ok(appointment)
    }

    /// Completion side effects, each independently retryable. Order is
    /// fixed: allowance, billing, aggregates, patient closure.
    async fn apply_completion_effects(&self, appointment: &Appointment) {
        let patient = match self.store.get_patient(appointment.patient_id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                error!(
                    "completion of {}: patient {} missing, billing left to sync pass",
                    appointment.id, appointment.patient_id
                );
                return;
            }
            Err(e) => {
                error!("completion of {}: patient read failed: {}", appointment.id, e);
                return;
            }
        };

        if patient.category == PatientCategory::SubsidizedCare {
            let allowance_service =
                SessionAllowanceService::new(self.store.clone(), &self.config);
            match allowance_service
                .record_usage(patient.id, appointment.id)
                .await
            {
                Ok(result) => {
                    let was_free = result.was_free;
                    self.events.publish(ClinicEvent::SessionBalanceChanged {
                        patient_id: patient.id,
                        appointment_id: appointment.id,
                        allowance: result.allowance,
                    });
                    if let Err(e) = self
                        .create_subsidized_billing(appointment, &patient, was_free)
                        .await
                    {
                        error!(
                            "completion of {}: billing creation failed: {}",
                            appointment.id, e
                        );
                    }
                }
                Err(e) => error!(
                    "completion of {}: allowance update failed: {}",
                    appointment.id, e
                ),
            }
        } else if let Err(e) = self.create_billing_if_absent(appointment, &patient).await {
            error!(
                "completion of {}: billing creation failed: {}",
                appointment.id, e
            );
        }

        if let Err(e) = self.refresh_patient_aggregates(appointment).await {
            error!(
                "completion of {}: patient aggregate update failed: {}",
                appointment.id, e
            );
        }
    }

    /// Subsidized sessions bill through the allowance tracker rather than
    /// the rule table: zero while the free quota lasts, the flat fee after,
    /// always auto-settled.
    async fn create_subsidized_billing(
        &self,
        appointment: &Appointment,
        patient: &Patient,
        was_free: bool,
    ) -> Result<(), AppointmentError> {
        if appointment.package.is_some() {
            return Ok(());
        }
        let existing = self
            .store
            .billing_record_for_appointment(appointment.id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let amount = if was_free {
            0.0
        } else {
            self.config.subsidized_flat_fee
        };
        let record = BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: Some(appointment.id),
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            clinician_name: Some(appointment.clinician_name.clone()),
            amount,
            status: BillingStatus::AutoPaid,
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
        Ok(())
    }

    /// One billing record per completed appointment, created via the
    /// category rule table. Package sessions are already paid for by the
    /// package's own billing transaction and are skipped here.
    async fn create_billing_if_absent(
        &self,
        appointment: &Appointment,
        patient: &Patient,
    ) -> Result<(), AppointmentError> {
        if appointment.package.is_some() {
            debug!(
                "appointment {} is a package session, no per-session bill",
                appointment.id
            );
            return Ok(());
        }

        let existing = self
            .store
            .billing_record_for_appointment(appointment.id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if existing.is_some() {
            debug!("appointment {} already billed", appointment.id);
            return Ok(());
        }

        let outcome = evaluate_billing_rule(patient, &self.config);
        let record = BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: Some(appointment.id),
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            clinician_name: Some(appointment.clinician_name.clone()),
            amount: outcome.amount,
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
        Ok(())
    }

    /// Recompute the remaining-session counter from the freshest snapshot
    /// and close the patient record once no appointment is left open.
    async fn refresh_patient_aggregates(
        &self,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        let mut patient = self
            .store
            .get_patient(appointment.patient_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::PatientNotFound)?;

        let appointments = self
            .store
            .appointments_for_patient(patient.id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        // The session just completed counts via the explicit "- 1"; the
        // snapshot count covers the patient's other completed sessions.
        let completed_others = appointments
            .iter()
            .filter(|a| {
                a.id != appointment.id
                    && a.status == AppointmentStatus::Completed
                    && a.package.is_none()
            })
            .count() as u32;
        patient.remaining_sessions = patient
            .total_sessions_required
            .saturating_sub(1)
            .saturating_sub(completed_others);

        if appointments.iter().all(|a| a.is_terminal()) {
            patient.status = PatientStatus::Completed;
        }
        patient.updated_at = Utc::now();

        self.store
            .update_patient(patient)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
