use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, BillingRecord, BillingStatus, Package, PackageBilling,
    PackageLink, DEFAULT_APPOINTMENT_DURATION_MINUTES,
};
use shared_store::ClinicStore;

use crate::models::{BillingError, PackagePurchase, PurchasePackageRequest};

/// Manages prepaid session packages: one billing transaction buys N linked
/// appointment slots, and removal cascades over everything the purchase
/// created.
pub struct PackageLedgerService {
    store: Arc<ClinicStore>,
}

impl PackageLedgerService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Purchase a package: one Pending billing record (discounted when a
    /// concession applies) plus exactly `total_sessions` unscheduled
    /// appointments tagged 1..N. The patient's aggregate session counters
    /// absorb the new sessions.
    pub async fn purchase(
        &self,
        request: PurchasePackageRequest,
    ) -> Result<PackagePurchase, BillingError> {
        if request.total_sessions == 0 {
            return Err(BillingError::ValidationError(
                "A package must contain at least one session".to_string(),
            ));
        }
        if request.amount < 0.0 {
            return Err(BillingError::ValidationError(
                "Package amount cannot be negative".to_string(),
            ));
        }
        if let Some(discount) = request.discount_percent {
            if !(0.0..=100.0).contains(&discount) {
                return Err(BillingError::ValidationError(
                    "Discount must be between 0 and 100 percent".to_string(),
                ));
            }
        }

        let mut patient = self
            .store
            .get_patient(request.patient_id)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            .ok_or(BillingError::PatientNotFound)?;

        let now = Utc::now();
        let package_id = Uuid::new_v4();
        let billed_amount = match request.discount_percent {
            Some(discount) => request.amount * (1.0 - discount / 100.0),
            None => request.amount,
        };

        let billing_record = BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: None,
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            clinician_name: Some(request.clinician_name.clone()),
            amount: billed_amount,
            status: BillingStatus::Pending,
            payment_mode: None,
            date: now.date_naive(),
            package: Some(PackageBilling {
                package_id,
                sessions: request.total_sessions,
            }),
            is_extra_treatment: false,
            created_at: now,
        };

        let package = Package {
            id: package_id,
            patient_id: patient.id,
            total_sessions: request.total_sessions,
            amount: billed_amount,
            discount_percent: request.discount_percent,
            billing_id: billing_record.id,
            purchased_at: now,
        };

        // Sessions are created unscheduled; the front desk fills in date and
        // time later.
        let mut appointments = Vec::with_capacity(request.total_sessions as usize);
        for session_number in 1..=request.total_sessions {
            appointments.push(Appointment {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                clinician_id: request.clinician_id,
                clinician_name: request.clinician_name.clone(),
                date: None,
                time: None,
                duration_minutes: DEFAULT_APPOINTMENT_DURATION_MINUTES,
                status: AppointmentStatus::Pending,
                notes: None,
                package: Some(PackageLink {
                    package_id,
                    session_number,
                    total_sessions: request.total_sessions,
                }),
                is_extra_treatment: false,
                is_consultation: false,
                created_at: now,
                updated_at: now,
            });
        }

        self.store
            .insert_package(package.clone())
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        self.store
            .insert_billing_record(billing_record.clone())
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        for appointment in &appointments {
            self.store
                .insert_appointment(appointment.clone())
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        }

        patient.total_sessions_required += request.total_sessions;
        patient.remaining_sessions =
            recompute_remaining(&self.store, &patient.id, patient.total_sessions_required).await?;
        patient.package_ids.push(package_id);
        patient.updated_at = now;
        self.store
            .update_patient(patient)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;

        info!(
            "package {} purchased: {} sessions for {:.2}",
            package_id, request.total_sessions, billed_amount
        );

        Ok(PackagePurchase {
            package,
            billing_record,
            appointments,
        })
    }

    /// Remove every package the patient holds, cascading over the linked
    /// appointments and billing records as one all-or-nothing batch. A
    /// partial failure names the documents that could not be deleted so the
    /// caller can retry the remainder. Documents already gone before the
    /// cascade starts are not failures: the batch is gathered from the live
    /// store, so removal converges on whatever linked documents still exist.
    pub async fn remove(&self, patient_id: Uuid) -> Result<(), BillingError> {
        let mut patient = self
            .store
            .get_patient(patient_id)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            .ok_or(BillingError::PatientNotFound)?;

        if patient.package_ids.is_empty() {
            return Err(BillingError::ValidationError(
                "Patient has no packages to remove".to_string(),
            ));
        }

        let mut appointment_ids = Vec::new();
        let mut billing_ids = Vec::new();
        let mut removed_sessions: u32 = 0;

        for package_id in &patient.package_ids {
            for appointment in self
                .store
                .appointments_for_package(*package_id)
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            {
                appointment_ids.push(appointment.id);
            }
            for record in self
                .store
                .billing_records_for_package(*package_id)
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            {
                billing_ids.push(record.id);
            }
            if let Some(package) = self
                .store
                .get_package(*package_id)
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?
            {
                removed_sessions += package.total_sessions;
            }
        }

        self.store
            .delete_package_entities(&appointment_ids, &billing_ids)
            .await
            .map_err(|failure| {
                warn!(
                    "cascade failed for patient {}: {} appointments, {} billing records missing",
                    patient_id,
                    failure.missing_appointments.len(),
                    failure.missing_billing_records.len()
                );
                BillingError::CascadeFailed(format!(
                    "missing appointments {:?}, missing billing records {:?}",
                    failure.missing_appointments, failure.missing_billing_records
                ))
            })?;

        for package_id in patient.package_ids.clone() {
            self.store
                .delete_package(package_id)
                .await
                .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        }

        patient.total_sessions_required =
            patient.total_sessions_required.saturating_sub(removed_sessions);
        patient.remaining_sessions =
            recompute_remaining(&self.store, &patient.id, patient.total_sessions_required).await?;
        patient.package_ids.clear();
        patient.updated_at = Utc::now();
        self.store
            .update_patient(patient)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;

        info!("all packages removed for patient {}", patient_id);
        Ok(())
    }
}

/// Remaining sessions are always recomputed from the appointment snapshot:
/// the prescribed total minus the patient's completed non-package sessions.
pub async fn recompute_remaining(
    store: &ClinicStore,
    patient_id: &Uuid,
    total_sessions_required: u32,
) -> Result<u32, BillingError> {
    let completed = store
        .appointments_for_patient(*patient_id)
        .await
        .map_err(|e| BillingError::DatabaseError(e.to_string()))?
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed && a.package.is_none())
        .count() as u32;
    Ok(total_sessions_required.saturating_sub(completed))
}
