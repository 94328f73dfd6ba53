use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{
    Appointment, AvailabilitySchedule, BillingCycle, BillingRecord, Package, Patient,
};

/// Document-store handle shared by every service.
///
/// Reads hand out cloned snapshots; derived aggregates (slot occupancy, cycle
/// summaries, remaining-session counts) are always recomputed from the latest
/// snapshot rather than maintained incrementally. Writes are single-document
/// operations with no cross-request locking, so concurrent bookings for the
/// same slot remain possible by design of the scheduling flow.
#[derive(Debug, Default)]
pub struct ClinicStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
    billing_records: RwLock<HashMap<Uuid, BillingRecord>>,
    packages: RwLock<HashMap<Uuid, Package>>,
    cycles: RwLock<HashMap<(u32, i32), BillingCycle>>,
    schedules: RwLock<HashMap<Uuid, AvailabilitySchedule>>,
}

/// A cascading delete that only partially succeeded. Lists the documents that
/// could not be removed so the caller can retry the remainder.
#[derive(Debug, Clone)]
pub struct CascadeFailure {
    pub missing_appointments: Vec<Uuid>,
    pub missing_billing_records: Vec<Uuid>,
}

impl CascadeFailure {
    pub fn is_empty(&self) -> bool {
        self.missing_appointments.is_empty() && self.missing_billing_records.is_empty()
    }
}

impl ClinicStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // APPOINTMENTS
    // ==========================================================================

    pub async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        debug!("storing appointment {}", appointment.id);
        let mut guard = self.appointments.write().await;
        guard.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    pub async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        let mut guard = self.appointments.write().await;
        if !guard.contains_key(&appointment.id) {
            return Err(anyhow!("appointment {} not found", appointment.id));
        }
        guard.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> Result<()> {
        let mut guard = self.appointments.write().await;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("appointment {} not found", id))
    }

    pub async fn all_appointments(&self) -> Result<Vec<Appointment>> {
        Ok(self.appointments.read().await.values().cloned().collect())
    }

    pub async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect())
    }

    /// Scheduled appointments for one clinician on one calendar date,
    /// ordered by start time.
    pub async fn appointments_for_clinician_on(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.clinician_id == clinician_id && a.date == Some(date))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.time);
        Ok(appointments)
    }

    pub async fn appointments_for_package(&self, package_id: Uuid) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| {
                a.package
                    .as_ref()
                    .is_some_and(|link| link.package_id == package_id)
            })
            .cloned()
            .collect())
    }

    // ==========================================================================
    // PATIENTS
    // ==========================================================================

    pub async fn insert_patient(&self, patient: Patient) -> Result<Patient> {
        debug!("storing patient {}", patient.id);
        let mut guard = self.patients.write().await;
        guard.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    pub async fn update_patient(&self, patient: Patient) -> Result<Patient> {
        let mut guard = self.patients.write().await;
        if !guard.contains_key(&patient.id) {
            return Err(anyhow!("patient {} not found", patient.id));
        }
        guard.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub async fn all_patients(&self) -> Result<Vec<Patient>> {
        Ok(self.patients.read().await.values().cloned().collect())
    }

    // ==========================================================================
    // BILLING RECORDS
    // ==========================================================================

    pub async fn insert_billing_record(&self, record: BillingRecord) -> Result<BillingRecord> {
        debug!("storing billing record {}", record.id);
        let mut guard = self.billing_records.write().await;
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    pub async fn get_billing_record(&self, id: Uuid) -> Result<Option<BillingRecord>> {
        Ok(self.billing_records.read().await.get(&id).cloned())
    }

    pub async fn delete_billing_record(&self, id: Uuid) -> Result<()> {
        let mut guard = self.billing_records.write().await;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("billing record {} not found", id))
    }

    pub async fn all_billing_records(&self) -> Result<Vec<BillingRecord>> {
        Ok(self.billing_records.read().await.values().cloned().collect())
    }

    pub async fn billing_record_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<BillingRecord>> {
        Ok(self
            .billing_records
            .read()
            .await
            .values()
            .find(|r| r.appointment_id == Some(appointment_id))
            .cloned())
    }

    pub async fn billing_records_for_package(
        &self,
        package_id: Uuid,
    ) -> Result<Vec<BillingRecord>> {
        Ok(self
            .billing_records
            .read()
            .await
            .values()
            .filter(|r| {
                r.package
                    .as_ref()
                    .is_some_and(|link| link.package_id == package_id)
            })
            .cloned()
            .collect())
    }

    // ==========================================================================
    // PACKAGES
    // ==========================================================================

    pub async fn insert_package(&self, package: Package) -> Result<Package> {
        let mut guard = self.packages.write().await;
        guard.insert(package.id, package.clone());
        Ok(package)
    }

    pub async fn get_package(&self, id: Uuid) -> Result<Option<Package>> {
        Ok(self.packages.read().await.get(&id).cloned())
    }

    pub async fn delete_package(&self, id: Uuid) -> Result<()> {
        let mut guard = self.packages.write().await;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("package {} not found", id))
    }

    /// Remove every appointment and billing record belonging to a set of
    /// packages in one batch. Verifies the whole batch under the write locks
    /// before deleting anything; on failure nothing is removed and the
    /// missing documents are reported.
    pub async fn delete_package_entities(
        &self,
        appointment_ids: &[Uuid],
        billing_ids: &[Uuid],
    ) -> std::result::Result<(), CascadeFailure> {
        let mut appointments = self.appointments.write().await;
        let mut billing = self.billing_records.write().await;

        let failure = CascadeFailure {
            missing_appointments: appointment_ids
                .iter()
                .filter(|id| !appointments.contains_key(id))
                .copied()
                .collect(),
            missing_billing_records: billing_ids
                .iter()
                .filter(|id| !billing.contains_key(id))
                .copied()
                .collect(),
        };
        if !failure.is_empty() {
            return Err(failure);
        }

        for id in appointment_ids {
            appointments.remove(id);
        }
        for id in billing_ids {
            billing.remove(id);
        }
        Ok(())
    }

    // ==========================================================================
    // BILLING CYCLES
    // ==========================================================================

    pub async fn upsert_cycle(&self, cycle: BillingCycle) -> Result<BillingCycle> {
        let mut guard = self.cycles.write().await;
        guard.insert((cycle.month, cycle.year), cycle.clone());
        Ok(cycle)
    }

    pub async fn get_cycle(&self, month: u32, year: i32) -> Result<Option<BillingCycle>> {
        Ok(self.cycles.read().await.get(&(month, year)).cloned())
    }

    pub async fn all_cycles(&self) -> Result<Vec<BillingCycle>> {
        let mut cycles: Vec<BillingCycle> =
            self.cycles.read().await.values().cloned().collect();
        cycles.sort_by_key(|c| (c.year, c.month));
        Ok(cycles)
    }

    pub async fn active_cycle(&self) -> Result<Option<BillingCycle>> {
        Ok(self
            .cycles
            .read()
            .await
            .values()
            .find(|c| c.status == shared_models::CycleStatus::Active)
            .cloned())
    }

    // ==========================================================================
    // AVAILABILITY SCHEDULES
    // ==========================================================================

    pub async fn set_schedule(&self, schedule: AvailabilitySchedule) -> Result<AvailabilitySchedule> {
        let mut guard = self.schedules.write().await;
        guard.insert(schedule.clinician_id, schedule.clone());
        Ok(schedule)
    }

    pub async fn get_schedule(&self, clinician_id: Uuid) -> Result<Option<AvailabilitySchedule>> {
        Ok(self.schedules.read().await.get(&clinician_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_models::{AppointmentStatus, BillingStatus};

    fn pending_appointment(patient_id: Uuid) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            clinician_id: Uuid::new_v4(),
            clinician_name: "Dr. Rivera".to_string(),
            date: None,
            time: None,
            duration_minutes: 30,
            status: AppointmentStatus::Pending,
            notes: None,
            package: None,
            is_extra_treatment: false,
            is_consultation: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn record_for(appointment_id: Uuid, patient_id: Uuid) -> BillingRecord {
        BillingRecord {
            id: Uuid::new_v4(),
            appointment_id: Some(appointment_id),
            patient_id,
            patient_name: "Asha Naidoo".to_string(),
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
    async fn package_entity_delete_is_all_or_nothing() {
        let store = ClinicStore::new();
        let patient_id = Uuid::new_v4();
        let appointment = store
            .insert_appointment(pending_appointment(patient_id))
            .await
            .unwrap();
        let record = store
            .insert_billing_record(record_for(appointment.id, patient_id))
            .await
            .unwrap();

        let stale_appointment = Uuid::new_v4();
        let stale_record = Uuid::new_v4();
        let failure = store
            .delete_package_entities(
                &[appointment.id, stale_appointment],
                &[record.id, stale_record],
            )
            .await
            .unwrap_err();
        assert_eq!(failure.missing_appointments, vec![stale_appointment]);
        assert_eq!(failure.missing_billing_records, vec![stale_record]);

        // The known documents survive a failed batch untouched.
        assert!(store.get_appointment(appointment.id).await.unwrap().is_some());
        assert!(store.get_billing_record(record.id).await.unwrap().is_some());

        store
            .delete_package_entities(&[appointment.id], &[record.id])
            .await
            .unwrap();
        assert!(store.get_appointment(appointment.id).await.unwrap().is_none());
        assert!(store.get_billing_record(record.id).await.unwrap().is_none());
    }
}
