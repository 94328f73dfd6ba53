use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, DEFAULT_APPOINTMENT_DURATION_MINUTES,
};
use shared_store::ClinicStore;

use crate::models::{
    AppointmentError, BookAppointmentRequest, ConflictCandidate, RescheduleAppointmentRequest,
};
use crate::services::conflict::ConflictChecker;

/// Creates and moves appointments.
///
/// Validation happens before any write; conflicts are warnings that the
/// caller must confirm past, never hard locks, since group sessions
/// legitimately share a clinician's slot.
pub struct AppointmentBookingService {
    store: Arc<ClinicStore>,
    conflict_checker: ConflictChecker,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self {
            store,
            conflict_checker: ConflictChecker::new(),
        }
    }

    /// Book one appointment per selected slot.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let clinician_id = request.clinician_id.ok_or_else(|| {
            AppointmentError::ValidationError("A clinician must be selected".to_string())
        })?;
        let date = request.date.ok_or_else(|| {
            AppointmentError::ValidationError("A date must be selected".to_string())
        })?;
        if request.times.is_empty() {
            return Err(AppointmentError::ValidationError(
                "At least one time slot must be selected".to_string(),
            ));
        }

        let patient = self
            .store
            .get_patient(request.patient_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::PatientNotFound)?;

        let duration = request
            .duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_APPOINTMENT_DURATION_MINUTES);

        // Conflicts across every selected slot are gathered first so the
        // caller confirms once, not per slot.
        let existing = self
            .store
            .appointments_for_clinician_on(clinician_id, date)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut conflict_total = 0;
        for time in &request.times {
            let response = self.conflict_checker.check(
                &existing,
                &ConflictCandidate {
                    clinician_id,
                    date,
                    time: *time,
                    duration_minutes: duration,
                    exclude_appointment_id: None,
                },
            );
            conflict_total += response.conflicting_appointments.len();
        }
        if conflict_total > 0 && !request.confirmed.unwrap_or(false) {
            debug!(
                "booking for patient {} held back pending confirmation",
                request.patient_id
            );
            return Err(AppointmentError::ConflictWarning(conflict_total));
        }

        let clinician_name = request.clinician_name.unwrap_or_default();
        let now = Utc::now();
        let mut booked = Vec::with_capacity(request.times.len());
        for time in request.times {
            let appointment = Appointment {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                clinician_id,
                clinician_name: clinician_name.clone(),
                date: Some(date),
                time: Some(time),
                duration_minutes: duration,
                status: AppointmentStatus::Pending,
                notes: request.notes.clone(),
                package: None,
                is_extra_treatment: request.is_extra_treatment.unwrap_or(false),
                is_consultation: request.is_consultation.unwrap_or(false),
                created_at: now,
                updated_at: now,
            };
            let stored = self
                .store
                .insert_appointment(appointment)
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
            booked.push(stored);
        }

        info!(
            "booked {} appointment(s) for patient {} with clinician {}",
            booked.len(),
            patient.id,
            clinician_id
        );
        Ok(booked)
    }

    /// Move an appointment to a new date/time (the drag-move path). The
    /// conflict check runs again with the moved appointment excluded.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .store
            .get_appointment(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;

        let duration = request
            .new_duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(appointment.duration_minutes);

        let existing = self
            .store
            .appointments_for_clinician_on(appointment.clinician_id, request.new_date)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        let response = self.conflict_checker.check(
            &existing,
            &ConflictCandidate {
                clinician_id: appointment.clinician_id,
                date: request.new_date,
                time: request.new_time,
                duration_minutes: duration,
                exclude_appointment_id: Some(appointment.id),
            },
        );
        if response.has_conflict && !request.confirmed.unwrap_or(false) {
            return Err(AppointmentError::ConflictWarning(
                response.conflicting_appointments.len(),
            ));
        }

        appointment.date = Some(request.new_date);
        appointment.time = Some(request.new_time);
        appointment.duration_minutes = duration;
        appointment.updated_at = Utc::now();

        info!(
            "appointment {} moved to {} {}",
            appointment.id, request.new_date, request.new_time
        );
        self.store
            .update_appointment(appointment)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn delete(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        self.store
            .delete_appointment(appointment_id)
            .await
            .map_err(|_| AppointmentError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use shared_models::{Patient, PatientCategory};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    async fn setup() -> (AppointmentBookingService, Uuid, Uuid) {
        let store = Arc::new(ClinicStore::new());
        let patient = Patient::new("Asha Naidoo".to_string(), PatientCategory::Other);
        let patient_id = patient.id;
        store.insert_patient(patient).await.unwrap();
        (
            AppointmentBookingService::new(store),
            patient_id,
            Uuid::new_v4(),
        )
    }

    fn request(patient_id: Uuid, clinician_id: Uuid, times: Vec<NaiveTime>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id,
            clinician_id: Some(clinician_id),
            clinician_name: Some("Dr. Rivera".to_string()),
            date: Some(date()),
            times,
            duration_minutes: None,
            notes: None,
            is_extra_treatment: None,
            is_consultation: None,
            confirmed: None,
        }
    }

    #[tokio::test]
    async fn booking_without_clinician_is_rejected_before_write() {
        let (service, patient_id, _) = setup().await;
        let mut req = request(patient_id, Uuid::new_v4(), vec![time(10, 0)]);
        req.clinician_id = None;

        let result = service.book(req).await;
        assert!(matches!(result, Err(AppointmentError::ValidationError(_))));
        assert!(service.store.all_appointments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_without_slots_is_rejected() {
        let (service, patient_id, clinician_id) = setup().await;
        let result = service.book(request(patient_id, clinician_id, vec![])).await;
        assert!(matches!(result, Err(AppointmentError::ValidationError(_))));
    }

    #[tokio::test]
    async fn multi_slot_booking_creates_one_appointment_per_slot() {
        let (service, patient_id, clinician_id) = setup().await;
        let booked = service
            .book(request(
                patient_id,
                clinician_id,
                vec![time(10, 0), time(10, 30), time(11, 0)],
            ))
            .await
            .unwrap();

        assert_eq!(booked.len(), 3);
        assert!(booked
            .iter()
            .all(|a| a.status == AppointmentStatus::Pending));
    }

    #[tokio::test]
    async fn overlap_is_a_warning_until_confirmed() {
        let (service, patient_id, clinician_id) = setup().await;
        service
            .book(request(patient_id, clinician_id, vec![time(10, 0)]))
            .await
            .unwrap();

        // Same slot again: held back without confirmation.
        let held = service
            .book(request(patient_id, clinician_id, vec![time(10, 0)]))
            .await;
        assert!(matches!(held, Err(AppointmentError::ConflictWarning(1))));

        // Confirmed: the group session is allowed through.
        let mut confirmed = request(patient_id, clinician_id, vec![time(10, 0)]);
        confirmed.confirmed = Some(true);
        let booked = service.book(confirmed).await.unwrap();
        assert_eq!(booked.len(), 1);
    }

    #[tokio::test]
    async fn reschedule_skips_self_when_checking_conflicts() {
        let (service, patient_id, clinician_id) = setup().await;
        let booked = service
            .book(request(patient_id, clinician_id, vec![time(10, 0)]))
            .await
            .unwrap();

        // Nudging the same appointment by 15 minutes only overlaps itself.
        let moved = service
            .reschedule(
                booked[0].id,
                RescheduleAppointmentRequest {
                    new_date: date(),
                    new_time: time(10, 15),
                    new_duration_minutes: None,
                    confirmed: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.time, Some(time(10, 15)));
    }
}
