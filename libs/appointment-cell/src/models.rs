// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus, StaffRole};

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub clinician_id: Option<Uuid>,
    pub clinician_name: Option<String>,
    pub date: Option<NaiveDate>,
    /// Slot start times selected in the booking form. One appointment is
    /// created per selected slot.
    pub times: Vec<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub is_extra_treatment: Option<bool>,
    pub is_consultation: Option<bool>,
    /// Set after the caller has reviewed conflict warnings. Without it, a
    /// booking that overlaps existing appointments is refused.
    pub confirmed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_time: NaiveTime,
    pub new_duration_minutes: Option<i32>,
    pub confirmed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub new_status: AppointmentStatus,
    /// Audit tag only; no permission check happens here.
    pub performed_by: Option<StaffRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

/// Candidate booking handed to the conflict checker.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictCandidate {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    /// Left out when the candidate is a brand-new booking; set on
    /// reschedule so an appointment never conflicts with itself.
    pub exclude_appointment_id: Option<Uuid>,
}

/// Result of one reconciliation pass over completed appointments.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingSyncReport {
    pub records_created: usize,
    pub already_billed: usize,
    pub skipped: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Booking overlaps {0} existing appointment(s); confirm to proceed")]
    ConflictWarning(usize),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
