use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus};

use crate::models::{ConflictCandidate, ConflictCheckResponse};

/// Finds existing appointments that overlap a proposed booking.
///
/// Purely advisory: a conflict never blocks a booking by itself. The booking
/// flow asks the caller to confirm explicitly before proceeding. Cancelled
/// appointments never conflict, and two bookings that exactly touch
/// (one ends when the other starts) do not overlap.
pub struct ConflictChecker;

impl ConflictChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(
        &self,
        existing: &[Appointment],
        candidate: &ConflictCandidate,
    ) -> ConflictCheckResponse {
        debug!(
            "checking conflicts for clinician {} on {} at {}",
            candidate.clinician_id, candidate.date, candidate.time
        );

        let conflicting_appointments: Vec<Appointment> = existing
            .iter()
            .filter(|a| self.conflicts_with(a, candidate))
            .cloned()
            .collect();

        if !conflicting_appointments.is_empty() {
            warn!(
                "{} conflicting appointment(s) found for clinician {}",
                conflicting_appointments.len(),
                candidate.clinician_id
            );
        }

        ConflictCheckResponse {
            has_conflict: !conflicting_appointments.is_empty(),
            conflicting_appointments,
        }
    }

    fn conflicts_with(&self, appointment: &Appointment, candidate: &ConflictCandidate) -> bool {
        if Some(appointment.id) == candidate.exclude_appointment_id {
            return false;
        }
        if appointment.clinician_id != candidate.clinician_id {
            return false;
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return false;
        }
        let (Some(date), Some(time)) = (appointment.date, appointment.time) else {
            // Unscheduled package sessions occupy no time yet.
            return false;
        };
        if date != candidate.date {
            return false;
        }

        intervals_overlap(
            time,
            appointment.duration_minutes,
            candidate.time,
            candidate.duration_minutes,
        )
    }
}

impl Default for ConflictChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-open interval intersection over minutes of the day:
/// `[start, start+duration)`; touching boundaries do not overlap.
fn intervals_overlap(
    start_a: NaiveTime,
    duration_a: i32,
    start_b: NaiveTime,
    duration_b: i32,
) -> bool {
    use chrono::Timelike;
    let a_start = (start_a.hour() * 60 + start_a.minute()) as i64;
    let b_start = (start_b.hour() * 60 + start_b.minute()) as i64;
    let a_end = a_start + duration_a.max(0) as i64;
    let b_end = b_start + duration_b.max(0) as i64;
    a_start < b_end && b_start < a_end
}

/// Assemble a candidate with no exclusion, for brand-new bookings.
pub fn candidate(
    clinician_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i32,
) -> ConflictCandidate {
    ConflictCandidate {
        clinician_id,
        date,
        time,
        duration_minutes,
        exclude_appointment_id: None,
    }
}
