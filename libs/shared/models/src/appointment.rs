use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_APPOINTMENT_DURATION_MINUTES: i32 = 30;

/// A single booked (or not-yet-scheduled) session with a clinician.
///
/// Package sessions are created unscheduled, so `date` and `time` stay empty
/// until the front desk assigns them a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub package: Option<PackageLink>,
    /// Billing audit flag, passed through to the billing record. Does not
    /// change which billing rule applies.
    pub is_extra_treatment: bool,
    /// Marks the patient's first appointment.
    pub is_consultation: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

/// Linkage carried by appointments that belong to a prepaid package.
/// Invariant: `session_number <= total_sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageLink {
    pub package_id: Uuid,
    pub session_number: u32,
    pub total_sessions: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Ongoing,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Ongoing => write!(f, "ongoing"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
