use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Billing classification for a patient. A closed set: billing rules are an
/// exhaustive match over these variants, so adding a category is a
/// compile-time-checked extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientCategory {
    Referral,
    Vip,
    PaidWithConcession,
    PaidWithoutConcession,
    SubsidizedCare,
    Other,
}

impl fmt::Display for PatientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientCategory::Referral => write!(f, "referral"),
            PatientCategory::Vip => write!(f, "vip"),
            PatientCategory::PaidWithConcession => write!(f, "paid_with_concession"),
            PatientCategory::PaidWithoutConcession => write!(f, "paid_without_concession"),
            PatientCategory::SubsidizedCare => write!(f, "subsidized_care"),
            PatientCategory::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Completed,
}

/// Free/used/pending-paid session counters for subsidized-care patients.
///
/// Counters only ever go up; the sole way down is an explicit reset. The
/// processed map guards against double-counting a completed appointment and
/// remembers whether each one consumed a free session, so a replayed
/// completion keeps its original free/paid attribution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAllowance {
    pub free_sessions_used: u32,
    pub pending_paid_sessions: u32,
    pub pending_charge_amount: f64,
    pub processed_appointments: HashMap<Uuid, bool>,
}

impl SessionAllowance {
    /// Whether the appointment was already counted, and if so whether it
    /// consumed a free session.
    pub fn already_processed(&self, appointment_id: &Uuid) -> Option<bool> {
        self.processed_appointments.get(appointment_id).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub category: PatientCategory,
    /// Discount applied for PaidWithConcession patients, in percent.
    pub concession_percent: Option<f64>,
    pub total_sessions_required: u32,
    pub remaining_sessions: u32,
    pub status: PatientStatus,
    pub session_allowance: Option<SessionAllowance>,
    /// Packages this patient has purchased. Cleared on package removal.
    pub package_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(full_name: String, category: PatientCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            category,
            concession_percent: None,
            total_sessions_required: 0,
            remaining_sessions: 0,
            status: PatientStatus::Active,
            session_allowance: matches!(category, PatientCategory::SubsidizedCare)
                .then(SessionAllowance::default),
            package_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
