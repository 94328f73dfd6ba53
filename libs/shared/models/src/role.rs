use serde::{Deserialize, Serialize};
use std::fmt;

/// Who performed an action, for audit logs. Tagging only; nothing in this
/// engine enforces permissions from it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    FrontDesk,
    Clinician,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Admin => write!(f, "admin"),
            StaffRole::FrontDesk => write!(f, "front_desk"),
            StaffRole::Clinician => write!(f, "clinician"),
        }
    }
}
