use serde::Deserialize;

use shared_models::PatientCategory;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
    pub category: PatientCategory,
    pub concession_percent: Option<f64>,
    /// Number of sessions the referring clinician prescribed, if known.
    pub total_sessions_required: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePatientRequest {
    pub full_name: Option<String>,
    pub category: Option<PatientCategory>,
    pub concession_percent: Option<f64>,
    pub total_sessions_required: Option<u32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
