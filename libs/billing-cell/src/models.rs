use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{Appointment, BillingRecord, Package, SessionAllowance};

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PurchasePackageRequest {
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub total_sessions: u32,
    pub amount: f64,
    pub discount_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagePurchase {
    pub package: Package,
    pub billing_record: BillingRecord,
    pub appointments: Vec<Appointment>,
}

/// Outcome of one allowance consumption.
#[derive(Debug, Clone, Serialize)]
pub struct UsageResult {
    pub was_free: bool,
    pub remaining_free_sessions: u32,
    pub allowance: SessionAllowance,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub pending_count: usize,
    pub completed_count: usize,
    /// Sum of settled (Completed / Auto-Paid) amounts within the cycle.
    pub collections: f64,
}

// ==============================================================================
// BULK IMPORT MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub patient_name: String,
    pub amount: f64,
    pub date: String,
    pub doctor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub row_index: usize,
    pub patient_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub imported: Vec<BillingRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolloverRequest {
    /// Reference date for the rollover, defaulting to today. Exposed so the
    /// month boundary can be exercised deterministically.
    pub today: Option<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BillingError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Billing record not found")]
    RecordNotFound,

    #[error("Patient has no session allowance")]
    NoAllowance,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Package removal incomplete: {0}")]
    CascadeFailed(String),
}
