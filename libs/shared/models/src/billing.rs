use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    Pending,
    Completed,
    AutoPaid,
}

impl BillingStatus {
    /// Statuses that count towards collections in a cycle summary.
    pub fn is_settled(&self) -> bool {
        matches!(self, BillingStatus::Completed | BillingStatus::AutoPaid)
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingStatus::Pending => write!(f, "Pending"),
            BillingStatus::Completed => write!(f, "Completed"),
            BillingStatus::AutoPaid => write!(f, "Auto-Paid"),
        }
    }
}

/// Package linkage on a billing record created by a package purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageBilling {
    pub package_id: Uuid,
    pub sessions: u32,
}

/// A single billing entry. `appointment_id` is empty for imported or manual
/// records. Settled amounts are immutable except through an explicit
/// correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub clinician_name: Option<String>,
    pub amount: f64,
    pub status: BillingStatus,
    pub payment_mode: Option<String>,
    pub date: NaiveDate,
    pub package: Option<PackageBilling>,
    pub is_extra_treatment: bool,
    pub created_at: DateTime<Utc>,
}

/// A prepaid bundle of sessions purchased as one billing transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub total_sessions: u32,
    pub amount: f64,
    pub discount_percent: Option<f64>,
    pub billing_id: Uuid,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Pending,
    Active,
    Closed,
}

/// A calendar-month accounting window. Identity is `(month, year)`; at most
/// one cycle is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingCycle {
    pub month: u32,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
}

impl BillingCycle {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
