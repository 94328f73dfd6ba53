use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{DayAvailability, Slot};

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    /// Overrides the configured slot width when provided.
    pub slot_width_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayAvailabilityResponse {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    pub availability: DayAvailability,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotListResponse {
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    /// Informational occupancy cap from configuration, if one is set.
    pub max_slot_occupancy: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScheduleRequest {
    pub weekly: Option<std::collections::HashMap<u8, DayAvailability>>,
    pub overrides: Option<std::collections::BTreeMap<NaiveDate, DayAvailability>>,
}
