use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::{AppError, AppointmentStatus, AvailabilitySchedule};
use shared_store::AppState;

use crate::models::{DayAvailabilityResponse, SlotListResponse, SlotQuery, UpdateScheduleRequest};
use crate::services::{AvailabilityResolver, SlotGenerator};

/// Resolve a clinician's bookable windows for one date.
#[axum::debug_handler]
pub async fn get_day_availability(
    State(state): State<Arc<AppState>>,
    Path(clinician_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<DayAvailabilityResponse>, AppError> {
    let schedule = state
        .store
        .get_schedule(clinician_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let resolver = AvailabilityResolver::new(&state.config);
    let availability = resolver.resolve(schedule.as_ref(), query.date);

    Ok(Json(DayAvailabilityResponse {
        clinician_id,
        date: query.date,
        availability,
    }))
}

/// List the slots a booking form should offer, annotated with occupancy.
#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(clinician_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotListResponse>, AppError> {
    debug!("listing slots for clinician {} on {}", clinician_id, query.date);

    let schedule = state
        .store
        .get_schedule(clinician_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let resolver = AvailabilityResolver::new(&state.config);
    let day = resolver.resolve(schedule.as_ref(), query.date);

    let existing: Vec<_> = state
        .store
        .appointments_for_clinician_on(clinician_id, query.date)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .into_iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled)
        .collect();

    let width = query
        .slot_width_minutes
        .unwrap_or(state.config.slot_width_minutes);
    let slots = SlotGenerator::new(width).generate(&day, &existing);

    Ok(Json(SlotListResponse {
        clinician_id,
        date: query.date,
        slots,
        max_slot_occupancy: state.config.max_slot_occupancy,
    }))
}

/// Replace parts of a clinician's schedule. Availability edits originate
/// outside the scheduling core; this is the write path they use.
#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(clinician_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<AvailabilitySchedule>, AppError> {
    let mut schedule = state
        .store
        .get_schedule(clinician_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .unwrap_or_else(|| AvailabilitySchedule::new(clinician_id));

    if let Some(weekly) = request.weekly {
        schedule.weekly.clear();
        for (num, day) in weekly {
            let weekday = match num {
                0 => chrono::Weekday::Mon,
                1 => chrono::Weekday::Tue,
                2 => chrono::Weekday::Wed,
                3 => chrono::Weekday::Thu,
                4 => chrono::Weekday::Fri,
                5 => chrono::Weekday::Sat,
                6 => chrono::Weekday::Sun,
                other => {
                    return Err(AppError::ValidationError(format!(
                        "invalid weekday number: {}",
                        other
                    )))
                }
            };
            schedule.weekly.insert(weekday, day);
        }
    }
    if let Some(overrides) = request.overrides {
        schedule.overrides = overrides;
    }

    let saved = state
        .store
        .set_schedule(schedule)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(saved))
}
