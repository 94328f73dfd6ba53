// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared_models::{AppError, Appointment};
use shared_store::AppState;

use crate::models::{
    AppointmentError, BillingSyncReport, BookAppointmentRequest, ChangeStatusRequest,
    ConflictCandidate, ConflictCheckResponse, RescheduleAppointmentRequest,
};
use crate::services::{
    AppointmentBookingService, AppointmentLifecycleService, BillingSyncService, ConflictChecker,
};

fn map_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::ConflictWarning(_) => AppError::Conflict(error.to_string()),
        AppointmentError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointments(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = AppointmentBookingService::new(state.store.clone());
    let booked = service.book(request).await.map_err(map_error)?;
    Ok(Json(booked))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentBookingService::new(state.store.clone());
    let appointment = service.get(appointment_id).await.map_err(map_error)?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AppointmentBookingService::new(state.store.clone());
    service.delete(appointment_id).await.map_err(map_error)?;
    Ok(Json(serde_json::json!({ "deleted": appointment_id })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentBookingService::new(state.store.clone());
    let appointment = service
        .reschedule(appointment_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn change_appointment_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentLifecycleService::new(
        state.store.clone(),
        &state.config,
        state.events.clone(),
    );
    let appointment = service
        .change_status(appointment_id, request.new_status, request.performed_by)
        .await
        .map_err(map_error)?;
    Ok(Json(appointment))
}

/// Dry-run conflict check for the booking form's live warnings.
#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<ConflictCandidate>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let existing = state
        .store
        .appointments_for_clinician_on(candidate.clinician_id, candidate.date)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let response = ConflictChecker::new().check(&existing, &candidate);
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn sync_billing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BillingSyncReport>, AppError> {
    let service = BillingSyncService::new(state.store.clone(), &state.config);
    let report = service.sync().await.map_err(map_error)?;
    Ok(Json(report))
}
