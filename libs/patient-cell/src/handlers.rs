use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared_models::{AppError, Patient};
use shared_store::AppState;

use crate::models::{PatientError, RegisterPatientRequest, UpdatePatientRequest};
use crate::services::PatientDirectoryService;

fn map_error(error: PatientError) -> AppError {
    match error {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::ValidationError(msg) => AppError::ValidationError(msg),
        PatientError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientDirectoryService::new(state.store.clone());
    let patient = service.register(request).await.map_err(map_error)?;
    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientDirectoryService::new(state.store.clone());
    let patient = service.get(patient_id).await.map_err(map_error)?;
    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientDirectoryService::new(state.store.clone());
    let patient = service
        .update(patient_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn reset_allowance(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientDirectoryService::new(state.store.clone());
    let patient = service.reset_allowance(patient_id).await.map_err(map_error)?;
    Ok(Json(patient))
}
