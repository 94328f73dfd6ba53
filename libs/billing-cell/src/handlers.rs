use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, BillingCycle, BillingRecord, CycleStatus};
use shared_store::AppState;

use crate::models::{
    BillingError, ImportReport, ImportRow, PackagePurchase, PurchasePackageRequest,
    RolloverRequest, SummaryQuery,
};
use crate::services::{
    BillingCycleService, BillingRecordService, BulkImportService, PackageLedgerService,
};

fn map_error(error: BillingError) -> AppError {
    match error {
        BillingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BillingError::RecordNotFound => AppError::NotFound("Billing record not found".to_string()),
        BillingError::NoAllowance => {
            AppError::BadRequest("Patient has no session allowance".to_string())
        }
        BillingError::ValidationError(msg) => AppError::ValidationError(msg),
        BillingError::DatabaseError(msg) => AppError::Internal(msg),
        BillingError::CascadeFailed(msg) => AppError::Conflict(msg),
    }
}

#[axum::debug_handler]
pub async fn purchase_package(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PurchasePackageRequest>,
) -> Result<Json<PackagePurchase>, AppError> {
    let service = PackageLedgerService::new(state.store.clone());
    let purchase = service.purchase(request).await.map_err(map_error)?;
    Ok(Json(purchase))
}

#[axum::debug_handler]
pub async fn remove_packages(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PackageLedgerService::new(state.store.clone());
    service.remove(patient_id).await.map_err(map_error)?;
    Ok(Json(json!({
        "success": true,
        "message": "All packages removed"
    })))
}

#[axum::debug_handler]
pub async fn list_billing_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BillingRecord>>, AppError> {
    let mut records = state
        .store
        .all_billing_records()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    records.sort_by_key(|r| r.date);
    Ok(Json(records))
}

#[axum::debug_handler]
pub async fn delete_billing_record(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BillingRecordService::new(state.store.clone());
    service.delete(record_id).await.map_err(map_error)?;
    Ok(Json(json!({
        "success": true,
        "message": "Billing record deleted"
    })))
}

/// Summary of the requested month, or of the current calendar month.
#[axum::debug_handler]
pub async fn cycle_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BillingCycleService::new(state.store.clone());
    let today = Utc::now().date_naive();

    let cycle: BillingCycle = match (query.month, query.year) {
        (Some(month), Some(year)) => {
            if !(1..=12).contains(&month) {
                return Err(AppError::ValidationError(format!(
                    "invalid month: {}",
                    month
                )));
            }
            match state
                .store
                .get_cycle(month, year)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
            {
                Some(cycle) => cycle,
                None => {
                    // Unrecorded months still summarize; the window is pure
                    // calendar arithmetic.
                    let reference =
                        chrono::NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                            AppError::ValidationError("invalid month/year".to_string())
                        })?;
                    service.current_cycle(reference)
                }
            }
        }
        // No explicit month: summarize the active cycle, creating this
        // month's lazily when the ledger has none yet.
        _ => service.ensure_active(today).await.map_err(map_error)?,
    };

    let records = state
        .store
        .all_billing_records()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let summary = service.summarize(&cycle, &records);

    Ok(Json(json!({
        "cycle": cycle,
        "summary": summary
    })))
}

#[axum::debug_handler]
pub async fn rollover_cycle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RolloverRequest>,
) -> Result<Json<BillingCycle>, AppError> {
    let service = BillingCycleService::new(state.store.clone());
    let today = request.today.unwrap_or_else(|| Utc::now().date_naive());
    let next = service.rollover(today).await.map_err(map_error)?;
    debug_assert_eq!(next.status, CycleStatus::Active);
    Ok(Json(next))
}

#[axum::debug_handler]
pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<ImportRow>>,
) -> Result<Json<ImportReport>, AppError> {
    let service = BulkImportService::new(state.store.clone());
    let report = service.import(rows).await.map_err(map_error)?;
    Ok(Json(report))
}
