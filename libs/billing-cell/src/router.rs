use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn billing_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/records", get(handlers::list_billing_records))
        .route(
            "/records/{record_id}",
            delete(handlers::delete_billing_record),
        )
        .route("/packages", post(handlers::purchase_package))
        .route(
            "/packages/patients/{patient_id}",
            delete(handlers::remove_packages),
        )
        .route("/cycles/summary", get(handlers::cycle_summary))
        .route("/cycles/rollover", post(handlers::rollover_cycle))
        .route("/import", post(handlers::bulk_import))
        .with_state(state)
}
