use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route(
            "/{appointment_id}/reschedule",
            put(handlers::reschedule_appointment),
        )
        .route(
            "/{appointment_id}/status",
            put(handlers::change_appointment_status),
        )
        .route("/conflicts/check", post(handlers::check_conflicts))
        .route("/billing/sync", post(handlers::sync_billing))
        .with_state(state)
}
