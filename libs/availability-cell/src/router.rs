use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn availability_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/clinicians/{clinician_id}/day",
            get(handlers::get_day_availability),
        )
        .route("/clinicians/{clinician_id}/slots", get(handlers::get_slots))
        .route(
            "/clinicians/{clinician_id}/schedule",
            put(handlers::update_schedule),
        )
        .with_state(state)
}
