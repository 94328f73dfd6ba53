use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient))
        .route("/{patient_id}", get(handlers::get_patient))
        .route("/{patient_id}", put(handlers::update_patient))
        .route(
            "/{patient_id}/allowance/reset",
            post(handlers::reset_allowance),
        )
        .with_state(state)
}
