use axum::{middleware, routing::get, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    Router::new()
        .route("/schedules", get(handlers::get_doctor_schedules))
        .route("/{doctor_id}/available-slots", get(handlers::get_available_slots))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
