// libs/encounter-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_database::state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn encounter_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/{encounter_id}", get(handlers::get_encounter))
        .route("/{encounter_id}/close", post(handlers::close_encounter))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
