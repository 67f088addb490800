use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use encounter_cell::router::encounter_routes;
use queue_cell::router::queue_routes;
use schedule_cell::router::schedule_routes;
use shared_database::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Careflow scheduling API is running!" }))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/queues", queue_routes(state.clone()))
        .nest("/encounters", encounter_routes(state))
}
