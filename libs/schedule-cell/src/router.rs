// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_database::state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/slots", get(handlers::get_day_schedule))
        .route("/slots/{slot_id}", get(handlers::get_slot))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
