// libs/queue-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_database::state::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn queue_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_queues))
        .route("/{queue_id}/overview", get(handlers::get_queue_overview))
        .route("/{queue_id}/tokens", get(handlers::list_tokens))
        .route("/{queue_id}/tokens", post(handlers::create_token))
        .route("/{queue_id}/tokens/{token_id}", get(handlers::get_token))
        .route("/{queue_id}/tokens/{token_id}", put(handlers::update_token))
        .route("/{queue_id}/tokens/{token_id}/cancel", post(handlers::cancel_token))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
