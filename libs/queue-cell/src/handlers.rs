// libs/queue-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::state::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::error::QueueError;
use crate::models::{CreateTokenRequest, TokenListQuery, UpdateTokenRequest};
use crate::services::tokens::TokenService;

fn map_queue_error(e: QueueError) -> AppError {
    match e {
        QueueError::TokenNotFound => AppError::NotFound("Token not found".to_string()),
        QueueError::QueueNotFound => AppError::NotFound("Queue not found".to_string()),
        QueueError::SlotFull => {
            AppError::BadRequest("Slot has no remaining token capacity".to_string())
        }
        QueueError::InvalidStatusTransition { .. } | QueueError::TokenAlreadyClosed => {
            AppError::Conflict(e.to_string())
        }
        QueueError::ValidationError(msg) => AppError::ValidationError(msg),
        QueueError::Backend(msg) => AppError::ExternalService(msg),
        other => AppError::Internal(other.to_string()),
    }
}

#[axum::debug_handler]
pub async fn list_queues(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let queues = service.list_queues(token).await.map_err(map_queue_error)?;

    Ok(Json(json!({
        "success": true,
        "queues": queues
    })))
}

#[axum::debug_handler]
pub async fn get_queue_overview(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(queue_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let overview = service
        .get_queue_overview(queue_id, token)
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!({
        "success": true,
        "overview": overview
    })))
}

#[axum::debug_handler]
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(queue_id): Path<Uuid>,
    Query(query): Query<TokenListQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let tokens = service
        .list_tokens(queue_id, &query, token)
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!({
        "success": true,
        "tokens": tokens
    })))
}

#[axum::debug_handler]
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(queue_id): Path<Uuid>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let issued = service
        .create_token(queue_id, request, token)
        .await
        .map_err(map_queue_error)?;

    let message = format!("Token {} issued", issued.number);

    Ok(Json(json!({
        "success": true,
        "token": issued,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((queue_id, token_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let found = service
        .get_token(queue_id, token_id, token)
        .await
        .map_err(map_queue_error)?;

    let can_close = found.can_close();

    Ok(Json(json!({
        "success": true,
        "token": found,
        "can_close": can_close
    })))
}

#[axum::debug_handler]
pub async fn update_token(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((queue_id, token_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = TokenService::new(state);
    let updated = service
        .update_token(queue_id, token_id, request, token)
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!({
        "success": true,
        "token": updated
    })))
}

/// Administrative cancel - restricted to staff roles, distinct from the
/// normal completion flow.
#[axum::debug_handler]
pub async fn cancel_token(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((queue_id, token_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_admin = user.role.as_deref() == Some("admin");
    let is_staff = user.role.as_deref() == Some("staff");

    if !is_admin && !is_staff {
        return Err(AppError::Auth("Not authorized to cancel tokens".to_string()));
    }

    let service = TokenService::new(state);
    service
        .cancel_token(queue_id, token_id, token)
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Token cancelled"
    })))
}
