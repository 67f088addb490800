// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::state::AppState;
use shared_models::error::AppError;

use crate::error::ScheduleError;
use crate::models::{DayScheduleResponse, ScheduleResourceType};
use crate::services::slots::SlotService;

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub resource_type: ScheduleResourceType,
    pub resource_id: Uuid,
    pub day: NaiveDate,
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::SlotNotFound => AppError::NotFound("Slot not found".to_string()),
        ScheduleError::Backend(msg) => AppError::ExternalService(msg),
        other => AppError::Internal(other.to_string()),
    }
}

/// Day schedule for one resource: raw slots fetched from the backend and
/// grouped into availability bands.
#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DayScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = SlotService::new(state);
    let groups = service
        .get_day_schedule(query.resource_type, query.resource_id, query.day, token)
        .await
        .map_err(map_schedule_error)?;

    let response = DayScheduleResponse {
        resource_type: query.resource_type,
        resource_id: query.resource_id,
        day: query.day,
        groups,
    };

    Ok(Json(json!({
        "success": true,
        "schedule": response
    })))
}

#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = SlotService::new(state);
    let slot = service.get_slot(slot_id, token).await.map_err(map_schedule_error)?;
    let selectable = slot.is_selectable();

    Ok(Json(json!({
        "success": true,
        "slot": slot,
        "selectable": selectable
    })))
}
