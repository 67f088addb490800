// libs/encounter-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::state::AppState;
use shared_models::error::AppError;

use crate::error::EncounterError;
use crate::models::CloseRequest;
use crate::services::encounter::EncounterService;

fn map_encounter_error(e: EncounterError) -> AppError {
    match e {
        EncounterError::EncounterNotFound => {
            AppError::NotFound("Encounter not found".to_string())
        }
        EncounterError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        EncounterError::NoLinkedAppointment | EncounterError::NoLinkedToken => {
            AppError::BadRequest(e.to_string())
        }
        EncounterError::AppointmentAlreadyClosed
        | EncounterError::EncounterAlreadyCompleted => AppError::Conflict(e.to_string()),
        EncounterError::Backend(msg) => AppError::ExternalService(msg),
        other => AppError::Internal(other.to_string()),
    }
}

#[axum::debug_handler]
pub async fn get_encounter(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(encounter_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = EncounterService::new(state);
    let encounter = service
        .get_encounter(encounter_id, token)
        .await
        .map_err(map_encounter_error)?;
    let can_complete = encounter.can_complete();

    Ok(Json(json!({
        "success": true,
        "encounter": encounter,
        "can_complete": can_complete
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = EncounterService::new(state);
    let appointment = service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_encounter_error)?;
    let can_close = appointment.can_close();

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "can_close": can_close
    })))
}

/// Close flow entry point: marks the encounter complete and/or closes the
/// linked appointment and token in one batch, per the requested action.
#[axum::debug_handler]
pub async fn close_encounter(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(encounter_id): Path<Uuid>,
    Json(request): Json<CloseRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = EncounterService::new(state);
    let outcome = service
        .close(encounter_id, request.action, token)
        .await
        .map_err(map_encounter_error)?;

    Ok(Json(json!({
        "success": true,
        "outcome": outcome
    })))
}
