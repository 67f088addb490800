// libs/encounter-cell/src/services/encounter.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::emr::{EmrClient, EmrError};
use shared_database::state::AppState;

use crate::error::EncounterError;
use crate::models::{Appointment, CloseAction, CloseOutcome, Encounter};
use crate::services::reconciler;

pub struct EncounterService {
    emr: EmrClient,
    state: Arc<AppState>,
}

impl EncounterService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            emr: EmrClient::new(&state.config),
            state,
        }
    }

    pub async fn get_encounter(
        &self,
        encounter_id: Uuid,
        auth_token: &str,
    ) -> Result<Encounter, EncounterError> {
        let cache_key = format!("encounters:{}", encounter_id);

        if let Some(cached) = self.state.cache.get(&cache_key).await {
            let encounter: Encounter = serde_json::from_value(cached)?;
            return Ok(encounter);
        }

        let path = format!("/api/v1/encounters/{}", encounter_id);
        let encounter: Encounter = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                EmrError::NotFound(_) => EncounterError::EncounterNotFound,
                other => EncounterError::Backend(other.to_string()),
            })?;

        self.state.cache
            .put(&cache_key, serde_json::to_value(&encounter)?)
            .await;

        Ok(encounter)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, EncounterError> {
        let cache_key = format!("appointments:{}", appointment_id);

        if let Some(cached) = self.state.cache.get(&cache_key).await {
            let appointment: Appointment = serde_json::from_value(cached)?;
            return Ok(appointment);
        }

        let path = format!("/api/v1/appointments/{}", appointment_id);
        let appointment: Appointment = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                EmrError::NotFound(_) => EncounterError::AppointmentNotFound,
                other => EncounterError::Backend(other.to_string()),
            })?;

        self.state.cache
            .put(&cache_key, serde_json::to_value(&appointment)?)
            .await;

        Ok(appointment)
    }

    /// Run one close action through the batch reconciler.
    ///
    /// On batch-level failure nothing is invalidated and the error is
    /// surfaced as-is; the caller retries the whole action. On batch
    /// success the affected key families are invalidated regardless of
    /// per-item outcomes, so the next read reflects whatever the backend
    /// actually applied.
    pub async fn close(
        &self,
        encounter_id: Uuid,
        action: CloseAction,
        auth_token: &str,
    ) -> Result<CloseOutcome, EncounterError> {
        let encounter = self.get_encounter(encounter_id, auth_token).await?;

        if action == CloseAction::MarkAsComplete && !encounter.can_complete() {
            return Err(EncounterError::EncounterAlreadyCompleted);
        }

        let appointment = match encounter.appointment_id {
            Some(appointment_id) => {
                Some(self.get_appointment(appointment_id, auth_token).await?)
            }
            None => None,
        };

        let entries = reconciler::compose_close_batch(
            action,
            &self.state.config.facility_id,
            &encounter,
            appointment.as_ref(),
        )?;

        debug!(
            "Submitting close batch for encounter {} with {} entries",
            encounter_id,
            entries.len()
        );

        let response = self.emr
            .submit_batch(entries, auth_token)
            .await
            .map_err(|e| EncounterError::Backend(e.to_string()))?;

        let message = reconciler::interpret_results(&response);

        self.state.cache.invalidate_prefix("encounters:").await;
        self.state.cache.invalidate_prefix("appointments:").await;
        self.state.cache.invalidate_prefix("tokens:").await;

        if let Some(message) = message {
            info!("Encounter {} close: {}", encounter_id, message);
        }

        let (succeeded, failed): (Vec<_>, Vec<_>) = response
            .results
            .iter()
            .partition(|r| r.is_success());

        Ok(CloseOutcome {
            message: message.map(str::to_string),
            succeeded: succeeded.into_iter().map(|r| r.reference_id.clone()).collect(),
            failed: failed.into_iter().map(|r| r.reference_id.clone()).collect(),
        })
    }
}
