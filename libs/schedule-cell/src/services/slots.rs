// libs/schedule-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_database::emr::{EmrClient, EmrError};
use shared_database::state::AppState;

use crate::error::ScheduleError;
use crate::models::{ScheduleResourceType, SlotGroup, SlotQueryResponse, TokenSlot};
use crate::services::grouping;

pub struct SlotService {
    emr: EmrClient,
    state: Arc<AppState>,
}

impl SlotService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            emr: EmrClient::new(&state.config),
            state,
        }
    }

    /// Fetch the slots for one resource and one day and return them grouped
    /// into availability bands, ready for display.
    pub async fn get_day_schedule(
        &self,
        resource_type: ScheduleResourceType,
        resource_id: Uuid,
        day: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<SlotGroup>, ScheduleError> {
        debug!("Building day schedule for {} {} on {}", resource_type, resource_id, day);

        let slots = self.fetch_slots(resource_type, resource_id, day, auth_token).await?;
        grouping::group_slots(slots)
    }

    /// Read-through fetch keyed by (resource, day). A date change produces a
    /// new key, so stale snapshots for a previous day are superseded rather
    /// than patched.
    async fn fetch_slots(
        &self,
        resource_type: ScheduleResourceType,
        resource_id: Uuid,
        day: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<TokenSlot>, ScheduleError> {
        let cache_key = format!("slots:{}:{}:{}", resource_type, resource_id, day);

        if let Some(cached) = self.state.cache.get(&cache_key).await {
            let slots: Vec<TokenSlot> = serde_json::from_value(cached)?;
            return Ok(slots);
        }

        let path = format!(
            "/api/v1/slots?resource_type={}&resource_id={}&day={}",
            resource_type, resource_id, day
        );
        let response: SlotQueryResponse = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Backend(e.to_string()))?;

        self.state.cache
            .put(&cache_key, serde_json::to_value(&response.results)?)
            .await;

        Ok(response.results)
    }

    /// Single-slot fetch, uncached: allocation counts move too quickly for a
    /// snapshot to be useful at token-issue time.
    pub async fn get_slot(&self, slot_id: Uuid, auth_token: &str) -> Result<TokenSlot, ScheduleError> {
        let path = format!("/api/v1/slots/{}", slot_id);

        self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                EmrError::NotFound(_) => ScheduleError::SlotNotFound,
                other => ScheduleError::Backend(other.to_string()),
            })
    }
}
