// libs/queue-cell/src/services/tokens.rs
use std::sync::Arc;

use futures::future::try_join_all;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use schedule_cell::error::ScheduleError;
use schedule_cell::services::slots::SlotService;
use shared_database::emr::{EmrClient, EmrError};
use shared_database::state::AppState;

use crate::error::QueueError;
use crate::models::{
    CreateTokenRequest, Queue, QueueListResponse, QueueOverview, SubQueue,
    SubQueueListResponse, SubQueueTokens, Token, TokenListQuery, TokenListResponse,
    UpdateTokenRequest,
};

pub struct TokenService {
    emr: EmrClient,
    state: Arc<AppState>,
}

impl TokenService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            emr: EmrClient::new(&state.config),
            state,
        }
    }

    fn facility_id(&self) -> &str {
        &self.state.config.facility_id
    }

    /// Queues of the configured facility, read-through cached.
    pub async fn list_queues(&self, auth_token: &str) -> Result<Vec<Queue>, QueueError> {
        let cache_key = format!("queues:{}", self.facility_id());

        if let Some(cached) = self.state.cache.get(&cache_key).await {
            let queues: Vec<Queue> = serde_json::from_value(cached)?;
            return Ok(queues);
        }

        let path = format!("/api/v1/facilities/{}/queues", self.facility_id());
        let response: QueueListResponse = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_emr_error)?;

        self.state.cache
            .put(&cache_key, serde_json::to_value(&response.results)?)
            .await;

        Ok(response.results)
    }

    /// Tokens of one queue, optionally filtered by sub-queue and status.
    pub async fn list_tokens(
        &self,
        queue_id: Uuid,
        query: &TokenListQuery,
        auth_token: &str,
    ) -> Result<Vec<Token>, QueueError> {
        let cache_key = format!(
            "tokens:{}:{}:{}",
            queue_id,
            query.sub_queue.map(|id| id.to_string()).unwrap_or_else(|| "all".to_string()),
            query.status.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string()),
        );

        if let Some(cached) = self.state.cache.get(&cache_key).await {
            let tokens: Vec<Token> = serde_json::from_value(cached)?;
            return Ok(tokens);
        }

        let mut path = format!(
            "/api/v1/facilities/{}/queues/{}/tokens",
            self.facility_id(), queue_id
        );
        let mut params = Vec::new();
        if let Some(sub_queue) = query.sub_queue {
            params.push(format!("sub_queue={}", sub_queue));
        }
        if let Some(status) = query.status {
            params.push(format!("status={}", status));
        }
        if !params.is_empty() {
            path.push('?');
            path.push_str(&params.join("&"));
        }

        let response: TokenListResponse = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_emr_error)?;

        self.state.cache
            .put(&cache_key, serde_json::to_value(&response.results)?)
            .await;

        Ok(response.results)
    }

    /// All tokens of a queue fanned out per sub-queue. The per-sub-queue
    /// lists are independent reads and are fetched concurrently.
    pub async fn get_queue_overview(
        &self,
        queue_id: Uuid,
        auth_token: &str,
    ) -> Result<QueueOverview, QueueError> {
        let sub_queues = self.list_sub_queues(queue_id, auth_token).await?;

        let fetches = sub_queues.into_iter().map(|sub_queue| {
            let query = TokenListQuery {
                sub_queue: Some(sub_queue.id),
                status: None,
            };
            async move {
                let tokens = self.list_tokens(queue_id, &query, auth_token).await?;
                Ok::<SubQueueTokens, QueueError>(SubQueueTokens { sub_queue, tokens })
            }
        });

        let sub_queues = try_join_all(fetches).await?;

        Ok(QueueOverview { queue_id, sub_queues })
    }

    async fn list_sub_queues(
        &self,
        queue_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<SubQueue>, QueueError> {
        let path = format!(
            "/api/v1/facilities/{}/queues/{}/sub-queues",
            self.facility_id(), queue_id
        );
        let response: SubQueueListResponse = self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_emr_error)?;

        Ok(response.results)
    }

    pub async fn get_token(
        &self,
        queue_id: Uuid,
        token_id: Uuid,
        auth_token: &str,
    ) -> Result<Token, QueueError> {
        let path = format!(
            "/api/v1/facilities/{}/queues/{}/tokens/{}",
            self.facility_id(), queue_id, token_id
        );

        self.emr
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                EmrError::NotFound(_) => QueueError::TokenNotFound,
                other => QueueError::Backend(other.to_string()),
            })
    }

    /// Issue a token against a slot. The slot's remaining capacity is
    /// checked as an offer-level guard; a concurrent booking can still win
    /// the race, in which case the backend rejects the create.
    pub async fn create_token(
        &self,
        queue_id: Uuid,
        request: CreateTokenRequest,
        auth_token: &str,
    ) -> Result<Token, QueueError> {
        if request.patient_id.is_none() && request.note.is_none() {
            return Err(QueueError::ValidationError(
                "A token needs a patient or a walk-in note".to_string(),
            ));
        }

        if let Some(slot_id) = request.slot_id {
            let slot_service = SlotService::new(self.state.clone());
            let slot = slot_service
                .get_slot(slot_id, auth_token)
                .await
                .map_err(|e| match e {
                    ScheduleError::SlotNotFound => {
                        QueueError::ValidationError("Referenced slot does not exist".to_string())
                    }
                    other => QueueError::Backend(other.to_string()),
                })?;

            if !slot.is_selectable() {
                return Err(QueueError::SlotFull);
            }
        }

        debug!("Issuing token on queue {}", queue_id);

        let path = format!(
            "/api/v1/facilities/{}/queues/{}/tokens",
            self.facility_id(), queue_id
        );
        let body = json!({
            "slot_id": request.slot_id,
            "patient_id": request.patient_id,
            "note": request.note,
            "sub_queue": request.sub_queue,
        });

        let token: Token = self.emr
            .request(Method::POST, &path, Some(auth_token), Some(body))
            .await
            .map_err(map_emr_error)?;

        self.invalidate_after_mutation().await;

        Ok(token)
    }

    /// Apply a status (and note/sub-queue) update to a token. Transitions
    /// out of a terminal state are refused locally; everything else is the
    /// backend's call.
    pub async fn update_token(
        &self,
        queue_id: Uuid,
        token_id: Uuid,
        request: UpdateTokenRequest,
        auth_token: &str,
    ) -> Result<Token, QueueError> {
        let current = self.get_token(queue_id, token_id, auth_token).await?;

        if current.status.is_terminal() && request.status != current.status {
            return Err(QueueError::InvalidStatusTransition {
                from: current.status,
                to: request.status,
            });
        }

        debug!("Updating token {} to {}", token_id, request.status);

        let path = format!(
            "/api/v1/facilities/{}/queues/{}/tokens/{}",
            self.facility_id(), queue_id, token_id
        );
        let body = json!({
            "note": request.note,
            "sub_queue": request.sub_queue,
            "status": request.status,
        });

        let token: Token = self.emr
            .request(Method::PUT, &path, Some(auth_token), Some(body))
            .await
            .map_err(map_emr_error)?;

        self.invalidate_after_mutation().await;

        Ok(token)
    }

    /// Administrative cancel. Distinct from normal completion and only
    /// available while the token is still open.
    pub async fn cancel_token(
        &self,
        queue_id: Uuid,
        token_id: Uuid,
        auth_token: &str,
    ) -> Result<(), QueueError> {
        let current = self.get_token(queue_id, token_id, auth_token).await?;

        if !current.can_close() {
            return Err(QueueError::TokenAlreadyClosed);
        }

        debug!("Cancelling token {} on queue {}", token_id, queue_id);

        let path = format!(
            "/api/v1/facilities/{}/queues/{}/tokens/{}/cancel",
            self.facility_id(), queue_id, token_id
        );

        let _: serde_json::Value = self.emr
            .request(Method::POST, &path, Some(auth_token), None)
            .await
            .map_err(map_emr_error)?;

        self.invalidate_after_mutation().await;

        Ok(())
    }

    /// Token mutations change queue contents and slot allocation counts, so
    /// both key families are dropped.
    async fn invalidate_after_mutation(&self) {
        self.state.cache.invalidate_prefix("tokens:").await;
        self.state.cache.invalidate_prefix("slots:").await;
    }
}

fn map_emr_error(e: EmrError) -> QueueError {
    match e {
        EmrError::NotFound(_) => QueueError::QueueNotFound,
        other => QueueError::Backend(other.to_string()),
    }
}
