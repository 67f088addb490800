// libs/queue-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// TOKEN LIFECYCLE
// ==============================================================================

/// Token lifecycle states. `Completed` and `Fulfilled` are both terminal;
/// the backend uses them interchangeably depending on which flow closed the
/// token. Cancellation is a separate administrative mutation, not a status
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Created,
    InProgress,
    Completed,
    Fulfilled,
}

impl TokenStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Fulfilled)
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Created => write!(f, "CREATED"),
            TokenStatus::InProgress => write!(f, "IN_PROGRESS"),
            TokenStatus::Completed => write!(f, "COMPLETED"),
            TokenStatus::Fulfilled => write!(f, "FULFILLED"),
        }
    }
}

/// One patient's (or walk-in's) claim on a slot, with a displayable
/// sequence number. A token belongs to exactly one queue and references at
/// most one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub queue_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub number: i32,
    pub status: TokenStatus,
    pub note: Option<String>,
    pub sub_queue: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// Whether the close action may be offered for this token. The backend
    /// is the authority on whether the transition actually succeeds.
    pub fn can_close(&self) -> bool {
        !self.status.is_terminal()
    }
}

// ==============================================================================
// QUEUE READ MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQueue {
    pub id: Uuid,
    pub queue_id: Uuid,
    pub name: String,
}

/// Tokens of one queue fanned out per sub-queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueOverview {
    pub queue_id: Uuid,
    pub sub_queues: Vec<SubQueueTokens>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubQueueTokens {
    pub sub_queue: SubQueue,
    pub tokens: Vec<Token>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub slot_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub note: Option<String>,
    pub sub_queue: Option<Uuid>,
}

/// Body of the token update mutation. `status` is the requested lifecycle
/// value; `note` and `sub_queue` ride along unchanged when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTokenRequest {
    pub note: Option<String>,
    pub sub_queue: Option<Uuid>,
    pub status: TokenStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenListQuery {
    pub sub_queue: Option<Uuid>,
    pub status: Option<TokenStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListResponse {
    pub results: Vec<Token>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueListResponse {
    pub results: Vec<Queue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQueueListResponse {
    pub results: Vec<SubQueue>,
}
