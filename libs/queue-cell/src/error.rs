use thiserror::Error;

use crate::models::TokenStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Token not found")]
    TokenNotFound,

    #[error("Queue not found")]
    QueueNotFound,

    #[error("Slot has no remaining token capacity")]
    SlotFull,

    #[error("Invalid token status transition from {from} to {to}")]
    InvalidStatusTransition { from: TokenStatus, to: TokenStatus },

    #[error("Token is already closed")]
    TokenAlreadyClosed,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("EMR backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
