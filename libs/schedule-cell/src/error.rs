use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot {slot_id} has a malformed availability reference")]
    MalformedAvailability { slot_id: Uuid },

    #[error("EMR backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
