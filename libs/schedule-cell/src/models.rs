// libs/schedule-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A named grouping of slots sharing one capacity value, e.g.
/// "Morning Session" with 4 tokens per slot. Bands are defined by the
/// schedule template on the backend and are read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityBand {
    pub id: Uuid,
    pub name: String,
    pub tokens_per_slot: i32,
}

/// A bookable unit of time for a schedulable resource. Capacity is
/// inherited from the parent band; `allocated` counts tokens already
/// issued against this slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSlot {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub availability: AvailabilityBand,
    pub allocated: i32,
}

impl TokenSlot {
    pub fn capacity(&self) -> i32 {
        self.availability.tokens_per_slot
    }

    /// Remaining token capacity, floored at zero. `allocated` should never
    /// exceed capacity, but the count comes from the backend and is not
    /// re-validated here.
    pub fn remaining(&self) -> i32 {
        (self.capacity() - self.allocated).max(0)
    }

    /// Whether a new token may be offered against this slot. Display-level
    /// guard only - the backend remains the booking authority.
    pub fn is_selectable(&self) -> bool {
        self.allocated < self.capacity()
    }
}

/// Grouper output: one availability band with its slots in chronological
/// order and the summed remaining capacity across them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotGroup {
    pub availability: AvailabilityBand,
    pub slots: Vec<TokenSlot>,
    pub remaining_capacity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleResourceType {
    Practitioner,
    Service,
}

impl fmt::Display for ScheduleResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleResourceType::Practitioner => write!(f, "practitioner"),
            ScheduleResourceType::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQueryResponse {
    pub results: Vec<TokenSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayScheduleResponse {
    pub resource_type: ScheduleResourceType,
    pub resource_id: Uuid,
    pub day: NaiveDate,
    pub groups: Vec<SlotGroup>,
}
