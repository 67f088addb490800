// libs/encounter-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// ENCOUNTER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    Planned,
    InProgress,
    OnHold,
    Completed,
}

impl fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterStatus::Planned => write!(f, "planned"),
            EncounterStatus::InProgress => write!(f, "in_progress"),
            EncounterStatus::OnHold => write!(f, "on_hold"),
            EncounterStatus::Completed => write!(f, "completed"),
        }
    }
}

/// The clinical visit record. The appointment link is optional: walk-in
/// encounters have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub status: EncounterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Encounter {
    /// Whether mark-as-complete may be offered. The backend is the
    /// authority on the actual transition.
    pub fn can_complete(&self) -> bool {
        self.status != EncounterStatus::Completed
    }
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    CheckedIn,
    Fulfilled,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::CheckedIn => write!(f, "checked_in"),
            AppointmentStatus::Fulfilled => write!(f, "fulfilled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// The queue token attached to an appointment, carried inline so the close
/// flow can address the token mutation without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentToken {
    pub id: Uuid,
    pub queue_id: Uuid,
    pub number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub token_slot_id: Uuid,
    pub status: AppointmentStatus,
    pub token: Option<AppointmentToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Idempotence guard: closing an already-fulfilled appointment is not
    /// offered, rather than silently re-sent.
    pub fn can_close(&self) -> bool {
        self.status != AppointmentStatus::Fulfilled
    }
}

// ==============================================================================
// CLOSE FLOW MODELS
// ==============================================================================

/// The user action triggering the close reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseAction {
    MarkAsComplete,
    CloseAppointment,
    CloseToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseRequest {
    pub action: CloseAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub message: Option<String>,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment_with_status(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            token_slot_id: Uuid::new_v4(),
            status,
            token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_fulfilled_appointment_cannot_be_closed_again() {
        assert!(!appointment_with_status(AppointmentStatus::Fulfilled).can_close());
        assert!(appointment_with_status(AppointmentStatus::Booked).can_close());
        assert!(appointment_with_status(AppointmentStatus::CheckedIn).can_close());
    }

    #[test]
    fn test_completed_encounter_cannot_be_completed_again() {
        let encounter = Encounter {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_id: None,
            status: EncounterStatus::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!encounter.can_complete());
    }
}
