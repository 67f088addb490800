use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncounterError {
    #[error("Encounter not found")]
    EncounterNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Encounter has no linked appointment")]
    NoLinkedAppointment,

    #[error("Appointment has no associated token")]
    NoLinkedToken,

    #[error("Appointment is already closed")]
    AppointmentAlreadyClosed,

    #[error("Encounter is already completed")]
    EncounterAlreadyCompleted,

    #[error("EMR backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
