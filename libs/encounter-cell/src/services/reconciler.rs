// libs/encounter-cell/src/services/reconciler.rs
//
// Composes the encounter/appointment/token close mutations into one batch
// call and interprets the per-item results. Atomicity is whatever the
// backend implements behind the batch endpoint; this side only assembles
// the requests and correlates the outcomes by reference id.
use serde_json::json;
use tracing::warn;

use shared_database::batch::{BatchRequestEntry, BatchResponse};

use crate::error::EncounterError;
use crate::models::{Appointment, CloseAction, Encounter};

pub const REF_ENCOUNTER_CLOSED: &str = "encounter-closed";
pub const REF_APPOINTMENT_CLOSED: &str = "appointment-closed";
pub const REF_TOKEN_CLOSED: &str = "token-closed";

fn encounter_entry(encounter: &Encounter) -> BatchRequestEntry {
    BatchRequestEntry {
        url: format!("/api/v1/encounters/{}", encounter.id),
        method: "PUT".to_string(),
        reference_id: REF_ENCOUNTER_CLOSED.to_string(),
        body: json!({ "status": "completed" }),
    }
}

fn appointment_entry(appointment: &Appointment) -> BatchRequestEntry {
    BatchRequestEntry {
        url: format!("/api/v1/appointments/{}", appointment.id),
        method: "PUT".to_string(),
        reference_id: REF_APPOINTMENT_CLOSED.to_string(),
        body: json!({ "status": "fulfilled" }),
    }
}

fn token_entry(appointment: &Appointment, facility_id: &str) -> Option<BatchRequestEntry> {
    appointment.token.as_ref().map(|token| BatchRequestEntry {
        url: format!(
            "/api/v1/facilities/{}/queues/{}/tokens/{}",
            facility_id, token.queue_id, token.id
        ),
        method: "PUT".to_string(),
        reference_id: REF_TOKEN_CLOSED.to_string(),
        body: json!({ "status": "FULFILLED" }),
    })
}

/// Build the batch for one triggering action.
///
/// `mark_as_complete` always carries the encounter mutation, adds the
/// appointment close while the appointment is still open, and adds the
/// token close only when the appointment has an associated token - not
/// every encounter is tied to a scheduling token.
pub fn compose_close_batch(
    action: CloseAction,
    facility_id: &str,
    encounter: &Encounter,
    appointment: Option<&Appointment>,
) -> Result<Vec<BatchRequestEntry>, EncounterError> {
    match action {
        CloseAction::MarkAsComplete => {
            let mut entries = vec![encounter_entry(encounter)];

            if let Some(appointment) = appointment {
                if appointment.can_close() {
                    entries.push(appointment_entry(appointment));
                }
                if let Some(entry) = token_entry(appointment, facility_id) {
                    entries.push(entry);
                }
            }

            Ok(entries)
        }
        CloseAction::CloseAppointment => {
            let appointment = appointment.ok_or(EncounterError::NoLinkedAppointment)?;
            if !appointment.can_close() {
                return Err(EncounterError::AppointmentAlreadyClosed);
            }
            Ok(vec![appointment_entry(appointment)])
        }
        CloseAction::CloseToken => {
            let appointment = appointment.ok_or(EncounterError::NoLinkedAppointment)?;
            let entry = token_entry(appointment, facility_id)
                .ok_or(EncounterError::NoLinkedToken)?;
            Ok(vec![entry])
        }
    }
}

/// Pick the success message by precedence over the successful reference
/// ids: encounter > appointment > token. A failed sub-item simply drops
/// its message; it is logged but not surfaced as a hard error.
pub fn interpret_results(response: &BatchResponse) -> Option<&'static str> {
    for failed in response.failed_entries() {
        warn!(
            "Batch item {} failed with status {}",
            failed.reference_id, failed.status_code
        );
    }

    if response.succeeded(REF_ENCOUNTER_CLOSED) {
        Some("Encounter marked as complete")
    } else if response.succeeded(REF_APPOINTMENT_CLOSED) {
        Some("Appointment closed")
    } else if response.succeeded(REF_TOKEN_CLOSED) {
        Some("Token closed")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, AppointmentToken, EncounterStatus};
    use chrono::Utc;
    use shared_database::batch::BatchResultEntry;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn encounter() -> Encounter {
        Encounter {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_id: Some(Uuid::new_v4()),
            status: EncounterStatus::InProgress,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn appointment(status: AppointmentStatus, with_token: bool) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            token_slot_id: Uuid::new_v4(),
            status,
            token: with_token.then(|| AppointmentToken {
                id: Uuid::new_v4(),
                queue_id: Uuid::new_v4(),
                number: 12,
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn result_entry(reference_id: &str, status_code: u16) -> BatchResultEntry {
        BatchResultEntry {
            reference_id: reference_id.to_string(),
            status_code,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_mark_complete_with_appointment_and_token_composes_three_entries() {
        let appointment = appointment(AppointmentStatus::CheckedIn, true);

        let entries = compose_close_batch(
            CloseAction::MarkAsComplete,
            "facility-1",
            &encounter(),
            Some(&appointment),
        )
        .unwrap();

        assert_eq!(entries.len(), 3);

        let reference_ids: HashSet<&str> =
            entries.iter().map(|e| e.reference_id.as_str()).collect();
        assert_eq!(reference_ids.len(), 3);
        assert!(reference_ids.contains(REF_ENCOUNTER_CLOSED));
        assert!(reference_ids.contains(REF_APPOINTMENT_CLOSED));
        assert!(reference_ids.contains(REF_TOKEN_CLOSED));
    }

    #[test]
    fn test_mark_complete_without_token_composes_two_entries() {
        let appointment = appointment(AppointmentStatus::Booked, false);

        let entries = compose_close_batch(
            CloseAction::MarkAsComplete,
            "facility-1",
            &encounter(),
            Some(&appointment),
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.reference_id != REF_TOKEN_CLOSED));
    }

    #[test]
    fn test_mark_complete_without_appointment_composes_encounter_only() {
        let entries =
            compose_close_batch(CloseAction::MarkAsComplete, "facility-1", &encounter(), None)
                .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reference_id, REF_ENCOUNTER_CLOSED);
        assert_eq!(entries[0].method, "PUT");
    }

    #[test]
    fn test_mark_complete_skips_already_fulfilled_appointment() {
        let appointment = appointment(AppointmentStatus::Fulfilled, true);

        let entries = compose_close_batch(
            CloseAction::MarkAsComplete,
            "facility-1",
            &encounter(),
            Some(&appointment),
        )
        .unwrap();

        // Encounter and token only: the appointment close would be a no-op.
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.reference_id != REF_APPOINTMENT_CLOSED));
    }

    #[test]
    fn test_close_fulfilled_appointment_refused() {
        let appointment = appointment(AppointmentStatus::Fulfilled, false);

        let result = compose_close_batch(
            CloseAction::CloseAppointment,
            "facility-1",
            &encounter(),
            Some(&appointment),
        );

        assert!(matches!(result, Err(EncounterError::AppointmentAlreadyClosed)));
    }

    #[test]
    fn test_close_token_requires_linked_token() {
        let appointment = appointment(AppointmentStatus::Booked, false);

        let result = compose_close_batch(
            CloseAction::CloseToken,
            "facility-1",
            &encounter(),
            Some(&appointment),
        );

        assert!(matches!(result, Err(EncounterError::NoLinkedToken)));
    }

    #[test]
    fn test_token_entry_addresses_facility_queue_token_path() {
        let appointment = appointment(AppointmentStatus::Booked, true);
        let token = appointment.token.as_ref().unwrap();

        let entries = compose_close_batch(
            CloseAction::CloseToken,
            "facility-1",
            &encounter(),
            Some(&appointment),
        )
        .unwrap();

        let expected = format!(
            "/api/v1/facilities/facility-1/queues/{}/tokens/{}",
            token.queue_id, token.id
        );
        assert_eq!(entries[0].url, expected);
    }

    #[test]
    fn test_encounter_message_takes_precedence() {
        let response = BatchResponse {
            results: vec![
                result_entry(REF_TOKEN_CLOSED, 200),
                result_entry(REF_APPOINTMENT_CLOSED, 200),
                result_entry(REF_ENCOUNTER_CLOSED, 200),
            ],
        };

        assert_eq!(interpret_results(&response), Some("Encounter marked as complete"));
    }

    #[test]
    fn test_failed_encounter_falls_back_to_appointment_message() {
        let response = BatchResponse {
            results: vec![
                result_entry(REF_ENCOUNTER_CLOSED, 500),
                result_entry(REF_APPOINTMENT_CLOSED, 200),
            ],
        };

        assert_eq!(interpret_results(&response), Some("Appointment closed"));
    }

    #[test]
    fn test_all_items_failed_yields_no_message() {
        let response = BatchResponse {
            results: vec![
                result_entry(REF_ENCOUNTER_CLOSED, 500),
                result_entry(REF_TOKEN_CLOSED, 409),
            ],
        };

        assert_eq!(interpret_results(&response), None);
    }
}
