// libs/encounter-cell/tests/close_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::{method, path}};

use encounter_cell::error::EncounterError;
use encounter_cell::models::CloseAction;
use encounter_cell::services::encounter::EncounterService;
use shared_config::AppConfig;
use shared_database::state::AppState;

struct TestSetup {
    state: Arc<AppState>,
    mock_server: MockServer,
    auth_token: String,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;

        let config = AppConfig {
            emr_api_url: mock_server.uri(),
            emr_api_key: String::new(),
            jwt_secret: "test-secret".to_string(),
            facility_id: Uuid::new_v4().to_string(),
        };

        Self {
            state: Arc::new(AppState::new(config)),
            mock_server,
            auth_token: "test_token".to_string(),
        }
    }

    fn service(&self) -> EncounterService {
        EncounterService::new(self.state.clone())
    }
}

fn encounter_json(encounter_id: Uuid, appointment_id: Option<Uuid>, status: &str) -> serde_json::Value {
    json!({
        "id": encounter_id,
        "patient_id": Uuid::new_v4(),
        "appointment_id": appointment_id,
        "status": status,
        "created_at": "2026-03-02T08:00:00Z",
        "updated_at": "2026-03-02T08:30:00Z"
    })
}

fn appointment_json(appointment_id: Uuid, status: &str, with_token: bool) -> serde_json::Value {
    let token = if with_token {
        json!({
            "id": Uuid::new_v4(),
            "queue_id": Uuid::new_v4(),
            "number": 9
        })
    } else {
        serde_json::Value::Null
    };

    json!({
        "id": appointment_id,
        "patient_id": Uuid::new_v4(),
        "token_slot_id": Uuid::new_v4(),
        "status": status,
        "token": token,
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-02T08:00:00Z"
    })
}

fn batch_results(entries: &[(&str, u16)]) -> serde_json::Value {
    json!({
        "results": entries.iter().map(|(reference_id, status_code)| json!({
            "reference_id": reference_id,
            "status_code": status_code,
            "data": {}
        })).collect::<Vec<_>>()
    })
}

async fn mount_encounter(setup: &TestSetup, encounter_id: Uuid, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/encounters/{}", encounter_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&setup.mock_server)
        .await;
}

async fn mount_appointment(setup: &TestSetup, appointment_id: Uuid, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/appointments/{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&setup.mock_server)
        .await;
}

#[tokio::test]
async fn test_mark_complete_closes_all_three_resources() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_encounter(&setup, encounter_id, encounter_json(encounter_id, Some(appointment_id), "in_progress")).await;
    mount_appointment(&setup, appointment_id, appointment_json(appointment_id, "checked_in", true)).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_results(&[
            ("encounter-closed", 200),
            ("appointment-closed", 200),
            ("token-closed", 200),
        ])))
        .mount(&setup.mock_server)
        .await;

    let outcome = setup.service()
        .close(encounter_id, CloseAction::MarkAsComplete, &setup.auth_token)
        .await
        .unwrap();

    assert_eq!(outcome.message.as_deref(), Some("Encounter marked as complete"));
    assert_eq!(outcome.succeeded.len(), 3);
    assert!(outcome.failed.is_empty());
}

#[tokio::test]
async fn test_mark_complete_on_completed_encounter_refused() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();

    mount_encounter(&setup, encounter_id, encounter_json(encounter_id, None, "completed")).await;

    let result = setup.service()
        .close(encounter_id, CloseAction::MarkAsComplete, &setup.auth_token)
        .await;

    assert_matches!(result, Err(EncounterError::EncounterAlreadyCompleted));
}

#[tokio::test]
async fn test_partial_failure_drops_message_but_reports_refs() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_encounter(&setup, encounter_id, encounter_json(encounter_id, Some(appointment_id), "in_progress")).await;
    mount_appointment(&setup, appointment_id, appointment_json(appointment_id, "booked", false)).await;

    // Encounter update rejected, appointment close applied.
    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_results(&[
            ("encounter-closed", 409),
            ("appointment-closed", 200),
        ])))
        .mount(&setup.mock_server)
        .await;

    let outcome = setup.service()
        .close(encounter_id, CloseAction::MarkAsComplete, &setup.auth_token)
        .await
        .unwrap();

    assert_eq!(outcome.message.as_deref(), Some("Appointment closed"));
    assert_eq!(outcome.succeeded, vec!["appointment-closed".to_string()]);
    assert_eq!(outcome.failed, vec!["encounter-closed".to_string()]);
}

#[tokio::test]
async fn test_batch_failure_keeps_cached_snapshots() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/encounters/{}", encounter_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            encounter_json(encounter_id, None, "in_progress"),
        ))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&setup.mock_server)
        .await;

    let service = setup.service();

    let result = service
        .close(encounter_id, CloseAction::MarkAsComplete, &setup.auth_token)
        .await;
    assert_matches!(result, Err(EncounterError::Backend(_)));

    // No speculative invalidation: the snapshot is still served from cache.
    let encounter = service.get_encounter(encounter_id, &setup.auth_token).await.unwrap();
    assert_eq!(encounter.id, encounter_id);
}

#[tokio::test]
async fn test_batch_success_invalidates_encounter_snapshot() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/encounters/{}", encounter_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            encounter_json(encounter_id, None, "in_progress"),
        ))
        .expect(2)
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batch_results(&[
            ("encounter-closed", 200),
        ])))
        .mount(&setup.mock_server)
        .await;

    let service = setup.service();

    service
        .close(encounter_id, CloseAction::MarkAsComplete, &setup.auth_token)
        .await
        .unwrap();

    // Post-mutation read refetches instead of trusting the stale snapshot.
    service.get_encounter(encounter_id, &setup.auth_token).await.unwrap();
}

#[tokio::test]
async fn test_close_appointment_requires_link() {
    let setup = TestSetup::new().await;
    let encounter_id = Uuid::new_v4();

    mount_encounter(&setup, encounter_id, encounter_json(encounter_id, None, "in_progress")).await;

    let result = setup.service()
        .close(encounter_id, CloseAction::CloseAppointment, &setup.auth_token)
        .await;

    assert_matches!(result, Err(EncounterError::NoLinkedAppointment));
}
