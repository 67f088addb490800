use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::emr::{EmrClient, EmrError};

/// One mutation inside a batch call. The `reference_id` is assigned by the
/// caller and echoed back by the backend so results can be matched to intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequestEntry {
    pub url: String,
    pub method: String,
    pub reference_id: String,
    pub body: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResultEntry {
    pub reference_id: String,
    pub status_code: u16,
    #[serde(default)]
    pub data: Value,
}

impl BatchResultEntry {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResultEntry>,
}

impl BatchResponse {
    /// Set-membership test over the successful reference ids.
    pub fn succeeded(&self, reference_id: &str) -> bool {
        self.results
            .iter()
            .any(|r| r.reference_id == reference_id && r.is_success())
    }

    pub fn failed_entries(&self) -> impl Iterator<Item = &BatchResultEntry> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

impl EmrClient {
    /// Submit a set of independent mutations as one batch call. Per-item
    /// atomicity is whatever the backend implements behind this endpoint.
    pub async fn submit_batch(
        &self,
        entries: Vec<BatchRequestEntry>,
        auth_token: &str,
    ) -> Result<BatchResponse, EmrError> {
        debug!("Submitting batch with {} requests", entries.len());

        let body = serde_json::json!({ "requests": entries });

        self.request(
            Method::POST,
            "/api/v1/batch",
            Some(auth_token),
            Some(body),
        ).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_entry(reference_id: &str, status_code: u16) -> BatchResultEntry {
        BatchResultEntry {
            reference_id: reference_id.to_string(),
            status_code,
            data: Value::Null,
        }
    }

    #[test]
    fn test_succeeded_checks_status_class() {
        let response = BatchResponse {
            results: vec![
                result_entry("encounter-closed", 200),
                result_entry("appointment-closed", 409),
            ],
        };

        assert!(response.succeeded("encounter-closed"));
        assert!(!response.succeeded("appointment-closed"));
        assert!(!response.succeeded("token-closed"));
    }

    #[test]
    fn test_failed_entries_filter() {
        let response = BatchResponse {
            results: vec![
                result_entry("encounter-closed", 201),
                result_entry("token-closed", 500),
            ],
        };

        let failed: Vec<&str> = response
            .failed_entries()
            .map(|r| r.reference_id.as_str())
            .collect();
        assert_eq!(failed, vec!["token-closed"]);
    }
}
