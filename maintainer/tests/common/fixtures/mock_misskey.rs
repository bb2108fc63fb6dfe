//! Mock Misskey server for testing note delivery
//!
//! Wraps a wiremock server answering `POST /api/notes/create` so tests can
//! inspect the exact payloads and headers the notifier sends.

use maintainer::services::MisskeySettings;
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_TARGET_USER: &str = "9operator";

pub struct MockMisskeyServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockMisskeyServer {
    pub async fn start() -> Self {
        let server = MockServer::builder().start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Settings pointing the notifier at this server
    pub fn settings(&self) -> MisskeySettings {
        MisskeySettings {
            api_base: self.base_url.clone(),
            token: TEST_TOKEN.to_string(),
            target_user_id: Some(TEST_TARGET_USER.to_string()),
        }
    }

    /// Accept notes carrying the expected bearer token
    pub async fn mock_success(&self) {
        Mock::given(method("POST"))
            .and(path("/api/notes/create"))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "createdNote": { "id": "9xyz" }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path("/api/notes/create"))
            .respond_with(
                ResponseTemplate::new(status_code).set_body_json(json!({
                    "error": { "code": "RATE_LIMIT_EXCEEDED" }
                })),
            )
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every note received so far
    pub async fn received_notes(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|req| req.body_json::<Value>().ok())
            .collect()
    }
}
