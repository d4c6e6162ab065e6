//! Gemini `generateContent` backend.
//!
//! Speaks the Google AI Studio REST API with an API key passed as a query
//! parameter. HTTP 429 and `RESOURCE_EXHAUSTED` errors are reported as
//! [`ClientError::QuotaExceeded`]; everything else is [`ClientError::Other`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::client::{ClientError, ModelClient};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.model
        )
    }
}

impl From<&Config> for GeminiConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    #[tracing::instrument(skip_all, fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn classify(&self, prompt: &str) -> Result<String, ClientError> {
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let response = self
            .http_client
            .post(self.config.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Other(format!("Network error: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Other(format!("Failed to read response: {e}")))?;
        tracing::debug!(%status, body_len = text.len(), "Gemini response received");

        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| ClientError::Other(format!("Failed to parse response JSON: {e}")))?;

        extract_text(&json)
    }
}

fn map_http_error(status: StatusCode, body: &str) -> ClientError {
    let (message, api_status) = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
        .map(|error| {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            let api_status = error
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string);
            (message, api_status)
        })
        .unwrap_or_default();

    let message = message.unwrap_or_else(|| truncate(body.trim(), 400));

    let exhausted = api_status.as_deref() == Some("RESOURCE_EXHAUSTED");
    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        ClientError::QuotaExceeded(format!("HTTP {}: {message}", status.as_u16()))
    } else {
        ClientError::Other(format!("HTTP {}: {message}", status.as_u16()))
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: &Value) -> Result<String, ClientError> {
    let parts = response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            let reason = response
                .get("candidates")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("finishReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            ClientError::Other(format!("Response has no content ({reason})"))
        })?;

    Ok(parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".into(),
            model: "gemini-2.5-flash".into(),
            base_url: server.uri(),
            api_version: "v1beta".into(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "[{\"log_id\": 1," },
                            { "text": " \"tags\": []}]" }
                        ]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).classify("Log 1: hello").await.unwrap();
        assert_eq!(text, "[{\"log_id\": 1, \"tags\": []}]");
    }

    #[tokio::test]
    async fn too_many_requests_is_quota_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Quota exceeded",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).classify("x").await.unwrap_err();
        assert!(matches!(err, ClientError::QuotaExceeded(ref m) if m.contains("Quota exceeded")));
    }

    #[tokio::test]
    async fn server_error_is_other() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).classify("x").await.unwrap_err();
        assert!(
            matches!(err, ClientError::Other(ref m) if m.contains("HTTP 500: upstream exploded"))
        );
    }

    #[test]
    fn blocked_response_reports_finish_reason() {
        let blocked = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = extract_text(&blocked).unwrap_err();
        assert!(matches!(err, ClientError::Other(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn resource_exhausted_without_429_is_quota() {
        let body = r#"{"error": {"message": "daily limit", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            map_http_error(StatusCode::FORBIDDEN, body),
            ClientError::QuotaExceeded(_)
        ));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let config = GeminiConfig {
            api_key: String::new(),
            model: "m".into(),
            base_url: "https://example.test/".into(),
            api_version: "v1".into(),
            request_timeout: Duration::from_secs(1),
        };
        assert_eq!(config.endpoint(), "https://example.test/v1/models/m:generateContent");
    }
}
