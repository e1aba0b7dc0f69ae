use async_trait::async_trait;
use serde::Deserialize;

use super::types::CompletionRequest;
use super::BackendError;
use crate::config::CompletionEndpoint;

/// Longest slice of an error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 200;

/// One OpenAI-compatible chat-completion call against a single model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, BackendError>;
}

/// HTTP client for OpenRouter (or any endpoint speaking the same protocol).
pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: CompletionEndpoint,
}

impl OpenRouterClient {
    /// Build a pooled client whose per-request timeout is the endpoint timeout.
    pub fn new(endpoint: CompletionEndpoint) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, BackendError> {
        if api_key.is_empty() {
            return Err(BackendError::MissingCredential);
        }

        let response = self
            .client
            .post(&self.endpoint.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.endpoint.referer)
            .header("X-Title", &self.endpoint.title)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.endpoint.timeout.as_secs())
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.endpoint.timeout.as_secs())
            } else {
                BackendError::Transport(e.to_string())
            }
        })?;

        let parsed: CompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::MalformedPayload(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| BackendError::MalformedPayload("no message content".into()))
    }
}
