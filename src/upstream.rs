use async_trait::async_trait;
use std::time::Duration;
use crate::error::{GatewayError, Result};
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, UpstreamErrorBody};

// Error codes the completion API uses for credential problems
const AUTH_CODES: &[&str] = &["invalid_api_key", "invalid_authentication"];
const QUOTA_CODES: &[&str] = &["insufficient_quota", "billing_hard_limit_reached"];

/// A chat completion provider. One call, no retries.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

// OpenAI-compatible HTTP backend
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream {
                status: e.status().map_or(500, |s| s.as_u16()),
                message: format!("Failed to generate content: {}", e),
            })?;

        let status = res.status();
        if !status.is_success() {
            // body is best-effort, classification falls back to the status
            let body = res.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        res.json::<ChatCompletionResponse>()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(format!("Parse Error: {}", e)))
    }
}

/// Maps a non-success upstream reply onto the error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default();

    let message = detail
        .message
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!("OpenAI API error: {}", m))
        .unwrap_or_else(|| "OpenAI API error".to_string());

    let codes = [detail.code.as_deref(), detail.kind.as_deref()];
    let has_code = |known: &[&str]| codes.iter().flatten().any(|c| known.contains(c));

    if has_code(AUTH_CODES) {
        GatewayError::Auth(message)
    } else if has_code(QUOTA_CODES) {
        GatewayError::Quota(message)
    } else {
        GatewayError::Upstream { status, message }
    }
}
