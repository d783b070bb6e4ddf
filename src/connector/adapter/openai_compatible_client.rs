use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::CompletionClient;
use crate::domain::{DomainError, WireMessage};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const COMPLETIONS_PATH: &str = "/chat/completions";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;
/// Must stay below the client-side conversation deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(50);

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for OpenAI-compatible chat-completion APIs (OpenRouter,
/// Mistral, LM Studio, ...), authenticated with a bearer token.
///
/// Always requests a single non-streaming completion with fixed sampling
/// parameters.
///
/// ```text
/// CHATRELAY_BASE_URL=https://openrouter.ai/api/v1
/// CHATRELAY_API_KEY=sk-or-...
/// ```
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    api_key: Option<String>,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompatibleClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH);
        Self {
            client: http_client(REQUEST_TIMEOUT),
            api_key,
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(
                "Failed to build upstream HTTP client ({}); requests will have no {:?} timeout",
                e, timeout
            );
            reqwest::Client::new()
        })
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, model: &str, messages: &[WireMessage]) -> Result<String, DomainError> {
        let api_key = self
            .api_key()
            .ok_or_else(|| DomainError::configuration("API key not configured"))?;

        let request = ApiRequest {
            model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Upstream returned {status}: {body}");
            return Err(DomainError::upstream(format!("API returned {status}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::upstream(format!("failed to parse response: {e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::upstream("response contained no completion choice"))?;

        debug!("Upstream reply: {} chars", content.len());
        Ok(content)
    }

    fn has_credentials(&self) -> bool {
        self.api_key().is_some()
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }
}
