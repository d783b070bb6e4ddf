use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::application::{ChatTransport, TransportResponse};
use crate::domain::{ChatRequest, DomainError};

pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:3000/api/chat";

/// Posts request envelopes to a `/api/chat` endpoint over HTTP.
///
/// The body is handed back as a chunk stream without buffering so event
/// streams can be ingested as they arrive. No client-level timeout is set;
/// the conversation controller owns the deadline and drops the request when
/// it expires.
pub struct HttpChatTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpChatTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn post(&self, request: &ChatRequest) -> Result<TransportResponse, DomainError> {
        debug!(
            "POST {} ({} messages, model {})",
            self.url,
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| DomainError::transport(format!("failed to read response body: {e}")))
        });

        Ok(TransportResponse {
            status,
            content_type,
            body: Box::pin(body),
        })
    }
}
