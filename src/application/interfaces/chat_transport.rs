use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::domain::{ChatRequest, DomainError, EVENT_STREAM_CONTENT_TYPE, JSON_CONTENT_TYPE};

/// Response body delivered chunk by chunk as the transport reads it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DomainError>> + Send>>;

/// A reply from the chat endpoint before its body has been consumed.
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn kind(&self) -> ResponseKind {
        ResponseKind::detect(self.content_type.as_deref())
    }

    /// Drain the whole body.
    pub async fn into_bytes(self) -> Result<Vec<u8>, DomainError> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    pub async fn into_text(self) -> Result<String, DomainError> {
        let bytes = self.into_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// How a reply body must be ingested, derived from its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Document,
    EventStream,
    Other(String),
}

impl ResponseKind {
    pub fn detect(content_type: Option<&str>) -> Self {
        let declared = content_type.unwrap_or_default().to_ascii_lowercase();
        if declared.contains(JSON_CONTENT_TYPE) {
            ResponseKind::Document
        } else if declared.contains(EVENT_STREAM_CONTENT_TYPE) {
            ResponseKind::EventStream
        } else {
            ResponseKind::Other(declared)
        }
    }
}

/// Posts a request envelope to the chat endpoint.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post(&self, request: &ChatRequest) -> Result<TransportResponse, DomainError>;
}
