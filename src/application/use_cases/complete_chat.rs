use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::CompletionClient;
use crate::domain::{ChatRequest, DomainError, ModelCatalog, WireMessage};

/// Served in place of an upstream reply when the upstream call fails.
pub const DEGRADED_REPLY: &str = "I'm having trouble reaching the language model right now. \
Please try again in a moment.";

/// Served alongside `error` when the request could not be handled at all.
pub const INTERNAL_FAILURE_REPLY: &str = "Sorry, something went wrong while processing your \
message. Please try again.";

/// Result of a completion request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub content: String,
    /// True when `content` is [`DEGRADED_REPLY`] rather than model output.
    pub degraded: bool,
}

/// Server side of `/api/chat`: validates the envelope, resolves the model and
/// performs one non-streaming upstream completion.
///
/// Upstream failures never surface as errors. They are logged and answered
/// with [`DEGRADED_REPLY`] so the caller always has renderable content. Only
/// request-shape problems, unknown models and a missing credential are
/// returned as `Err`.
pub struct CompleteChatUseCase {
    client: Arc<dyn CompletionClient>,
    catalog: ModelCatalog,
}

impl CompleteChatUseCase {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            catalog: ModelCatalog::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Decode a raw request body. A body that is not JSON at all is an
    /// internal failure; a JSON body with the wrong shape is a validation
    /// failure.
    pub fn parse_request(body: &[u8]) -> Result<ChatRequest, DomainError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| DomainError::internal(format!("Failed to parse request body: {}", e)))?;
        Self::validate(value)
    }

    pub fn validate(value: Value) -> Result<ChatRequest, DomainError> {
        let messages = match value.get("messages") {
            None | Some(Value::Null) => {
                return Err(DomainError::validation("messages are required"));
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value::<WireMessage>(item.clone()).map_err(|e| {
                        DomainError::validation(format!("invalid message at index {}: {}", i, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(DomainError::validation("messages must be an array")),
        };

        let model = value
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::validation("model is required"))?;

        Ok(ChatRequest::new(messages, model))
    }

    pub async fn execute(&self, request: ChatRequest) -> Result<CompletionOutcome, DomainError> {
        let upstream_model = self.catalog.resolve(&request.model)?;

        if !self.client.has_credentials() {
            return Err(DomainError::configuration("API key not configured"));
        }

        info!(
            "Completing {} messages with {} ({} via {})",
            request.messages.len(),
            request.model,
            upstream_model,
            self.client.provider_name()
        );
        let start_time = Instant::now();

        match self.client.complete(upstream_model, &request.messages).await {
            Ok(content) => {
                info!(
                    "Completion finished in {:.2?} ({} chars)",
                    start_time.elapsed(),
                    content.len()
                );
                Ok(CompletionOutcome {
                    content,
                    degraded: false,
                })
            }
            Err(e) => {
                warn!(
                    "Upstream completion with {} failed: {}. Serving degraded reply.",
                    upstream_model, e
                );
                debug!(
                    "Fallback models for {} (not tried): {:?}",
                    request.model,
                    self.catalog.fallbacks(&request.model)
                );
                Ok(CompletionOutcome {
                    content: DEGRADED_REPLY.to_string(),
                    degraded: true,
                })
            }
        }
    }
}
