use async_trait::async_trait;

use crate::domain::{DomainError, WireMessage};

/// Sends a conversation history to an upstream chat-completion API and
/// returns the assistant's reply text.
///
/// Implementors encapsulate transport, authentication and vendor-specific
/// payloads. The completion use case stays decoupled from any particular
/// provider or HTTP client library.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a single non-streaming completion from `model`.
    async fn complete(&self, model: &str, messages: &[WireMessage]) -> Result<String, DomainError>;

    /// Whether a usable (non-blank) credential is configured.
    fn has_credentials(&self) -> bool;

    fn provider_name(&self) -> &str;
}
