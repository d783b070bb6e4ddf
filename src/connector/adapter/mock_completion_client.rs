use async_trait::async_trait;

use crate::application::CompletionClient;
use crate::domain::{DomainError, Role, WireMessage};

/// Offline upstream that echoes the latest user message. Lets the proxy run
/// without a network or credential.
pub struct MockCompletionClient;

impl MockCompletionClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, model: &str, messages: &[WireMessage]) -> Result<String, DomainError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .ok_or_else(|| DomainError::upstream("no user message to answer"))?;

        Ok(format!("[{}] You said: {}", model, last_user.content))
    }

    fn has_credentials(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
