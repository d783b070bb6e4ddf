use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{CompleteChatUseCase, CompletionClient};
use crate::connector::adapter::{MockCompletionClient, OpenAiCompatibleClient, DEFAULT_BASE_URL};
use crate::domain::ModelCatalog;

pub struct ContainerConfig {
    /// Answer with the offline echo client instead of calling upstream.
    pub mock_upstream: bool,
    /// Bearer credential for the upstream API. Blank counts as missing.
    pub api_key: Option<String>,
    pub base_url: String,
}

impl ContainerConfig {
    /// Read `CHATRELAY_API_KEY` and `CHATRELAY_BASE_URL` from the environment.
    pub fn from_env(mock_upstream: bool) -> Self {
        Self {
            mock_upstream,
            api_key: std::env::var("CHATRELAY_API_KEY").ok(),
            base_url: std::env::var("CHATRELAY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Process-wide, read-only wiring shared by every request handler.
pub struct Container {
    completion_client: Arc<dyn CompletionClient>,
    catalog: ModelCatalog,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        let completion_client: Arc<dyn CompletionClient> = if config.mock_upstream {
            debug!("Using mock completion client");
            Arc::new(MockCompletionClient::new())
        } else {
            let client = OpenAiCompatibleClient::new(config.api_key, config.base_url);
            debug!("Using upstream completions at {}", client.url());
            Arc::new(client)
        };

        if !completion_client.has_credentials() {
            warn!("CHATRELAY_API_KEY is not set; /api/chat will answer 500 until it is configured");
        }

        Self::with_client(completion_client)
    }

    pub fn with_client(completion_client: Arc<dyn CompletionClient>) -> Self {
        Self {
            completion_client,
            catalog: ModelCatalog::default(),
        }
    }

    pub fn complete_chat_use_case(&self) -> CompleteChatUseCase {
        CompleteChatUseCase::new(self.completion_client.clone()).with_catalog(self.catalog.clone())
    }

    pub fn provider_name(&self) -> &str {
        self.completion_client.provider_name()
    }
}
