use crate::domain::DomainError;

/// A logical model name and the upstream identifiers it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub alias: &'static str,
    pub upstream_id: &'static str,
    /// Ordered alternatives for the same alias. Not tried by the completion
    /// path; only reported when a degraded reply is served.
    pub fallbacks: &'static [&'static str],
}

const DEFAULT_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        alias: "mistral",
        upstream_id: "mistralai/mistral-7b-instruct:free",
        fallbacks: &[
            "mistralai/mistral-small-3.1-24b-instruct:free",
            "mistralai/mistral-nemo:free",
        ],
    },
    ModelEntry {
        alias: "llama",
        upstream_id: "meta-llama/llama-3.3-70b-instruct:free",
        fallbacks: &["meta-llama/llama-3.2-3b-instruct:free"],
    },
    ModelEntry {
        alias: "gemma",
        upstream_id: "google/gemma-3-27b-it:free",
        fallbacks: &["google/gemma-3-12b-it:free"],
    },
    ModelEntry {
        alias: "deepseek",
        upstream_id: "deepseek/deepseek-chat-v3-0324:free",
        fallbacks: &["deepseek/deepseek-r1:free"],
    },
];

/// Static lookup from logical model names to upstream model identifiers.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: &'static [ModelEntry],
}

impl ModelCatalog {
    pub fn new(entries: &'static [ModelEntry]) -> Self {
        Self { entries }
    }

    pub fn resolve(&self, alias: &str) -> Result<&'static str, DomainError> {
        self.entry(alias)
            .map(|e| e.upstream_id)
            .ok_or_else(|| DomainError::invalid_model(alias))
    }

    pub fn fallbacks(&self, alias: &str) -> &'static [&'static str] {
        self.entry(alias).map(|e| e.fallbacks).unwrap_or(&[])
    }

    pub fn entries(&self) -> &'static [ModelEntry] {
        self.entries
    }

    fn entry(&self, alias: &str) -> Option<&'static ModelEntry> {
        self.entries.iter().find(|e| e.alias == alias)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES)
    }
}
