use std::time::Duration;

pub mod embeddings;
pub mod models;
pub mod prompts;
pub mod reply;

/// Provider selection for generation and embeddings.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub provider: String,
    pub model_name: Option<String>,
    pub model_url: Option<String>,
    pub api_key: Option<String>,
    pub embedder: String,
    pub request_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: "dummy".to_string(),
            model_name: None,
            model_url: None,
            api_key: None,
            embedder: "hashing".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl InferenceConfig {
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

pub mod prelude {
    pub use super::embeddings::{create_embedder, HashingEmbedder};
    pub use super::models::{create_model, DummyModel, ScriptedModel};
    pub use super::prompts::PromptFactory;
    pub use super::InferenceConfig;
    pub use ac_core::{EmbeddingModel, Error, GenerativeModel, Result};
}

pub use embeddings::create_embedder;
pub use models::create_model;
pub use prompts::PromptFactory;
pub use reply::{parse_json, strip_code_fences};
