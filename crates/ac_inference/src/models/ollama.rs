use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use ac_core::{Error, Generation, GenerativeModel, Result};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "gemma3:12b";

/// Endpoint and model for a local Ollama server.
///
/// `model_url` may carry the model as its path, e.g.
/// `http://localhost:11434/gemma3:12b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model_name: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model_name: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl OllamaConfig {
    pub fn from_parts(model_url: Option<&str>, model_name: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = model_url {
            let parsed = Url::parse(raw)
                .map_err(|e| Error::Validation(format!("invalid Ollama URL {raw}: {e}")))?;
            let host = parsed.host_str().unwrap_or("localhost");
            config.base_url = match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            };
            let path_model = parsed.path().trim_matches('/');
            if !path_model.is_empty() {
                config.model_name = path_model.to_string();
            }
        }
        if let Some(name) = model_name.filter(|n| !n.trim().is_empty()) {
            config.model_name = name.to_string();
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaModel {
    client: Client,
    config: OllamaConfig,
}

impl OllamaModel {
    pub fn new(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            config,
        })
    }
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model_name)
            .finish()
    }
}

#[async_trait]
impl GenerativeModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate_content(&self, prompt: &str) -> Result<Generation> {
        let request = GenerateRequest {
            model: &self.config.model_name,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                Error::Upstream(format!(
                    "Ollama is not available at {}: {}. Please ensure Ollama is running and the model '{}' is installed.",
                    self.config.base_url, e, self.config.model_name
                ))
            })?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Upstream(format!("Ollama returned an unreadable body: {e}")))?;
        Ok(Generation::new(response.response))
    }
}
