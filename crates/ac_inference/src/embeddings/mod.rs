//! Text embedders backing the vector index.
//!
//! `HashingEmbedder` is deterministic and needs no network, which makes it
//! the default for local runs and tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ac_core::{EmbeddingModel, Error, Result};

use crate::models::openai::OPENAI_BASE_URL;
use crate::models::OllamaConfig;
use crate::InferenceConfig;

pub const HASHING_DIMENSIONS: usize = 384;
const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const OPENAI_EMBEDDING_DIMENSIONS: usize = 1536;
const OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
const OLLAMA_EMBEDDING_DIMENSIONS: usize = 768;

/// Feature-hashing bag of words, L2 normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingModel for HashingEmbedder {
    fn name(&self) -> &str {
        "Hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: Option<String>, model: Option<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Validation("OpenAI API key is required for embeddings".into()))?;
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model: model.unwrap_or_else(|| OPENAI_EMBEDDING_MODEL.to_string()),
        })
    }
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbedder {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn dimensions(&self) -> usize {
        OPENAI_EMBEDDING_DIMENSIONS
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbeddingRequest {
            input: text,
            model: &self.model,
        };
        let response = self
            .client
            .post(format!("{OPENAI_BASE_URL}/embeddings"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Upstream(format!("OpenAI embeddings request failed: {e}")))?
            .json::<OpenAiEmbeddingResponse>()
            .await
            .map_err(|e| Error::Upstream(format!("OpenAI embeddings response unreadable: {e}")))?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Upstream("OpenAI returned no embedding".into()))
    }
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug)]
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
}

impl OllamaEmbedder {
    pub fn new(mut config: OllamaConfig, model: Option<String>, timeout: Duration) -> Result<Self> {
        config.model_name = model.unwrap_or_else(|| OLLAMA_EMBEDDING_MODEL.to_string());
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            config,
        })
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbedder {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn dimensions(&self) -> usize {
        OLLAMA_EMBEDDING_DIMENSIONS
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: &self.config.model_name,
            prompt: text,
        };
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.config.base_url))
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Upstream(format!("Ollama embeddings request failed: {e}")))?
            .json::<OllamaEmbeddingResponse>()
            .await
            .map_err(|e| Error::Upstream(format!("Ollama embeddings response unreadable: {e}")))?;
        Ok(response.embedding)
    }
}

/// Build the embedder named by `config.embedder`.
pub fn create_embedder(config: &InferenceConfig) -> Result<Arc<dyn EmbeddingModel>> {
    let embedder: Arc<dyn EmbeddingModel> = match config.embedder.trim().to_lowercase().as_str() {
        "hashing" | "" => Arc::new(HashingEmbedder::default()),
        "openai" => Arc::new(OpenAiEmbedder::new(
            config.api_key.clone(),
            None,
            config.request_timeout,
        )?),
        "ollama" => {
            let ollama = OllamaConfig::from_parts(config.model_url.as_deref(), None)?;
            Arc::new(OllamaEmbedder::new(ollama, None, config.request_timeout)?)
        }
        other => return Err(Error::Validation(format!("unsupported embedder: {other}"))),
    };
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::cosine_similarity;

    #[test]
    fn hashing_is_deterministic_and_normalised() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Climate policy in Europe");
        let b = embedder.embed("climate POLICY in europe");
        assert_eq!(a.len(), HASHING_DIMENSIONS);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn related_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("climate policy");
        let related = embedder.embed("new climate policy announced by the government");
        let unrelated = embedder.embed("football match results tonight");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn empty_text_embeds_to_zero() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed("a . !").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn factory_defaults_to_hashing() {
        let embedder = create_embedder(&InferenceConfig::default()).unwrap();
        assert_eq!(embedder.name(), "Hashing");
        assert_eq!(embedder.dimensions(), HASHING_DIMENSIONS);
    }
}
