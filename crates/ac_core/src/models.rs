use async_trait::async_trait;
use std::fmt;

use crate::Result;

/// Text returned by a generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync + fmt::Debug {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Run one prompt and return the model's text
    async fn generate_content(&self, prompt: &str) -> Result<Generation>;
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Generate embeddings for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;
}
