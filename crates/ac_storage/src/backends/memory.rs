use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use ac_core::{
    cosine_similarity, rank_entities, Article, ArticleStore, EmbeddingModel, EntityCount, Error,
    Result, VectorIndex,
};

/// Process-local article store keyed by URL.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: DashMap<String, Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn save(&self, article: &Article) -> Result<()> {
        match self.articles.entry(article.url.clone()) {
            Entry::Occupied(_) => Err(Error::Duplicate(article.url.clone())),
            Entry::Vacant(slot) => {
                slot.insert(article.clone());
                Ok(())
            }
        }
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.articles.get(url).map(|entry| entry.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Article>> {
        let mut articles: Vec<Article> = self.articles.iter().map(|e| e.value().clone()).collect();
        articles.sort_by(|a, b| {
            a.processed_at
                .cmp(&b.processed_at)
                .then_with(|| a.url.cmp(&b.url))
        });
        Ok(articles)
    }

    async fn find_top_entities(&self, urls: &[String], limit: usize) -> Result<Vec<EntityCount>> {
        let articles = self.find_all().await?;
        if urls.is_empty() {
            return Ok(rank_entities(&articles, limit));
        }
        Ok(rank_entities(
            articles.iter().filter(|a| urls.contains(&a.url)),
            limit,
        ))
    }
}

/// Brute-force cosine index over embeddings held in memory.
pub struct MemoryVectorIndex {
    embedder: Arc<dyn EmbeddingModel>,
    entries: RwLock<Vec<(Article, Vec<f32>)>>,
}

impl MemoryVectorIndex {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl fmt::Debug for MemoryVectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryVectorIndex")
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn index_article(&self, article: &Article) -> Result<()> {
        let embedding = self.embedder.generate_embeddings(&article.index_text()).await?;
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.iter_mut().find(|(a, _)| a.url == article.url) {
            *existing = (article.clone(), embedding);
        } else {
            entries.push((article.clone(), embedding));
        }
        Ok(())
    }

    async fn search_similar(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let query = self.embedder.generate_embeddings(query).await?;
        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, &Article)> = entries
            .iter()
            .map(|(article, embedding)| (cosine_similarity(&query, embedding), article))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, article)| article.clone())
            .collect())
    }
}
