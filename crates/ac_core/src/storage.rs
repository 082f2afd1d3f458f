use async_trait::async_trait;

use crate::types::{Article, EntityCount};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new article. A second insert for the same URL fails with
    /// `Error::Duplicate` and leaves the stored record untouched.
    async fn save(&self, article: &Article) -> Result<()>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;

    async fn find_all(&self) -> Result<Vec<Article>>;

    /// Most frequent entities (falling back to topics per article) across
    /// `urls`, or across every article when `urls` is empty. Ordered by
    /// descending count, then ascending entity name.
    async fn find_top_entities(&self, urls: &[String], limit: usize) -> Result<Vec<EntityCount>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn index_article(&self, article: &Article) -> Result<()>;

    /// Articles ranked by semantic closeness to `query`, best first.
    async fn search_similar(&self, query: &str, limit: usize) -> Result<Vec<Article>>;
}
