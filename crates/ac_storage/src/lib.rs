use std::sync::Arc;

use ac_core::{ArticleStore, EmbeddingModel, Error, Result, VectorIndex};

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IndexBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub store: StoreBackend,
    pub database_url: String,
    pub index: IndexBackend,
    pub qdrant_url: String,
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: "sqlite:articles.db".to_string(),
            index: IndexBackend::Memory,
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "articles".to_string(),
        }
    }
}

#[allow(dead_code)]
fn feature_missing(backend: &str, feature: &str) -> Error {
    Error::Validation(format!(
        "{backend} backend is not compiled in; rebuild with --features {feature}"
    ))
}

pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn ArticleStore>> {
    match config.store {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.database_url).await?)),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => Err(feature_missing("sqlite", "sqlite")),
    }
}

pub async fn create_index(
    config: &StorageConfig,
    embedder: Arc<dyn EmbeddingModel>,
) -> Result<Arc<dyn VectorIndex>> {
    match config.index {
        IndexBackend::Memory => Ok(Arc::new(MemoryVectorIndex::new(embedder))),
        #[cfg(feature = "qdrant")]
        IndexBackend::Qdrant => Ok(Arc::new(
            QdrantIndex::connect(&config.qdrant_url, config.collection.clone(), embedder).await?,
        )),
        #[cfg(not(feature = "qdrant"))]
        IndexBackend::Qdrant => {
            let _ = embedder;
            Err(feature_missing("qdrant", "qdrant"))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_index, create_store, IndexBackend, StorageConfig, StoreBackend};
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::Article;
    use ac_inference::embeddings::HashingEmbedder;

    #[tokio::test]
    async fn default_config_builds_memory_backends() {
        let config = StorageConfig::default();
        let store = create_store(&config).await.unwrap();
        let index = create_index(&config, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        let article = Article::new("https://a.test/1", "Memory backends");
        store.save(&article).await.unwrap();
        index.index_article(&article).await.unwrap();
        assert_eq!(index.search_similar("memory backends", 3).await.unwrap().len(), 1);
    }
}
