use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use ac_core::{Article, EmbeddingModel, Error, Result, VectorIndex};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "articles";

fn persistence(context: &str, e: impl fmt::Display) -> Error {
    Error::Persistence(format!("{context}: {e}"))
}

/// Stable point id per article URL, so re-indexing overwrites.
pub fn point_id(url: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()).to_string()
}

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn EmbeddingModel>,
}

impl QdrantIndex {
    pub async fn connect(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self> {
        let collection = collection.into();
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| persistence("failed to build qdrant client", e))?;

        let exists = client
            .collection_exists(collection.clone())
            .await
            .map_err(|e| persistence("qdrant is not reachable", e))?;
        if !exists {
            client
                .create_collection(
                    CreateCollectionBuilder::new(&collection).vectors_config(VectorParamsBuilder::new(
                        embedder.dimensions() as u64,
                        Distance::Cosine,
                    )),
                )
                .await
                .map_err(|e| persistence("failed to create qdrant collection", e))?;
            tracing::info!(%collection, dimensions = embedder.dimensions(), "created qdrant collection");
        }

        Ok(Self {
            client,
            collection,
            embedder,
        })
    }
}

impl fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn index_article(&self, article: &Article) -> Result<()> {
        let embedding = self.embedder.generate_embeddings(&article.index_text()).await?;
        let payload = Payload::try_from(json!({
            "url": article.url,
            "title": article.title,
            "doc": serde_json::to_string(article)?,
        }))
        .map_err(|e| persistence("failed to build payload", e))?;

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(
                    &self.collection,
                    vec![PointStruct::new(point_id(&article.url), embedding, payload)],
                )
                .wait(true),
            )
            .await
            .map_err(|e| persistence("failed to upsert point", e))?;
        Ok(())
    }

    async fn search_similar(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let embedding = self.embedder.generate_embeddings(query).await?;
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding, limit as u64).with_payload(true),
            )
            .await
            .map_err(|e| persistence("qdrant search failed", e))?;

        let mut articles = Vec::with_capacity(results.result.len());
        for point in results.result {
            if let Some(doc) = point.payload.get("doc").and_then(|v| v.as_str()) {
                match serde_json::from_str::<Article>(doc) {
                    Ok(article) => articles.push(article),
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable qdrant payload"),
                }
            }
        }
        Ok(articles)
    }
}
