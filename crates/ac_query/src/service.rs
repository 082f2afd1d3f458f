use std::sync::Arc;

use ac_core::{
    guarded, Article, ArticleStore, CancellationToken, EntityCount, Error, GenerativeModel,
    Result, Timeouts, VectorIndex,
};
use ac_inference::PromptFactory;

/// Read-side access to stored articles plus the synthesis model, with
/// every call bounded by the configured timeouts and the caller's token.
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn GenerativeModel>,
    prompts: Arc<PromptFactory>,
    timeouts: Timeouts,
}

impl ArticleService {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerativeModel>,
        prompts: Arc<PromptFactory>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            store,
            index,
            model,
            prompts,
            timeouts,
        }
    }

    pub fn prompts(&self) -> &PromptFactory {
        &self.prompts
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn get_article(&self, url: &str, cancel: &CancellationToken) -> Result<Option<Article>> {
        guarded(cancel, self.timeouts.store(), "article lookup", self.store.find_by_url(url)).await
    }

    pub async fn all_articles(&self, cancel: &CancellationToken) -> Result<Vec<Article>> {
        guarded(cancel, self.timeouts.store(), "article listing", self.store.find_all()).await
    }

    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Article>> {
        guarded(
            cancel,
            self.timeouts.store(),
            "similarity search",
            self.index.search_similar(query, limit),
        )
        .await
    }

    /// Semantic search for `topic`, degrading to keyword matching over the
    /// whole corpus when the index fails.
    pub async fn discover(
        &self,
        topic: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Article>> {
        match self.search(topic, limit, cancel).await {
            Ok(hits) => Ok(hits),
            Err(Error::Cancelled(op)) => Err(Error::Cancelled(op)),
            Err(e) => {
                tracing::warn!(%topic, error = %e, "similarity search failed, matching keywords instead");
                let corpus = self.all_articles(cancel).await?;
                Ok(keyword_matches(&corpus, topic, limit))
            }
        }
    }

    pub async fn top_entities(
        &self,
        urls: &[String],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntityCount>> {
        guarded(
            cancel,
            self.timeouts.store(),
            "entity ranking",
            self.store.find_top_entities(urls, limit),
        )
        .await
    }

    /// One synthesis call; returns the trimmed reply text.
    pub async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let reply = guarded(
            cancel,
            self.timeouts.generation(),
            "model call",
            self.model.generate_content(prompt),
        )
        .await?;
        Ok(reply.text.trim().to_string())
    }
}

/// Articles whose title, summary, topics or entities mention `topic`,
/// either as a phrase or word by word.
pub fn keyword_matches(articles: &[Article], topic: &str, limit: usize) -> Vec<Article> {
    let needle = topic.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = needle.split_whitespace().filter(|w| w.len() >= 3).collect();
    articles
        .iter()
        .filter(|article| {
            let haystack = format!(
                "{} {} {} {}",
                article.title,
                article.summary_text().unwrap_or_default(),
                article.topics.join(" "),
                article.entities.join(" ")
            )
            .to_lowercase();
            haystack.contains(&needle)
                || (!words.is_empty() && words.iter().all(|w| haystack.contains(w)))
        })
        .take(limit)
        .cloned()
        .collect()
}
