use std::sync::Arc;
use chrono::Utc;
use url::Url;

use ac_core::{
    guarded, Article, ArticleStore, CancellationToken, ContentFetcher, Error, Result, Timeouts,
    VectorIndex,
};

use crate::analyzer::{Analysis, Analyzer};

/// Single entry point for turning a URL into a stored, indexed article.
pub struct IngestionFacade {
    store: Arc<dyn ArticleStore>,
    index: Arc<dyn VectorIndex>,
    fetcher: Arc<dyn ContentFetcher>,
    analyzer: Analyzer,
    timeouts: Timeouts,
}

impl IngestionFacade {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        index: Arc<dyn VectorIndex>,
        fetcher: Arc<dyn ContentFetcher>,
        analyzer: Analyzer,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            store,
            index,
            fetcher,
            analyzer,
            timeouts,
        }
    }

    /// Fetch, analyse, persist and index a new article.
    ///
    /// Fails with `Duplicate` when the URL is already stored, either at the
    /// upfront check or when the store rejects the insert. Analysis failures
    /// fall back to a default summary; indexing failures are only logged.
    pub async fn add_new_article(&self, url: &str, cancel: &CancellationToken) -> Result<Article> {
        let url = validate_url(url)?;
        tracing::info!(%url, "ingesting article");

        let existing = guarded(
            cancel,
            self.timeouts.store(),
            "article lookup",
            self.store.find_by_url(&url),
        )
        .await?;
        if existing.is_some() {
            return Err(Error::Duplicate(url));
        }

        let content = guarded(cancel, self.timeouts.fetch(), "article fetch", self.fetcher.fetch(&url))
            .await
            .map_err(|e| match e {
                Error::Fetch(_) | Error::Cancelled(_) => e,
                other => Error::Fetch(format!("fetcher failed for {url}: {other}")),
            })?;

        let mut article = Article {
            url: url.clone(),
            title: content.title,
            excerpt: content.excerpt,
            full_text: content.text,
            summary: None,
            sentiment: None,
            topics: Vec::new(),
            entities: Vec::new(),
            processed_at: Utc::now(),
        };

        let analysis = match self.analyzer.analyze(&article, cancel).await {
            Ok(analysis) => analysis,
            Err(Error::Cancelled(op)) => return Err(Error::Cancelled(op)),
            Err(e) => {
                tracing::warn!(%url, error = %e, "initial analysis failed, using fallback summary");
                Analysis::fallback(&article)
            }
        };
        analysis.apply(&mut article);

        guarded(cancel, self.timeouts.store(), "article save", self.store.save(&article)).await?;

        // The article is committed; indexing below is best-effort and must not
        // be skipped because the caller went away.
        let detached = CancellationToken::new();
        if let Err(e) = guarded(
            &detached,
            self.timeouts.store(),
            "article indexing",
            self.index.index_article(&article),
        )
        .await
        {
            let degraded = Error::Degraded(format!("vector indexing failed for {url}: {e}"));
            tracing::warn!(error = %degraded, "search results may be incomplete");
        }

        tracing::info!(%url, title = %article.title, "article stored");
        Ok(article)
    }
}

fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("url is required".into()));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::Validation(format!("invalid url {trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Validation(format!(
            "unsupported url scheme {}",
            parsed.scheme()
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::{EntityCount, FetchedContent};
    use ac_inference::models::ScriptedModel;
    use ac_inference::PromptFactory;
    use ac_storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedContent> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedContent {
                title: format!("Fetch {n} of {url}"),
                excerpt: "An excerpt.".into(),
                text: "Full body text.".into(),
            })
        }
    }

    struct BrokenFetcher;

    #[async_trait]
    impl ContentFetcher for BrokenFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedContent> {
            Err(Error::Fetch(format!("connection refused for {url}")))
        }
    }

    #[derive(Default)]
    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn index_article(&self, _article: &Article) -> Result<()> {
            Err(Error::Persistence("index offline".into()))
        }

        async fn search_similar(&self, _query: &str, _limit: usize) -> Result<Vec<Article>> {
            Err(Error::Persistence("index offline".into()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ArticleStore for FailingStore {
        async fn save(&self, _article: &Article) -> Result<()> {
            Err(Error::Persistence("disk full".into()))
        }

        async fn find_by_url(&self, _url: &str) -> Result<Option<Article>> {
            Ok(None)
        }

        async fn find_all(&self) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }

        async fn find_top_entities(&self, _urls: &[String], _limit: usize) -> Result<Vec<EntityCount>> {
            Ok(Vec::new())
        }
    }

    const ANALYSIS_REPLY: &str = r#"{"headline":"Headline","key_points":["Point"],"sentiment":"0.20 (positive)","entities":["Acme"]}"#;

    fn facade(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn ContentFetcher>,
        model: ScriptedModel,
    ) -> IngestionFacade {
        let analyzer = Analyzer::new(
            Arc::new(model),
            Arc::new(PromptFactory::builtin()),
            Timeouts::default(),
        );
        IngestionFacade::new(
            store,
            Arc::new(FailingIndex),
            fetcher,
            analyzer,
            Timeouts::default(),
        )
    }

    #[tokio::test]
    async fn ingesting_same_url_twice_is_duplicate_without_overwrite() {
        let store = Arc::new(MemoryStore::new());
        let facade = facade(
            store.clone(),
            Arc::new(StaticFetcher::new()),
            ScriptedModel::new().with_fallback(ANALYSIS_REPLY),
        );
        let cancel = CancellationToken::new();

        let first = facade
            .add_new_article("https://news.test/a", &cancel)
            .await
            .unwrap();
        assert_eq!(first.url, "https://news.test/a");
        assert_eq!(first.summary.as_deref(), Some("Headline\n- Point"));
        assert_eq!(first.entities, vec!["Acme"]);

        let second = facade.add_new_article("https://news.test/a", &cancel).await;
        assert!(matches!(second, Err(Error::Duplicate(ref u)) if u == "https://news.test/a"));

        let stored = store.find_by_url("https://news.test/a").await.unwrap().unwrap();
        assert_eq!(stored.title, first.title);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn store_conflict_is_the_authoritative_duplicate() {
        struct RacingStore(MemoryStore);

        #[async_trait]
        impl ArticleStore for RacingStore {
            async fn save(&self, article: &Article) -> Result<()> {
                self.0.save(article).await
            }
            // Always misses, as if a concurrent ingestion had not committed yet.
            async fn find_by_url(&self, _url: &str) -> Result<Option<Article>> {
                Ok(None)
            }
            async fn find_all(&self) -> Result<Vec<Article>> {
                self.0.find_all().await
            }
            async fn find_top_entities(&self, urls: &[String], limit: usize) -> Result<Vec<EntityCount>> {
                self.0.find_top_entities(urls, limit).await
            }
        }

        let facade = facade(
            Arc::new(RacingStore(MemoryStore::new())),
            Arc::new(StaticFetcher::new()),
            ScriptedModel::new().with_fallback(ANALYSIS_REPLY),
        );
        let cancel = CancellationToken::new();
        facade.add_new_article("https://news.test/race", &cancel).await.unwrap();
        let err = facade
            .add_new_article("https://news.test/race", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn analysis_failure_still_ingests_with_fallback() {
        let store = Arc::new(MemoryStore::new());
        let facade = facade(
            store.clone(),
            Arc::new(StaticFetcher::new()),
            ScriptedModel::new().then_fail("provider down"),
        );
        let article = facade
            .add_new_article("https://news.test/b", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(article.sentiment.as_deref(), Some("neutral"));
        assert!(article.summary.unwrap().ends_with("\n- An excerpt."));
        assert!(article.entities.is_empty());
        assert!(store.find_by_url("https://news.test/b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unparseable_analysis_uses_fallback() {
        let facade = facade(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticFetcher::new()),
            ScriptedModel::new().then_reply("not json at all"),
        );
        let article = facade
            .add_new_article("https://news.test/c", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(article.sentiment.as_deref(), Some("neutral"));
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_and_nothing_is_stored() {
        let store = Arc::new(MemoryStore::new());
        let facade = facade(store.clone(), Arc::new(BrokenFetcher), ScriptedModel::new());
        let err = facade
            .add_new_article("https://news.test/d", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_aborts_ingestion() {
        let facade = facade(
            Arc::new(FailingStore),
            Arc::new(StaticFetcher::new()),
            ScriptedModel::new().with_fallback(ANALYSIS_REPLY),
        );
        let err = facade
            .add_new_article("https://news.test/e", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ac_core::ErrorKind::Persistence);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_fetching() {
        let fetcher = Arc::new(StaticFetcher::new());
        let facade = facade(Arc::new(MemoryStore::new()), fetcher.clone(), ScriptedModel::new());
        let cancel = CancellationToken::new();
        for bad in ["", "not a url", "ftp://files.test/a"] {
            let err = facade.add_new_article(bad, &cancel).await.unwrap_err();
            assert_eq!(err.kind(), ac_core::ErrorKind::Validation, "{bad}");
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_request_does_not_store() {
        let store = Arc::new(MemoryStore::new());
        let facade = facade(store.clone(), Arc::new(StaticFetcher::new()), ScriptedModel::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = facade.add_new_article("https://news.test/f", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ac_core::ErrorKind::Cancelled);
        assert!(store.is_empty());
    }
}
