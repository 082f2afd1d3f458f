use std::sync::Arc;

use serde::Serialize;

use ac_core::{CancellationToken, Error, Result};

use crate::cache::{plan_key, query_key, ResponseCache, CACHE_PREFIX};
use crate::executor::Executor;
use crate::planner::Planner;
use crate::service::ArticleService;
use crate::strategies::ExecutionContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub cached: bool,
}

impl ChatAnswer {
    fn fresh(answer: String) -> Self {
        Self {
            answer,
            cached: false,
        }
    }

    fn from_cache(answer: &str) -> Self {
        Self {
            answer: format!("{CACHE_PREFIX}{answer}"),
            cached: true,
        }
    }
}

/// The chat request path: cache, planner, executor, cache.
pub struct ChatService {
    articles: Arc<ArticleService>,
    planner: Planner,
    executor: Executor,
    cache: Arc<ResponseCache>,
}

impl ChatService {
    pub fn new(articles: Arc<ArticleService>, cache: Arc<ResponseCache>) -> Self {
        Self {
            planner: Planner::new(articles.clone()),
            executor: Executor::new(),
            articles,
            cache,
        }
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn articles(&self) -> &Arc<ArticleService> {
        &self.articles
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn answer(&self, query: &str, cancel: &CancellationToken) -> Result<ChatAnswer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("query must not be empty".into()));
        }

        let by_query = query_key(query);
        if let Some(hit) = self.cache.get(&by_query) {
            tracing::debug!("query cache hit");
            return Ok(ChatAnswer::from_cache(&hit));
        }

        let plan = self.planner.create_plan(query, cancel).await?;
        let by_plan = plan_key(&plan);
        if let Some(hit) = self.cache.get(&by_plan) {
            tracing::debug!(intent = %plan.intent, "plan cache hit");
            self.cache.set(by_query, hit.clone());
            return Ok(ChatAnswer::from_cache(&hit));
        }

        let ctx = ExecutionContext::new(&self.articles, cancel);
        let answer = self.executor.execute_plan(&plan, &ctx).await?;
        self.cache.set(by_plan, answer.clone());
        self.cache.set(by_query, answer.clone());
        Ok(ChatAnswer::fresh(answer))
    }
}
