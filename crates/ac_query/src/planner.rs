use std::sync::Arc;

use ac_core::{Article, CancellationToken, Error, PlanStage, Plan, Result};
use ac_inference::parse_json;

use crate::service::ArticleService;

/// Number of similar articles shown to the model as planning context.
pub const CONTEXT_LIMIT: usize = 5;

/// Turns a user question into a [`Plan`] with a single model call.
pub struct Planner {
    articles: Arc<ArticleService>,
    context_limit: usize,
}

impl Planner {
    pub fn new(articles: Arc<ArticleService>) -> Self {
        Self {
            articles,
            context_limit: CONTEXT_LIMIT,
        }
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub async fn create_plan(&self, query: &str, cancel: &CancellationToken) -> Result<Plan> {
        let context = self.context(query, cancel).await?;

        let prompt = self
            .articles
            .prompts()
            .planner(query, &context)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build planner prompt");
                Error::planning(PlanStage::Prompt, e)
            })?;
        tracing::debug!(context = context.len(), prompt_chars = prompt.len(), "planner prompt ready");

        let reply = match self.articles.generate(&prompt, cancel).await {
            Ok(reply) => reply,
            Err(Error::Cancelled(op)) => return Err(Error::Cancelled(op)),
            Err(e) => {
                tracing::error!(error = %e, model = self.articles.model_name(), "planner model call failed");
                return Err(Error::planning(PlanStage::Generate, e));
            }
        };

        let plan: Plan = parse_json(&reply).map_err(|e| {
            tracing::error!(error = %e, "failed to parse plan from model reply");
            tracing::debug!(reply = %reply, "unparseable planner reply");
            Error::planning(PlanStage::Parse, e)
        })?;

        let plan = plan.with_question(query);
        tracing::info!(
            intent = %plan.intent,
            targets = plan.targets.len(),
            parameters = plan.parameters.len(),
            "plan created"
        );
        Ok(plan)
    }

    /// Similar articles, or the whole corpus when search fails or finds nothing.
    async fn context(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<Article>> {
        match self.articles.search(query, self.context_limit, cancel).await {
            Ok(hits) if !hits.is_empty() => return Ok(hits),
            Ok(_) => tracing::debug!("no similar articles, using the full corpus as context"),
            Err(Error::Cancelled(op)) => return Err(Error::Cancelled(op)),
            Err(e) => tracing::warn!(error = %e, "context search failed, using the full corpus"),
        }
        match self.articles.all_articles(cancel).await {
            Ok(all) => Ok(all),
            Err(Error::Cancelled(op)) => Err(Error::Cancelled(op)),
            Err(e) => Err(Error::planning(PlanStage::Context, e)),
        }
    }
}
