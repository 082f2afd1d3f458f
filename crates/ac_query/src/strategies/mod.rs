//! One strategy per intent, each wrapped in the shared validate/format step.

use async_trait::async_trait;
use std::collections::HashSet;

use ac_core::{Article, CancellationToken, Error, Intent, Plan, Result};

use crate::service::ArticleService;

pub mod compare;
pub mod entities;
pub mod find_topic;
pub mod keywords;
pub mod sentiment;
pub mod summarize;

pub use compare::{CompareKind, CompareStep};
pub use entities::FindCommonEntitiesStep;
pub use find_topic::FindByTopicStep;
pub use keywords::KeywordsStep;
pub use sentiment::{describe_sentiment, SentimentStep};
pub use summarize::SummarizeStep;

pub const ANSWER_PREFIX: &str = "🤖 Here is your answer:\n\n";
pub const INVALID_PLAN: &str = "invalid plan provided";

/// Everything a strategy may touch while answering one request.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub articles: &'a ArticleService,
    pub cancel: &'a CancellationToken,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(articles: &'a ArticleService, cancel: &'a CancellationToken) -> Self {
        Self { articles, cancel }
    }
}

#[async_trait]
pub trait Strategy: Send + Sync {
    fn intent(&self) -> Intent;

    async fn execute(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String>;
}

/// The intent-specific part of a strategy.
#[async_trait]
pub trait StrategyStep: Send + Sync {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String>;
}

/// Validates the plan, runs the step, then prefixes its answer. Step
/// failures come back as `Error::Strategy` tagged with the intent.
pub struct TemplateStrategy<S> {
    intent: Intent,
    step: S,
}

impl<S: StrategyStep> TemplateStrategy<S> {
    pub fn new(intent: Intent, step: S) -> Self {
        Self { intent, step }
    }
}

#[async_trait]
impl<S: StrategyStep> Strategy for TemplateStrategy<S> {
    fn intent(&self) -> Intent {
        self.intent
    }

    async fn execute(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        if plan.intent == Intent::Unknown {
            return Ok(INVALID_PLAN.to_string());
        }
        tracing::debug!(intent = %self.intent, targets = plan.targets.len(), "running strategy");
        let answer = self
            .step
            .run(plan, ctx)
            .await
            .map_err(|e| Error::strategy(self.intent, e))?;
        Ok(format!("{ANSWER_PREFIX}{answer}"))
    }
}

/// Distinct non-blank targets in plan order.
pub(crate) fn distinct_targets(plan: &Plan) -> Vec<String> {
    let mut seen = HashSet::new();
    plan.target_urls()
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// Look up every distinct target, returning the stored articles and the
/// URLs that had none.
pub(crate) async fn resolve_targets(
    plan: &Plan,
    ctx: &ExecutionContext<'_>,
) -> Result<(Vec<Article>, Vec<String>)> {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for url in distinct_targets(plan) {
        match ctx.articles.get_article(&url, ctx.cancel).await? {
            Some(article) => found.push(article),
            None => missing.push(url),
        }
    }
    Ok((found, missing))
}
