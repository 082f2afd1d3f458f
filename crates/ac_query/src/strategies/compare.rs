use async_trait::async_trait;

use ac_core::{Article, Plan, Result};

use super::{distinct_targets, resolve_targets, ExecutionContext, StrategyStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    Tone,
    Positivity,
    Multiple,
    AllSentiment,
}

impl CompareKind {
    /// How many articles to discover when the plan names a topic instead
    /// of explicit targets.
    pub fn discovery_limit(self) -> usize {
        match self {
            CompareKind::Tone | CompareKind::Positivity => 3,
            CompareKind::Multiple | CompareKind::AllSentiment => 5,
        }
    }

    fn subject(self) -> &'static str {
        match self {
            CompareKind::Tone => "their tone",
            CompareKind::Positivity => "their positivity",
            CompareKind::Multiple => "them",
            CompareKind::AllSentiment => "their sentiment",
        }
    }
}

/// Comparison over two or more articles: explicit targets, or articles
/// discovered from the plan's topic when no targets were given.
pub struct CompareStep {
    kind: CompareKind,
}

impl CompareStep {
    pub fn new(kind: CompareKind) -> Self {
        Self { kind }
    }

    fn clarification(&self) -> String {
        format!(
            "Please provide at least two articles, or a topic to find articles about, so I can compare {}.",
            self.kind.subject()
        )
    }

    async fn candidates(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<Option<Vec<Article>>> {
        let targets = distinct_targets(plan);
        if targets.len() >= 2 {
            let (found, missing) = resolve_targets(plan, ctx).await?;
            if !missing.is_empty() {
                tracing::debug!(?missing, "comparison targets not stored");
            }
            return Ok(Some(found));
        }
        match (targets.is_empty(), plan.topic()) {
            (true, Some(topic)) => {
                let found = ctx
                    .articles
                    .discover(&topic, self.kind.discovery_limit(), ctx.cancel)
                    .await?;
                Ok(Some(found))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl StrategyStep for CompareStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let Some(articles) = self.candidates(plan, ctx).await? else {
            return Ok(self.clarification());
        };
        if articles.len() < 2 {
            return Ok(format!(
                "Insufficient data: found {} stored article(s), but at least two are needed to compare {}.",
                articles.len(),
                self.kind.subject()
            ));
        }

        let topic = plan.topic();
        let prompts = ctx.articles.prompts();
        let prompt = match self.kind {
            CompareKind::Tone => prompts.compare_tone(&articles)?,
            CompareKind::Positivity => prompts.compare_positivity(topic.as_deref(), &articles)?,
            CompareKind::Multiple => prompts.compare_multiple(topic.as_deref(), &articles)?,
            CompareKind::AllSentiment => prompts.compare_sentiment(topic.as_deref(), &articles)?,
        };
        let analysis = ctx.articles.generate(&prompt, ctx.cancel).await?;

        let listing = articles
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {} ({})", i + 1, a.title, a.url))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Compared {} articles:\n{listing}\n\n{analysis}", articles.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{article, service_with};
    use ac_core::{CancellationToken, Intent};
    use ac_inference::models::ScriptedModel;
    use std::sync::Arc;

    fn corpus() -> Vec<Article> {
        let mut a = article("https://a.test/1", "Markets soar", "Stocks climbed on earnings.");
        a.sentiment = Some("0.80 (positive)".into());
        let mut b = article("https://a.test/2", "Markets slump", "Stocks fell on fears.");
        b.sentiment = Some("-0.60 (negative)".into());
        vec![a, b]
    }

    #[tokio::test]
    async fn compares_explicit_targets_in_one_call() {
        let model = Arc::new(ScriptedModel::new().then_reply("The first is upbeat."));
        let service = service_with(&corpus(), model.clone()).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::ComparePositivity)
            .with_targets(["https://a.test/2", "https://a.test/1"]);
        let answer = CompareStep::new(CompareKind::Positivity)
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Compared 2 articles:\n1. Markets slump"));
        assert!(answer.ends_with("The first is upbeat."));
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("Stocks climbed on earnings."));
    }

    #[tokio::test]
    async fn one_resolvable_target_is_insufficient_data() {
        let model = Arc::new(ScriptedModel::new());
        let service = service_with(&corpus(), model.clone()).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::CompareTone)
            .with_targets(["https://a.test/1", "https://a.test/unknown"]);
        let answer = CompareStep::new(CompareKind::Tone)
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Insufficient data"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_target_counts_once() {
        let service = service_with(&corpus(), Arc::new(ScriptedModel::new())).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::CompareMultiple)
            .with_targets(["https://a.test/1", "https://a.test/1"]);
        let answer = CompareStep::new(CompareKind::Multiple)
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Please provide at least two articles"));
    }

    #[tokio::test]
    async fn discovers_candidates_from_topic() {
        let model = Arc::new(ScriptedModel::new().then_reply("Opinions are split."));
        let service = service_with(&corpus(), model.clone()).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::CompareAllSentiment).with_parameters(["markets stocks"]);
        let answer = CompareStep::new(CompareKind::AllSentiment)
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Compared 2 articles:"));
        assert!(model.prompts()[0].contains("Sentiment: -0.60 (negative)"));
    }

    #[tokio::test]
    async fn nothing_to_compare_asks_for_clarification() {
        let service = service_with(&corpus(), Arc::new(ScriptedModel::new())).await;
        let cancel = CancellationToken::new();
        let answer = CompareStep::new(CompareKind::Tone)
            .run(&Plan::new(Intent::CompareTone), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.contains("their tone"));
    }
}
