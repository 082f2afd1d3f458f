use std::collections::HashMap;

use ac_core::{Intent, Plan, Result};

use crate::strategies::{
    CompareKind, CompareStep, ExecutionContext, FindByTopicStep, FindCommonEntitiesStep,
    KeywordsStep, SentimentStep, Strategy, SummarizeStep, TemplateStrategy,
};

/// Routes a plan to the strategy registered for its intent.
pub struct Executor {
    strategies: HashMap<Intent, Box<dyn Strategy>>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Registry with one strategy for every concrete intent.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(TemplateStrategy::new(Intent::Summarize, SummarizeStep)) as Box<dyn Strategy>,
            Box::new(TemplateStrategy::new(Intent::Keywords, KeywordsStep)),
            Box::new(TemplateStrategy::new(Intent::Sentiment, SentimentStep)),
            Box::new(TemplateStrategy::new(Intent::FindByTopic, FindByTopicStep)),
            Box::new(TemplateStrategy::new(
                Intent::FindCommonEntities,
                FindCommonEntitiesStep,
            )),
            Box::new(TemplateStrategy::new(
                Intent::CompareTone,
                CompareStep::new(CompareKind::Tone),
            )),
            Box::new(TemplateStrategy::new(
                Intent::ComparePositivity,
                CompareStep::new(CompareKind::Positivity),
            )),
            Box::new(TemplateStrategy::new(
                Intent::CompareMultiple,
                CompareStep::new(CompareKind::Multiple),
            )),
            Box::new(TemplateStrategy::new(
                Intent::CompareAllSentiment,
                CompareStep::new(CompareKind::AllSentiment),
            )),
        ])
    }

    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        let strategies = strategies
            .into_iter()
            .map(|strategy| (strategy.intent(), strategy))
            .collect();
        Self { strategies }
    }

    pub fn handles(&self, intent: Intent) -> bool {
        self.strategies.contains_key(&intent)
    }

    pub async fn execute_plan(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        match self.strategies.get(&plan.intent) {
            Some(strategy) => strategy.execute(plan, ctx).await,
            None => {
                tracing::info!(intent = %plan.intent, "no strategy registered");
                Ok(format!(
                    "I'm sorry, I don't know how to handle the intent: {}",
                    plan.intent
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{article, service};
    use crate::strategies::ANSWER_PREFIX;
    use ac_core::CancellationToken;

    #[test]
    fn registers_every_concrete_intent() {
        let executor = Executor::new();
        for intent in Intent::ALL {
            assert_eq!(executor.handles(intent), intent != Intent::Unknown, "{intent}");
        }
    }

    #[tokio::test]
    async fn unknown_intent_gets_the_fallback_message() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let answer = Executor::new()
            .execute_plan(&Plan::new(Intent::Unknown), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "I'm sorry, I don't know how to handle the intent: UNKNOWN");
    }

    #[tokio::test]
    async fn unregistered_intent_is_not_an_error() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let answer = Executor::empty()
            .execute_plan(&Plan::new(Intent::Keywords), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.ends_with("intent: KEYWORDS"));
    }

    #[tokio::test]
    async fn dispatches_to_the_matching_strategy() {
        let stored = article("https://a.test/1", "Rates", "The bank held rates.");
        let service = service(&[stored]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Summarize).with_targets(["https://a.test/1"]);
        let answer = Executor::new()
            .execute_plan(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with(ANSWER_PREFIX));
        assert!(answer.contains("The bank held rates."));
    }
}
