use async_trait::async_trait;

use ac_core::{Plan, Result};

use super::{ExecutionContext, StrategyStep};

pub const TOPIC_SEARCH_LIMIT: usize = 3;

/// Finds the closest articles for the plan's topic and has the model
/// answer from them.
pub struct FindByTopicStep;

#[async_trait]
impl StrategyStep for FindByTopicStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let Some(topic) = plan.topic() else {
            return Ok("Please specify a topic to search for.".to_string());
        };

        let hits = ctx
            .articles
            .discover(&topic, TOPIC_SEARCH_LIMIT, ctx.cancel)
            .await?;
        if hits.is_empty() {
            return Ok(format!("No articles found discussing '{topic}'."));
        }

        let prompt = ctx.articles.prompts().find_topic(&topic, &hits)?;
        let synthesis = ctx.articles.generate(&prompt, ctx.cancel).await?;
        let listing = hits
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {} ({})", i + 1, a.title, a.url))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Found {} articles discussing '{topic}':\n{listing}\n\n{synthesis}",
            hits.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ArticleService;
    use crate::strategies::test_support::{article, service_with};
    use ac_core::{
        Article, ArticleStore, CancellationToken, Error, Intent, Timeouts, VectorIndex,
    };
    use ac_inference::models::ScriptedModel;
    use ac_inference::PromptFactory;
    use ac_storage::MemoryStore;
    use std::sync::Arc;

    struct BrokenIndex;

    #[async_trait]
    impl VectorIndex for BrokenIndex {
        async fn index_article(&self, _article: &Article) -> Result<()> {
            Ok(())
        }

        async fn search_similar(&self, _query: &str, _limit: usize) -> Result<Vec<Article>> {
            Err(Error::Persistence("index unreachable".into()))
        }
    }

    fn plan(topic: &str) -> Plan {
        Plan::new(Intent::FindByTopic).with_parameters([topic])
    }

    #[tokio::test]
    async fn synthesizes_from_search_hits() {
        let model = Arc::new(ScriptedModel::new().then_reply("They agree on targets."));
        let service = service_with(
            &[
                article("https://a.test/1", "Climate summit ends", "Leaders met on climate."),
                article("https://a.test/2", "Cup final report", "A football match."),
            ],
            model.clone(),
        )
        .await;
        let cancel = CancellationToken::new();
        let answer = FindByTopicStep
            .run(&plan("climate"), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Found "));
        assert!(answer.contains("1. Climate summit ends (https://a.test/1)"));
        assert!(answer.ends_with("They agree on targets."));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn no_hits_is_a_message_without_model_call() {
        let model = Arc::new(ScriptedModel::new());
        let service = service_with(&[], model.clone()).await;
        let cancel = CancellationToken::new();
        let answer = FindByTopicStep
            .run(&plan("quantum"), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "No articles found discussing 'quantum'.");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn search_failure_falls_back_to_keywords() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(&article("https://a.test/1", "Rates rise again", "Central bank rates."))
            .await
            .unwrap();
        let service = ArticleService::new(
            store,
            Arc::new(BrokenIndex),
            Arc::new(ScriptedModel::new().then_reply("Rates went up.")),
            Arc::new(PromptFactory::builtin()),
            Timeouts::default(),
        );
        let cancel = CancellationToken::new();
        let answer = FindByTopicStep
            .run(&plan("rates"), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.contains("Rates rise again"));
    }

    #[tokio::test]
    async fn missing_topic_asks_for_one() {
        let service = service_with(&[], Arc::new(ScriptedModel::new())).await;
        let cancel = CancellationToken::new();
        let answer = FindByTopicStep
            .run(&Plan::new(Intent::FindByTopic), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "Please specify a topic to search for.");
    }
}
