use async_trait::async_trait;

use ac_core::{Error, Plan, Result};

use super::{ExecutionContext, StrategyStep};

/// Stored topics/entities, or one model call over the stored summary when
/// the article has none.
pub struct KeywordsStep;

#[async_trait]
impl StrategyStep for KeywordsStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let Some(url) = plan.target_urls().next() else {
            return Ok("Please specify which article you want to extract keywords from.".to_string());
        };
        let article = ctx
            .articles
            .get_article(url, ctx.cancel)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no stored article for {url}")))?;

        let terms: Vec<&str> = article
            .ranked_terms()
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !terms.is_empty() {
            return Ok(format!("Keywords for '{}': {}", article.title, terms.join(", ")));
        }

        let Some(summary) = article.summary_text() else {
            return Ok(format!("No keywords are available for '{}' yet.", article.title));
        };
        let prompt = ctx.articles.prompts().keywords(&article.title, summary)?;
        let keywords = ctx.articles.generate(&prompt, ctx.cancel).await?;
        Ok(format!("Keywords for '{}': {}", article.title, keywords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{article, service, service_with};
    use ac_core::{CancellationToken, Intent};
    use ac_inference::models::ScriptedModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn prefers_stored_entities_without_model_call() {
        let mut stored = article("https://a.test/1", "Chips", "Summary");
        stored.entities = vec!["Intel".into(), "TSMC".into()];
        let model = Arc::new(ScriptedModel::new());
        let service = service_with(&[stored], model.clone()).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Keywords).with_targets(["https://a.test/1"]);
        let answer = KeywordsStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "Keywords for 'Chips': Intel, TSMC");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_one_model_call_over_summary() {
        let model = Arc::new(ScriptedModel::new().then_reply(" chips, fabs "));
        let service =
            service_with(&[article("https://a.test/1", "Chips", "About fabs")], model.clone()).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Keywords).with_targets(["https://a.test/1"]);
        let answer = KeywordsStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "Keywords for 'Chips': chips, fabs");
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("About fabs"));
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Keywords).with_targets(["https://a.test/none"]);
        let err = KeywordsStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
