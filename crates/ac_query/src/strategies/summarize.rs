use async_trait::async_trait;

use ac_core::{Error, Plan, Result};

use super::{ExecutionContext, StrategyStep};

/// Returns the summary produced at ingestion time.
pub struct SummarizeStep;

#[async_trait]
impl StrategyStep for SummarizeStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let Some(url) = plan.target_urls().next() else {
            return Ok("Please specify which article you want to summarize.".to_string());
        };
        let article = ctx
            .articles
            .get_article(url, ctx.cancel)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no stored article for {url}")))?;
        let summary = article
            .summary_text()
            .ok_or_else(|| Error::NotFound(format!("no summary stored for {url}")))?;
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{article, service};
    use ac_core::{Article, CancellationToken, Intent};

    #[tokio::test]
    async fn returns_stored_summary() {
        let service = service(&[article("https://a.test/1", "One", "Short summary")]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Summarize).with_targets(["https://a.test/1"]);
        let answer = SummarizeStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "Short summary");
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Summarize).with_targets(["https://a.test/missing"]);
        let err = SummarizeStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("https://a.test/missing"));
    }

    #[tokio::test]
    async fn missing_summary_is_not_found() {
        let service = service(&[Article::new("https://a.test/2", "No summary")]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Summarize).with_targets(["https://a.test/2"]);
        let err = SummarizeStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn no_target_asks_for_one() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let answer = SummarizeStep
            .run(&Plan::new(Intent::Summarize), &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.starts_with("Please specify"));
    }
}
