use async_trait::async_trait;

use ac_core::{Plan, Result, DEFAULT_ENTITY_LIMIT};

use super::{distinct_targets, ExecutionContext, StrategyStep};

/// Most frequent entities across the targets, or the whole corpus.
pub struct FindCommonEntitiesStep;

#[async_trait]
impl StrategyStep for FindCommonEntitiesStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let urls = distinct_targets(plan);
        let ranked = ctx
            .articles
            .top_entities(&urls, DEFAULT_ENTITY_LIMIT, ctx.cancel)
            .await?;
        if ranked.is_empty() {
            return Ok("No entities found in the stored articles.".to_string());
        }

        let scope = if urls.is_empty() {
            "all stored articles".to_string()
        } else {
            format!("{} selected articles", urls.len())
        };
        let lines = ranked
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {} ({} mentions)", i + 1, e.entity, e.count))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Most commonly discussed entities across {scope}:\n\n{lines}"))
    }
}
