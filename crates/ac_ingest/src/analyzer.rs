use serde::Deserialize;
use std::sync::Arc;

use ac_core::{guarded, Article, CancellationToken, GenerativeModel, Result, Timeouts};
use ac_inference::prompts::{truncate_chars, PromptFactory};
use ac_inference::parse_json;

pub const NEUTRAL_SENTIMENT: &str = "neutral";
const FALLBACK_TEXT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct InitialAnalysis {
    headline: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    sentiment: String,
    #[serde(default)]
    entities: Vec<String>,
}

/// Summary, sentiment and entities derived for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: String,
    pub sentiment: String,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
}

impl Analysis {
    /// Deterministic stand-in used when the model call or its parse fails.
    pub fn fallback(article: &Article) -> Self {
        let detail = if !article.excerpt.trim().is_empty() {
            article.excerpt.trim().to_string()
        } else {
            truncate_chars(article.full_text.trim(), FALLBACK_TEXT_CHARS)
        };
        let summary = if detail.is_empty() {
            article.title.clone()
        } else {
            format!("{}\n- {}", article.title, detail)
        };
        Self {
            summary,
            sentiment: NEUTRAL_SENTIMENT.to_string(),
            topics: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn apply(self, article: &mut Article) {
        article.summary = Some(self.summary);
        article.sentiment = Some(self.sentiment);
        article.topics = self.topics;
        article.entities = self.entities;
    }

    fn from_reply(reply: InitialAnalysis) -> Self {
        let points: Vec<&str> = reply
            .key_points
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        let headline = reply.headline.trim();
        let summary = if points.is_empty() {
            headline.to_string()
        } else {
            format!("{}\n- {}", headline, points.join("\n- "))
        };
        let sentiment = match reply.sentiment.trim() {
            "" => NEUTRAL_SENTIMENT.to_string(),
            s => s.to_string(),
        };
        let entities: Vec<String> = reply
            .entities
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            summary,
            sentiment,
            topics: entities.clone(),
            entities,
        }
    }
}

/// Runs the single analysis call made while ingesting an article.
#[derive(Debug, Clone)]
pub struct Analyzer {
    model: Arc<dyn GenerativeModel>,
    prompts: Arc<PromptFactory>,
    timeouts: Timeouts,
}

impl Analyzer {
    pub fn new(model: Arc<dyn GenerativeModel>, prompts: Arc<PromptFactory>, timeouts: Timeouts) -> Self {
        Self {
            model,
            prompts,
            timeouts,
        }
    }

    pub async fn analyze(&self, article: &Article, cancel: &CancellationToken) -> Result<Analysis> {
        let prompt = self.prompts.initial_analysis(&article.title, &article.full_text)?;
        tracing::debug!(
            url = %article.url,
            content_chars = article.full_text.len(),
            prompt_chars = prompt.len(),
            estimated_tokens = prompt.len() / 4,
            "analysis prompt built"
        );

        let reply = guarded(
            cancel,
            self.timeouts.generation(),
            "article analysis",
            self.model.generate_content(&prompt),
        )
        .await?;

        let parsed: InitialAnalysis = parse_json(&reply.text).map_err(|e| {
            tracing::debug!(url = %article.url, reply = %reply.text, "unparseable analysis reply");
            e
        })?;
        Ok(Analysis::from_reply(parsed))
    }
}
