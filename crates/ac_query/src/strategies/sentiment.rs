use async_trait::async_trait;

use ac_core::{Plan, Result};

use super::{distinct_targets, ExecutionContext, StrategyStep};

/// Coarse label for a stored sentiment such as `"0.40 (positive)"`,
/// `"-0.8"` or `"negative"`. Unrecognised text is returned unchanged.
pub fn describe_sentiment(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "Unknown".to_string();
    }
    let score_part = raw.split(" (").next().unwrap_or(raw).trim();
    if let Some(score) = score_part.parse::<f64>().ok().filter(|s| s.is_finite()) {
        return bucket(score).to_string();
    }
    match raw.to_lowercase().as_str() {
        "positive" | "pos" => "Positive".to_string(),
        "negative" | "neg" => "Negative".to_string(),
        "neutral" | "neu" => "Neutral".to_string(),
        _ => raw.to_string(),
    }
}

fn bucket(score: f64) -> &'static str {
    let score = (score * 10.0).round() / 10.0;
    if score >= 0.7 {
        "Very Positive"
    } else if score >= 0.5 {
        "Somewhat Positive"
    } else if score > 0.0 {
        "Slightly Positive"
    } else if score == 0.0 {
        "Neutral"
    } else if score >= -0.2 {
        "Slightly Negative"
    } else if score >= -0.6 {
        "Somewhat Negative"
    } else {
        "Very Negative"
    }
}

/// Reports each target's stored sentiment; unknown URLs are listed, not fatal.
pub struct SentimentStep;

#[async_trait]
impl StrategyStep for SentimentStep {
    async fn run(&self, plan: &Plan, ctx: &ExecutionContext<'_>) -> Result<String> {
        let targets = distinct_targets(plan);
        if targets.is_empty() {
            return Ok("Please specify which article you want to analyze sentiment for.".to_string());
        }

        let mut lines = Vec::with_capacity(targets.len());
        let mut found = 0usize;
        for (i, url) in targets.iter().enumerate() {
            let n = i + 1;
            match ctx.articles.get_article(url, ctx.cancel).await? {
                None => lines.push(format!("Article {n}: Could not find article at {url}")),
                Some(article) => {
                    found += 1;
                    match article.sentiment_label() {
                        Some(label) => lines.push(format!(
                            "Article {n}: '{}' - Sentiment: {label} ({})",
                            article.title,
                            describe_sentiment(label)
                        )),
                        None => lines.push(format!(
                            "Article {n}: '{}' - Sentiment analysis not available",
                            article.title
                        )),
                    }
                }
            }
        }

        if found == 0 {
            return Ok("No articles found for sentiment analysis.".to_string());
        }
        Ok(format!("Sentiment Analysis Results:\n\n{}", lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{article, service};
    use ac_core::{CancellationToken, Intent};

    #[test]
    fn numeric_scores_map_to_seven_buckets() {
        assert_eq!(describe_sentiment("0.90 (positive)"), "Very Positive");
        assert_eq!(describe_sentiment("0.7"), "Very Positive");
        assert_eq!(describe_sentiment("0.55 (positive)"), "Somewhat Positive");
        assert_eq!(describe_sentiment("0.40 (positive)"), "Slightly Positive");
        assert_eq!(describe_sentiment("0.0"), "Neutral");
        assert_eq!(describe_sentiment("0.02 (neutral)"), "Neutral");
        assert_eq!(describe_sentiment("-0.2"), "Slightly Negative");
        assert_eq!(describe_sentiment("-0.5 (negative)"), "Somewhat Negative");
        assert_eq!(describe_sentiment("-0.95"), "Very Negative");
    }

    #[test]
    fn textual_labels_are_normalised() {
        assert_eq!(describe_sentiment("POSITIVE"), "Positive");
        assert_eq!(describe_sentiment("neg"), "Negative");
        assert_eq!(describe_sentiment("neutral"), "Neutral");
        assert_eq!(describe_sentiment("mixed"), "mixed");
        assert_eq!(describe_sentiment(""), "Unknown");
    }

    #[test]
    fn non_finite_scores_are_not_bucketed() {
        assert_eq!(describe_sentiment("NaN (positive)"), "NaN (positive)");
        assert_eq!(describe_sentiment("inf"), "inf");
        assert_eq!(describe_sentiment("-infinity"), "-infinity");
    }

    #[tokio::test]
    async fn missing_articles_are_reported_individually() {
        let mut stored = article("https://a.test/1", "Upbeat", "s");
        stored.sentiment = Some("0.80 (positive)".into());
        let service = service(&[stored]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Sentiment)
            .with_targets(["https://a.test/1", "https://a.test/missing"]);
        let answer = SentimentStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert!(answer.contains("Article 1: 'Upbeat' - Sentiment: 0.80 (positive) (Very Positive)"));
        assert!(answer.contains("Article 2: Could not find article at https://a.test/missing"));
    }

    #[tokio::test]
    async fn nothing_found_is_a_message() {
        let service = service(&[]).await;
        let cancel = CancellationToken::new();
        let plan = Plan::new(Intent::Sentiment).with_targets(["https://a.test/x"]);
        let answer = SentimentStep
            .run(&plan, &ExecutionContext::new(&service, &cancel))
            .await
            .unwrap();
        assert_eq!(answer, "No articles found for sentiment analysis.");
    }
}
