use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;

use ac_core::{Generation, GenerativeModel, Intent, Result};

use crate::prompts::{ANALYSIS_HEADER, PLANNER_HEADER};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "growth", "gain", "gains", "success", "successful", "win", "wins", "improve",
    "improved", "record", "strong", "benefit", "positive", "breakthrough", "optimistic", "rise",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "loss", "losses", "fail", "failure", "crisis", "decline", "weak", "risk", "threat",
    "negative", "drop", "fall", "fear", "concern", "war", "crash", "layoffs",
];
const ENTITY_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "And", "But", "For", "With", "From", "Title",
    "Content", "Summary", "Sentiment", "It", "In", "On", "At", "A", "An",
];

/// Offline model that answers planner and analysis prompts with
/// heuristics, so the whole pipeline runs without an API key.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_content(&self, prompt: &str) -> Result<Generation> {
        let text = if prompt.starts_with(PLANNER_HEADER) {
            plan_reply(prompt)
        } else if prompt.starts_with(ANALYSIS_HEADER) {
            analysis_reply(prompt)
        } else {
            extractive_reply(prompt)
        };
        Ok(Generation::new(text))
    }
}

fn plan_reply(prompt: &str) -> String {
    let query = prompt
        .lines()
        .find_map(|line| line.strip_prefix("User query: "))
        .unwrap_or_default();
    let lower = query.to_lowercase();
    let targets = extract_urls(query);
    let intent = classify(&lower);
    let parameters: Vec<String> = topic_after_about(query).into_iter().collect();
    json!({
        "intent": intent.as_str(),
        "targets": targets,
        "parameters": parameters,
    })
    .to_string()
}

fn classify(lower: &str) -> Intent {
    let has = |needle: &str| lower.contains(needle);
    if has("summar") {
        Intent::Summarize
    } else if has("keyword") || has("main topics") {
        Intent::Keywords
    } else if has("entit") || has("most discussed") {
        Intent::FindCommonEntities
    } else if has("compare") && has("sentiment") {
        Intent::CompareAllSentiment
    } else if has("positive") && (has("more") || has("which") || has("compare")) {
        Intent::ComparePositivity
    } else if has("tone") {
        Intent::CompareTone
    } else if has("sentiment") {
        Intent::Sentiment
    } else if has("compare") {
        Intent::CompareMultiple
    } else if has("about") || has("find") || has("articles on") {
        Intent::FindByTopic
    } else {
        Intent::Unknown
    }
}

fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| token.starts_with("http://") || token.starts_with("https://"))
        .map(|token| {
            token
                .trim_end_matches(|c: char| matches!(c, ',' | '.' | '?' | '!' | ')' | ';'))
                .to_string()
        })
        .collect()
}

fn topic_after_about(query: &str) -> Option<String> {
    let lower = query.to_lowercase();
    let start = lower.find(" about ").map(|i| i + " about ".len())?;
    let topic: String = query[start..]
        .chars()
        .take_while(|c| !matches!(c, '?' | '.' | '!' | ','))
        .collect();
    let topic = topic.trim();
    (!topic.is_empty()).then(|| topic.to_string())
}

fn analysis_reply(prompt: &str) -> String {
    let title = prompt
        .lines()
        .find_map(|line| line.strip_prefix("Title: "))
        .unwrap_or_default()
        .trim();
    let content = prompt
        .split_once("Content:\n")
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default();

    let sentences = split_sentences(content);
    let headline = if title.is_empty() {
        sentences.first().cloned().unwrap_or_default()
    } else {
        title.to_string()
    };
    let key_points: Vec<String> = sentences.into_iter().take(3).collect();
    let score = lexicon_score(content);

    json!({
        "headline": headline,
        "key_points": key_points,
        "sentiment": format!("{:.2} ({})", score, score_label(score)),
        "entities": capitalized_terms(&format!("{title} {content}"), 5),
    })
    .to_string()
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.split_whitespace().count() >= 3)
        .map(str::to_string)
        .collect()
}

fn lexicon_score(text: &str) -> f64 {
    let (mut positive, mut negative) = (0u32, 0u32);
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if POSITIVE_WORDS.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            negative += 1;
        }
    }
    let total = positive + negative;
    if total == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / total as f64
    }
}

fn score_label(score: f64) -> &'static str {
    if score > 0.1 {
        "positive"
    } else if score < -0.1 {
        "negative"
    } else {
        "neutral"
    }
}

fn capitalized_terms(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
        if word.len() < 2 || !starts_upper || ENTITY_STOPWORDS.contains(&word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(limit).map(str::to_string).collect()
}

fn extractive_reply(prompt: &str) -> String {
    let titles: Vec<&str> = prompt
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Title: "))
        .collect();
    if titles.is_empty() {
        let terms = capitalized_terms(prompt, 8);
        if terms.is_empty() {
            return "No notable details were found.".to_string();
        }
        return terms.join(", ");
    }
    format!("Based on the available articles: {}.", titles.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::Plan;

    fn planner_prompt(query: &str) -> String {
        format!("{PLANNER_HEADER}\nKnown articles:\n(no articles stored yet)\n\nUser query: {query}\n")
    }

    #[tokio::test]
    async fn planner_prompt_yields_parseable_plan() {
        let model = DummyModel::new();
        let reply = model
            .generate_content(&planner_prompt("Summarize https://news.test/a?"))
            .await
            .unwrap();
        let plan: Plan = serde_json::from_str(&reply.text).unwrap();
        assert_eq!(plan.intent, Intent::Summarize);
        assert_eq!(plan.targets, vec!["https://news.test/a"]);
    }

    #[tokio::test]
    async fn topic_questions_carry_parameters() {
        let model = DummyModel::new();
        let reply = model
            .generate_content(&planner_prompt("What do the articles say about climate policy?"))
            .await
            .unwrap();
        let plan: Plan = serde_json::from_str(&reply.text).unwrap();
        assert_eq!(plan.intent, Intent::FindByTopic);
        assert_eq!(plan.parameters, vec!["climate policy"]);
    }

    #[test]
    fn classification_covers_comparisons() {
        assert_eq!(classify("compare the sentiment of articles"), Intent::CompareAllSentiment);
        assert_eq!(classify("which article is more positive"), Intent::ComparePositivity);
        assert_eq!(classify("compare the tone of these"), Intent::CompareTone);
        assert_eq!(classify("what are the most discussed entities"), Intent::FindCommonEntities);
        assert_eq!(classify("write me a poem"), Intent::Unknown);
    }

    #[tokio::test]
    async fn analysis_prompt_yields_analysis_json() {
        let prompt = format!(
            "{ANALYSIS_HEADER}\n\nTitle: Intel posts record growth\n\nContent:\nIntel reported strong results this quarter. Analysts at Intel expect further growth.\n"
        );
        let reply = DummyModel::new().generate_content(&prompt).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.text).unwrap();
        assert_eq!(value["headline"], "Intel posts record growth");
        assert!(value["sentiment"].as_str().unwrap().ends_with("(positive)"));
        assert_eq!(value["entities"][0], "Intel");
        assert_eq!(value["key_points"].as_array().unwrap().len(), 2);
    }
}
