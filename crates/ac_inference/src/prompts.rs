//! Prompt templates for every model call the pipeline makes.
//!
//! Templates use `{{name}}` placeholders. Built-in templates can be replaced
//! per name by dropping a `<name>.txt` file into a prompt directory.

use std::collections::HashMap;
use std::path::Path;

use ac_core::{Article, Error, Result};

pub const PLANNER: &str = "planner";
pub const INITIAL_ANALYSIS: &str = "initial_analysis";
pub const KEYWORDS: &str = "keywords";
pub const FIND_TOPIC: &str = "find_topic";
pub const COMPARE_TONE: &str = "compare_tone";
pub const COMPARE_POSITIVITY: &str = "compare_positivity";
pub const COMPARE_MULTIPLE: &str = "compare_multiple";
pub const COMPARE_SENTIMENT: &str = "compare_sentiment";

/// First line of the planner prompt; the dummy model keys off it.
pub const PLANNER_HEADER: &str = "You are the query planner for an article question-answering system.";
/// First line of the analysis prompt; the dummy model keys off it.
pub const ANALYSIS_HEADER: &str = "You are analyzing a news article for an article search index.";

/// Upper bound on article text sent for analysis.
pub const MAX_ANALYSIS_CHARS: usize = 12_000;
const MAX_CONTEXT_SUMMARY_CHARS: usize = 300;

const PLANNER_TEMPLATE: &str = r#"You are the query planner for an article question-answering system.
Determine the intent of the user's query and which stored articles it refers to.

Available intents:
- SUMMARIZE: summarize one article (targets: the article URL)
- KEYWORDS: list the keywords or main topics of one article (targets: the article URL)
- SENTIMENT: report the sentiment of one or more articles (targets: article URLs)
- COMPARE_TONE: compare the tone of two or more articles (targets: URLs, or parameters: a topic to find them)
- COMPARE_POSITIVITY: decide which articles are more positive (targets: URLs, or parameters: a topic to find them)
- FIND_BY_TOPIC: find and discuss articles about a topic (parameters: the topic words)
- FIND_COMMON_ENTITIES: most discussed entities (targets: URLs, or empty for all articles)
- COMPARE_ALL_SENTIMENT: compare sentiment across articles about a topic (parameters: the topic)
- COMPARE_MULTIPLE: compare several articles in depth (targets: URLs, or parameters: a topic)
- UNKNOWN: anything else

Known articles:
{{articles}}

User query: {{query}}

Respond in JSON format only, without prose or code fences, using exactly this shape:
{"intent": "<one of the intents above>", "targets": ["<article url>"], "parameters": ["<topic or keyword>"]}
"#;

const INITIAL_ANALYSIS_TEMPLATE: &str = r#"You are analyzing a news article for an article search index.
Return a JSON object with the keys headline, key_points, sentiment and entities:
- "headline": one sentence capturing the article
- "key_points": three to five short bullet sentences
- "sentiment": a score between -1.0 and 1.0 followed by a label, e.g. "0.40 (positive)"
- "entities": the most important people, organizations, products and places
Respond with the JSON object only.

Title: {{title}}

Content:
{{content}}
"#;

const KEYWORDS_TEMPLATE: &str = r#"List the main keywords and topics of the following article as a comma-separated list.

Title: {{title}}
Summary: {{summary}}
"#;

const FIND_TOPIC_TEMPLATE: &str = r#"The user asked about "{{topic}}". Using only the articles below, write a concise answer that explains what they say about the topic and cites the article titles.

{{articles}}
"#;

const COMPARE_TONE_TEMPLATE: &str = r#"Compare the tone and writing style of these articles:

{{articles}}

Identify key differences in tone, formality, perspective and overall approach. Provide specific examples from the summaries.
"#;

const COMPARE_POSITIVITY_TEMPLATE: &str = r#"Compare the positivity and sentiment of these articles{{topic_clause}}:

{{articles}}

Analyze which article is more positive, optimistic or favorable in its tone and content. Consider the language used, the overall sentiment and the perspective. Explain your reasoning with specific examples.
"#;

const COMPARE_MULTIPLE_TEMPLATE: &str = r#"Compare the following articles{{topic_clause}}. Describe what they agree on, where they differ in facts, framing and emphasis, and what each one adds that the others do not.

{{articles}}
"#;

const COMPARE_SENTIMENT_TEMPLATE: &str = r#"Compare the sentiment of these articles{{topic_clause}}. Each article lists its stored sentiment. Summarize the overall pattern, which articles stand out and why.

{{articles}}
"#;

#[derive(Debug, Clone)]
pub struct PromptFactory {
    templates: HashMap<&'static str, String>,
}

impl Default for PromptFactory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptFactory {
    pub fn builtin() -> Self {
        let templates = [
            (PLANNER, PLANNER_TEMPLATE),
            (INITIAL_ANALYSIS, INITIAL_ANALYSIS_TEMPLATE),
            (KEYWORDS, KEYWORDS_TEMPLATE),
            (FIND_TOPIC, FIND_TOPIC_TEMPLATE),
            (COMPARE_TONE, COMPARE_TONE_TEMPLATE),
            (COMPARE_POSITIVITY, COMPARE_POSITIVITY_TEMPLATE),
            (COMPARE_MULTIPLE, COMPARE_MULTIPLE_TEMPLATE),
            (COMPARE_SENTIMENT, COMPARE_SENTIMENT_TEMPLATE),
        ]
        .into_iter()
        .map(|(name, template)| (name, template.to_string()))
        .collect();
        Self { templates }
    }

    /// Built-in templates, overridden by any `<name>.txt` found in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut factory = Self::builtin();
        let names: Vec<&'static str> = factory.templates.keys().copied().collect();
        for name in names {
            let path = dir.join(format!("{name}.txt"));
            if path.is_file() {
                let template = std::fs::read_to_string(&path)?;
                tracing::info!(template = name, path = %path.display(), "Loaded prompt override");
                factory.templates.insert(name, template);
            }
        }
        Ok(factory)
    }

    pub fn with_template(mut self, name: &'static str, template: impl Into<String>) -> Self {
        self.templates.insert(name, template.into());
        self
    }

    /// Substitute `vars` into the named template. Fails when the template
    /// is unknown or references a placeholder not present in `vars`.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::Prompt(format!("unknown prompt template: {name}")))?;

        for placeholder in placeholders(template) {
            if !vars.iter().any(|(key, _)| *key == placeholder) {
                return Err(Error::Prompt(format!(
                    "template {name} needs a value for {{{{{placeholder}}}}}"
                )));
            }
        }

        // Single pass over the template; substituted values are never rescanned.
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else { break };
            let name = &after[..end];
            rendered.push_str(&rest[..start]);
            match vars.iter().find(|(key, _)| *key == name) {
                Some((_, value)) if is_placeholder_name(name) => rendered.push_str(value),
                _ => rendered.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        rendered.push_str(rest);
        Ok(rendered)
    }

    pub fn planner(&self, query: &str, context: &[Article]) -> Result<String> {
        let articles = if context.is_empty() {
            "(no articles stored yet)".to_string()
        } else {
            context
                .iter()
                .map(|a| {
                    let summary = a
                        .summary_text()
                        .map(|s| truncate_chars(s, MAX_CONTEXT_SUMMARY_CHARS))
                        .unwrap_or_else(|| truncate_chars(&a.excerpt, MAX_CONTEXT_SUMMARY_CHARS));
                    format!("- {} | {} | {}", a.url, a.title, summary.replace('\n', " "))
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.render(PLANNER, &[("query", query), ("articles", &articles)])
    }

    pub fn initial_analysis(&self, title: &str, content: &str) -> Result<String> {
        let content = truncate_chars(content, MAX_ANALYSIS_CHARS);
        self.render(INITIAL_ANALYSIS, &[("title", title), ("content", &content)])
    }

    pub fn keywords(&self, title: &str, summary: &str) -> Result<String> {
        self.render(KEYWORDS, &[("title", title), ("summary", summary)])
    }

    pub fn find_topic(&self, topic: &str, articles: &[Article]) -> Result<String> {
        let block = article_block(articles, false);
        self.render(FIND_TOPIC, &[("topic", topic), ("articles", &block)])
    }

    pub fn compare_tone(&self, articles: &[Article]) -> Result<String> {
        let block = article_block(articles, false);
        self.render(COMPARE_TONE, &[("articles", &block)])
    }

    pub fn compare_positivity(&self, topic: Option<&str>, articles: &[Article]) -> Result<String> {
        let block = article_block(articles, false);
        let clause = topic_clause(topic);
        self.render(
            COMPARE_POSITIVITY,
            &[("articles", &block), ("topic_clause", &clause)],
        )
    }

    pub fn compare_multiple(&self, topic: Option<&str>, articles: &[Article]) -> Result<String> {
        let block = article_block(articles, false);
        let clause = topic_clause(topic);
        self.render(
            COMPARE_MULTIPLE,
            &[("articles", &block), ("topic_clause", &clause)],
        )
    }

    pub fn compare_sentiment(&self, topic: Option<&str>, articles: &[Article]) -> Result<String> {
        let block = article_block(articles, true);
        let clause = topic_clause(topic);
        self.render(
            COMPARE_SENTIMENT,
            &[("articles", &block), ("topic_clause", &clause)],
        )
    }
}

fn topic_clause(topic: Option<&str>) -> String {
    topic
        .map(|t| format!(" about \"{t}\""))
        .unwrap_or_default()
}

fn article_block(articles: &[Article], with_sentiment: bool) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let summary = a.summary_text().unwrap_or(a.excerpt.as_str());
            let mut entry = format!("Article {}\nTitle: {}\nURL: {}\n", i + 1, a.title, a.url);
            if with_sentiment {
                entry.push_str(&format!(
                    "Sentiment: {}\n",
                    a.sentiment_label().unwrap_or("not available")
                ));
            }
            entry.push_str(&format!("Summary: {summary}"));
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let name = &after[..end];
        if is_placeholder_name(name) {
            found.push(name);
        }
        rest = &after[end + 2..];
    }
    found
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Cut `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
