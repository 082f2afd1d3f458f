use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl Article {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            excerpt: String::new(),
            full_text: String::new(),
            summary: None,
            sentiment: None,
            topics: Vec::new(),
            entities: Vec::new(),
            processed_at: Utc::now(),
        }
    }

    /// Stored summary, treating a blank one as missing.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn sentiment_label(&self) -> Option<&str> {
        self.sentiment.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Entities when present, topics otherwise.
    pub fn ranked_terms(&self) -> &[String] {
        if self.entities.iter().any(|e| !e.trim().is_empty()) {
            &self.entities
        } else {
            &self.topics
        }
    }

    /// Text fed to the vector index.
    pub fn index_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.full_text.len() + 64);
        text.push_str(&self.title);
        text.push('\n');
        if let Some(summary) = self.summary_text() {
            text.push_str(summary);
            text.push('\n');
        }
        text.push_str(&self.topics.join(" "));
        text.push('\n');
        text.push_str(&self.entities.join(" "));
        text.push('\n');
        if self.full_text.is_empty() {
            text.push_str(&self.excerpt);
        } else {
            text.push_str(&self.full_text);
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    pub entity: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    Summarize,
    Keywords,
    Sentiment,
    CompareTone,
    FindByTopic,
    ComparePositivity,
    FindCommonEntities,
    CompareAllSentiment,
    CompareMultiple,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 10] = [
        Intent::Summarize,
        Intent::Keywords,
        Intent::Sentiment,
        Intent::CompareTone,
        Intent::FindByTopic,
        Intent::ComparePositivity,
        Intent::FindCommonEntities,
        Intent::CompareAllSentiment,
        Intent::CompareMultiple,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Summarize => "SUMMARIZE",
            Intent::Keywords => "KEYWORDS",
            Intent::Sentiment => "SENTIMENT",
            Intent::CompareTone => "COMPARE_TONE",
            Intent::FindByTopic => "FIND_BY_TOPIC",
            Intent::ComparePositivity => "COMPARE_POSITIVITY",
            Intent::FindCommonEntities => "FIND_COMMON_ENTITIES",
            Intent::CompareAllSentiment => "COMPARE_ALL_SENTIMENT",
            Intent::CompareMultiple => "COMPARE_MULTIPLE",
            Intent::Unknown => "UNKNOWN",
        }
    }

    /// Lenient parse; anything unrecognised becomes `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .unwrap_or(Intent::Unknown)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Intent::parse(s))
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Intent::parse(&raw))
    }
}

/// Structured reading of a user question, produced once per chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub intent: Intent,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub targets: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub question: String,
}

impl Plan {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            targets: Vec::new(),
            parameters: Vec::new(),
            question: String::new(),
        }
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    /// Parameters joined into one search phrase.
    pub fn topic(&self) -> Option<String> {
        let topic = self
            .parameters
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!topic.is_empty()).then_some(topic)
    }

    /// Non-blank targets in plan order, duplicates kept.
    pub fn target_urls(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.trim()).filter(|t| !t.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
