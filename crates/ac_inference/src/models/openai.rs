use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use ac_core::{Error, Generation, GenerativeModel, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
const EMPTY_RESPONSE: &str = "Received an empty response from the model.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Any OpenAI-compatible chat completions endpoint (OpenAI, DeepSeek, ...).
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    label: &'static str,
}

impl OpenAiModel {
    pub fn new(
        label: &'static str,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Validation(format!("{label} API key is required")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            label,
        })
    }

    pub fn openai(api_key: Option<String>, model: Option<String>, timeout: Duration) -> Result<Self> {
        Self::new(
            "OpenAI",
            api_key,
            OPENAI_BASE_URL,
            model.unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            timeout,
        )
    }

    pub fn deepseek(api_key: Option<String>, model: Option<String>, timeout: Duration) -> Result<Self> {
        Self::new(
            "DeepSeek",
            api_key,
            DEEPSEEK_BASE_URL,
            model.unwrap_or_else(|| "deepseek-chat".to_string()),
            timeout,
        )
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl GenerativeModel for OpenAiModel {
    fn name(&self) -> &str {
        self.label
    }

    async fn generate_content(&self, prompt: &str) -> Result<Generation> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Upstream(format!("{} API call failed: {}", self.label, e)))?
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Upstream(format!("{} returned an unreadable body: {}", self.label, e)))?;

        if let Some(usage) = &response.usage {
            tracing::info!(
                provider = self.label,
                model = %self.model,
                usage_prompt_tokens = usage.prompt_tokens,
                usage_completion_tokens = usage.completion_tokens,
                usage_total_tokens = usage.total_tokens,
                "LLM API response received"
            );
        }

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string());
        Ok(Generation::new(text))
    }
}
