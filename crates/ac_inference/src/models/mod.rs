use std::sync::Arc;

use ac_core::{Error, GenerativeModel, Result};

use crate::InferenceConfig;

pub mod dummy;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;
pub use ollama::{OllamaConfig, OllamaModel};
pub use openai::OpenAiModel;
pub use scripted::ScriptedModel;

/// Build the generative model named by `config.provider`.
///
/// Provider names are matched case-insensitively; `mock` is an alias
/// for the offline `dummy` model.
pub fn create_model(config: &InferenceConfig) -> Result<Arc<dyn GenerativeModel>> {
    let timeout = config.request_timeout;
    let model_name = config.model_name.clone();
    let model: Arc<dyn GenerativeModel> = match config.provider.trim().to_lowercase().as_str() {
        "openai" => Arc::new(OpenAiModel::openai(config.api_key.clone(), model_name, timeout)?),
        "deepseek" => Arc::new(OpenAiModel::deepseek(config.api_key.clone(), model_name, timeout)?),
        "gemini" => Arc::new(GeminiModel::new(
            config.api_key.clone(),
            model_name,
            config.model_url.clone(),
            timeout,
        )?),
        "ollama" => {
            let ollama = OllamaConfig::from_parts(
                config.model_url.as_deref(),
                config.model_name.as_deref(),
            )?;
            Arc::new(OllamaModel::new(ollama, timeout)?)
        }
        "dummy" | "mock" | "" => Arc::new(DummyModel::new()),
        other => {
            return Err(Error::Validation(format!(
                "unsupported LLM provider: {other}"
            )))
        }
    };
    tracing::info!(provider = %config.provider, model = model.name(), "generative model ready");
    Ok(model)
}
