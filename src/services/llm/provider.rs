use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::image::InlineImage;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API key not configured")]
    NotConfigured { provider: &'static str },
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("Failed to parse {provider} response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },
}

/// A language model backend.
///
/// `async_trait` keeps the trait object-safe so backends can sit behind
/// `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name for logging, e.g. "gemini".
    fn provider(&self) -> &'static str;

    /// Concrete model identifier, e.g. "gpt-4o".
    fn model(&self) -> &str;

    fn is_configured(&self) -> bool;

    /// Free text generation over a prompt and any number of inline images.
    async fn generate_text(&self, prompt: &str, images: &[InlineImage]) -> Result<String, LlmError>;

    /// Structured generation. `Ok(None)` means the model produced nothing usable.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<Option<Value>, LlmError>;
}

/// Free text answer, trimmed. A model that answers with nothing yields an
/// empty string rather than an error.
pub fn text_or_empty(provider: &str, text: Option<String>) -> String {
    let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        log::warn!("{} returned an empty text answer", provider);
    }
    text
}

/// Parses a model's structured answer. Blank or non-JSON text yields `None`.
pub fn parse_structured_output(provider: &str, text: Option<&str>) -> Option<Value> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    let text = strip_code_fence(text);

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("{} returned structured output that is not JSON: {}", provider, err);
            None
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
