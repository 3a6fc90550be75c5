//! OpenAI backend using the Chat Completions API.
//!
//! Images are sent as data URLs in the user message content array.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::provider::{parse_structured_output, text_or_empty, LanguageModel, LlmError};
use crate::models::image::InlineImage;

const PROVIDER: &str = "openai";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: Option<String>, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
        })
    }

    async fn complete(&self, body: &ChatRequest) -> Result<Option<String>, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::NotConfigured { provider: PROVIDER })?;

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await
            .map_err(|source| LlmError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    fn request(&self, content: Vec<ChatContent>, response_format: Option<ResponseFormat>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            response_format,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(&self, prompt: &str, images: &[InlineImage]) -> Result<String, LlmError> {
        let mut content = vec![ChatContent::Text {
            text: prompt.to_string(),
        }];
        content.extend(images.iter().map(|image| ChatContent::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
            },
        }));

        let text = self.complete(&self.request(content, None)).await?;
        Ok(text_or_empty(PROVIDER, text))
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<Option<Value>, LlmError> {
        let content = vec![ChatContent::Text {
            text: prompt.to_string(),
        }];
        let format = ResponseFormat {
            kind: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: "itinerary".to_string(),
                schema: schema.clone(),
                strict: false,
            },
        };

        let text = self.complete(&self.request(content, Some(format))).await?;
        Ok(parse_structured_output(PROVIDER, text.as_deref()))
    }
}
