use base64::{engine::general_purpose, Engine as _};

/// An uploaded image carried inline (MIME type + base64 content) so it can be
/// handed to an LLM without any durable storage behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    /// `data:` URL form, as accepted by OpenAI-style image inputs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
