pub mod gemini;
pub mod openai;
pub mod provider;

pub use provider::{LanguageModel, LlmError};
