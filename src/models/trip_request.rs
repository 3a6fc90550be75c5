use serde::Serialize;
use thiserror::Error;

use crate::models::image::InlineImage;

/// Form token that selects the alternate model. Matched exactly.
pub const ALTERNATE_MODEL_TOKEN: &str = "openai";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[default]
    Default,
    Alternate,
}

impl ModelChoice {
    /// Anything other than the exact alternate token resolves to the default.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(ALTERNATE_MODEL_TOKEN) => ModelChoice::Alternate,
            _ => ModelChoice::Default,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TripRequestError {
    #[error("No request provided")]
    EmptyRequest,
}

/// One trip submission. Validated on construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct TripRequest {
    text: String,
    images: Vec<InlineImage>,
    model_choice: ModelChoice,
}

impl TripRequest {
    pub fn new(
        text: impl Into<String>,
        images: Vec<InlineImage>,
        model_choice: ModelChoice,
    ) -> Result<Self, TripRequestError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TripRequestError::EmptyRequest);
        }

        Ok(Self {
            text,
            images,
            model_choice,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn images(&self) -> &[InlineImage] {
        &self.images
    }

    pub fn model_choice(&self) -> ModelChoice {
        self.model_choice
    }
}
