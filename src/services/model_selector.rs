use std::sync::Arc;

use crate::models::trip_request::ModelChoice;
use crate::services::llm::LanguageModel;

/// The model chosen for one flow invocation.
#[derive(Clone)]
pub struct ModelHandle {
    choice: ModelChoice,
    model: Arc<dyn LanguageModel>,
}

impl ModelHandle {
    pub fn choice(&self) -> ModelChoice {
        self.choice
    }

    pub fn model(&self) -> &dyn LanguageModel {
        self.model.as_ref()
    }

    /// "provider/model" label for logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.model.provider(), self.model.model())
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("choice", &self.choice)
            .field("model", &self.label())
            .finish()
    }
}

#[derive(Clone)]
pub struct ModelSelector {
    default: Arc<dyn LanguageModel>,
    alternate: Arc<dyn LanguageModel>,
}

impl ModelSelector {
    pub fn new(default: Arc<dyn LanguageModel>, alternate: Arc<dyn LanguageModel>) -> Self {
        Self { default, alternate }
    }

    /// Resolves a raw form token. Never fails; unknown tokens get the default.
    pub fn select(&self, token: Option<&str>) -> ModelHandle {
        self.handle_for(ModelChoice::from_token(token))
    }

    pub fn handle_for(&self, choice: ModelChoice) -> ModelHandle {
        let model = match choice {
            ModelChoice::Default => self.default.clone(),
            ModelChoice::Alternate => self.alternate.clone(),
        };
        ModelHandle { choice, model }
    }

    pub fn models(&self) -> [(ModelChoice, &dyn LanguageModel); 2] {
        [
            (ModelChoice::Default, self.default.as_ref()),
            (ModelChoice::Alternate, self.alternate.as_ref()),
        ]
    }
}
