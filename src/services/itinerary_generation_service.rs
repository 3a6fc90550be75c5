use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    itinerary::{Itinerary, ItineraryDocument, ItineraryPromptInput},
    place::Place,
};
use crate::services::activity_service::{ActivityLookupError, ActivitySource};
use crate::services::llm::LlmError;
use crate::services::model_selector::ModelHandle;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    ActivityLookup(#[from] ActivityLookupError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Clone)]
pub struct ItineraryGenerator {
    activities: Arc<dyn ActivitySource>,
}

impl ItineraryGenerator {
    pub fn new(activities: Arc<dyn ActivitySource>) -> Self {
        Self { activities }
    }

    /// Generates an itinerary for one place.
    ///
    /// `Ok(None)` when the model returns nothing that fits the itinerary
    /// schema. Errors are lookup or transport failures.
    pub async fn generate_itinerary(
        &self,
        request: &str,
        place: &Place,
        model: &ModelHandle,
    ) -> Result<Option<Itinerary>, GenerationError> {
        let activities = self.activities.activities_for(&place.reference).await?;

        let input = ItineraryPromptInput {
            request: request.to_string(),
            place: place.name.clone(),
            place_description: place.known_for.clone(),
            activities,
        };

        let output = model
            .model()
            .generate_structured(&input.render(), &ItineraryDocument::response_schema())
            .await?;

        let Some(output) = output else {
            log::warn!("No itinerary returned for place '{}'", place.reference);
            return Ok(None);
        };

        let content = match serde_json::from_value::<ItineraryDocument>(output) {
            Ok(content) => content,
            Err(err) => {
                log::warn!(
                    "Itinerary for place '{}' did not match the schema: {}",
                    place.reference,
                    err
                );
                return Ok(None);
            }
        };

        Ok(Some(Itinerary {
            place_ref: place.reference.clone(),
            itinerary_image_url: place.image_url.clone(),
            content,
        }))
    }
}
