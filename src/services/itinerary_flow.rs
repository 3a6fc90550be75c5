//! The itinerary flow: describe images, retrieve places, generate one
//! itinerary per place concurrently, keep the ones that came back.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    image::InlineImage,
    itinerary::Itinerary,
    place::Place,
    trip_request::{ModelChoice, TripRequest, TripRequestError},
};
use crate::services::image_description_service::describe_images;
use crate::services::image_service::ImageError;
use crate::services::itinerary_generation_service::{GenerationError, ItineraryGenerator};
use crate::services::llm::LlmError;
use crate::services::model_selector::{ModelHandle, ModelSelector};
use crate::services::place_retriever::{PlaceRetriever, RetrievalError, DEFAULT_PLACE_LIMIT};
use crate::services::task_group::{collect_produced, join_outcomes, FailurePolicy, TaskOutcome};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    InvalidRequest(#[from] TripRequestError),
    #[error(transparent)]
    InvalidImage(#[from] ImageError),
    #[error("Image description failed: {0}")]
    ImageDescription(#[source] LlmError),
    #[error("Place retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("Itinerary generation failed for place '{place_ref}': {source}")]
    Generation {
        place_ref: String,
        #[source]
        source: GenerationError,
    },
    #[error("Itinerary flow exceeded {0:?}")]
    DeadlineExceeded(Duration),
}

#[derive(Debug, Clone, Copy)]
pub struct FlowSettings {
    pub place_limit: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            place_limit: DEFAULT_PLACE_LIMIT,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Query text sent to the place index.
pub fn retrieval_query(request: &str, image_description: &str) -> String {
    format!("{}\n{}", request, image_description)
}

pub struct ItineraryFlow {
    selector: ModelSelector,
    retriever: PlaceRetriever,
    generator: ItineraryGenerator,
    settings: FlowSettings,
}

impl ItineraryFlow {
    pub fn new(
        selector: ModelSelector,
        retriever: PlaceRetriever,
        generator: ItineraryGenerator,
        settings: FlowSettings,
    ) -> Self {
        Self {
            selector,
            retriever,
            generator,
            settings,
        }
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    pub fn retriever(&self) -> &PlaceRetriever {
        &self.retriever
    }

    pub fn settings(&self) -> FlowSettings {
        self.settings
    }

    /// Validates a raw submission, then runs the flow. An empty request fails
    /// here, before any model or index is called.
    pub async fn submit(
        &self,
        text: &str,
        images: Vec<InlineImage>,
        model_token: Option<&str>,
    ) -> Result<Vec<Itinerary>, FlowError> {
        let trip = TripRequest::new(text, images, ModelChoice::from_token(model_token))?;
        self.run(&trip).await
    }

    pub async fn run(&self, trip: &TripRequest) -> Result<Vec<Itinerary>, FlowError> {
        let run_id = Uuid::new_v4();
        let model = self.selector.handle_for(trip.model_choice());
        log::info!("[{}] Starting itinerary flow with {}", run_id, model.label());

        let description = describe_images(trip.images(), &model)
            .await
            .map_err(|err| {
                log::error!("[{}] Image description failed: {}", run_id, err);
                FlowError::ImageDescription(err)
            })?;

        let query = retrieval_query(trip.text(), &description);
        let places = self
            .retriever
            .retrieve_places(&query, self.settings.place_limit)
            .await
            .map_err(|err| {
                log::error!("[{}] Place retrieval failed: {}", run_id, err);
                FlowError::Retrieval(err)
            })?;

        let itineraries = self.generate_all(run_id, trip.text(), &places, &model).await?;
        log::info!(
            "[{}] Generated {} itinerary(ies) for {} place(s)",
            run_id,
            itineraries.len(),
            places.len()
        );
        Ok(itineraries)
    }

    async fn generate_all(
        &self,
        run_id: Uuid,
        request: &str,
        places: &[Place],
        model: &ModelHandle,
    ) -> Result<Vec<Itinerary>, FlowError> {
        let tasks = places.iter().enumerate().map(|(i, place)| async move {
            log::info!("[{}] Generate itinerary #{} ({})", run_id, i + 1, place.reference);
            self.generator.generate_itinerary(request, place, model).await
        });

        let outcomes = join_outcomes(tasks).await;

        for (place, outcome) in places.iter().zip(&outcomes) {
            if let TaskOutcome::Failed(err) = outcome {
                log::warn!(
                    "[{}] Itinerary generation failed for place '{}': {}",
                    run_id,
                    place.reference,
                    err
                );
            }
        }

        collect_produced(outcomes, self.settings.failure_policy).map_err(|(index, source)| {
            FlowError::Generation {
                place_ref: places[index].reference.clone(),
                source,
            }
        })
    }
}
