#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dreamtrip_api::models::{activity::Activity, image::InlineImage};
use dreamtrip_api::services::{
    activity_service::{ActivityLookupError, ActivitySource},
    itinerary_flow::{FlowSettings, ItineraryFlow},
    itinerary_generation_service::ItineraryGenerator,
    llm::{LanguageModel, LlmError},
    model_selector::ModelSelector,
    place_retriever::{PlaceIndex, PlaceRetriever, RetrievalError, ScoredHit},
    task_group::FailurePolicy,
};
use dreamtrip_api::state::AppState;

pub const IMAGE_DESCRIPTION: &str = "Snow capped peaks above a glacial lake";

#[derive(Debug, Clone, PartialEq)]
pub enum ModelCall {
    Describe { image_count: usize },
    Generate { place: String, prompt: String },
}

#[derive(Debug, Clone)]
pub enum PlanReply {
    Document,
    Nothing,
    Malformed,
    Fail,
}

/// Scripted model that records every call it receives.
pub struct FakeModel {
    name: &'static str,
    describe_fails: bool,
    description: &'static str,
    replies: HashMap<String, PlanReply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<ModelCall>>,
}

impl FakeModel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            describe_fails: false,
            description: IMAGE_DESCRIPTION,
            replies: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_description(mut self) -> Self {
        self.describe_fails = true;
        self
    }

    pub fn empty_description(mut self) -> Self {
        self.description = "";
        self
    }

    /// Reply for the place with this display name. Unlisted places get a document.
    pub fn reply(mut self, place_name: &str, reply: PlanReply) -> Self {
        self.replies.insert(place_name.to_string(), reply);
        self
    }

    pub fn delay(mut self, place_name: &str, delay: Duration) -> Self {
        self.delays.insert(place_name.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }

    fn place_in(prompt: &str) -> String {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix("Plan an itinerary for "))
            .map(|rest| rest.trim_end_matches('.').to_string())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn provider(&self) -> &'static str {
        "fake"
    }

    fn model(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn generate_text(&self, _prompt: &str, images: &[InlineImage]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(ModelCall::Describe {
            image_count: images.len(),
        });
        if self.describe_fails {
            return Err(LlmError::Status {
                provider: "fake",
                status: 503,
                body: "vision unavailable".to_string(),
            });
        }
        Ok(self.description.to_string())
    }

    async fn generate_structured(&self, prompt: &str, _schema: &Value) -> Result<Option<Value>, LlmError> {
        let place = Self::place_in(prompt);
        self.calls.lock().unwrap().push(ModelCall::Generate {
            place: place.clone(),
            prompt: prompt.to_string(),
        });

        if let Some(delay) = self.delays.get(&place) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(&place).cloned().unwrap_or(PlanReply::Document) {
            PlanReply::Document => Ok(Some(itinerary_json(&place))),
            PlanReply::Nothing => Ok(None),
            PlanReply::Malformed => Ok(Some(json!({ "place": place }))),
            PlanReply::Fail => Err(LlmError::Status {
                provider: "fake",
                status: 500,
                body: "overloaded".to_string(),
            }),
        }
    }
}

pub fn itinerary_json(place: &str) -> Value {
    json!({
        "place": place,
        "itineraryName": format!("Dream days in {}", place),
        "startDate": "2026-11-01",
        "endDate": "2026-11-03",
        "tags": ["relaxing"],
        "itinerary": [
            {
                "day": 1,
                "date": "2026-11-01",
                "planForDay": [
                    {
                        "activityRef": "arrival",
                        "activityTitle": "Arrive",
                        "activityDesc": format!("Settle in to {}", place)
                    }
                ]
            }
        ]
    })
}

pub struct FakeIndex {
    hits: Vec<ScoredHit>,
    fails: bool,
    configured: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeIndex {
    pub fn new(hits: Vec<ScoredHit>) -> Self {
        Self {
            hits,
            fails: false,
            configured: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fails: true,
            configured: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fails every search and reports itself as not configured.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::failing()
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceIndex for FakeIndex {
    fn name(&self) -> &str {
        "fake-index"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredHit>, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        if self.fails {
            return Err(RetrievalError::ResponseError("index offline".to_string()));
        }
        Ok(self.hits.clone())
    }
}

#[derive(Default)]
pub struct FakeActivities {
    activities: HashMap<String, Vec<Activity>>,
    failing: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeActivities {
    pub fn with(mut self, place_ref: &str, activities: Vec<Activity>) -> Self {
        self.activities.insert(place_ref.to_string(), activities);
        self
    }

    pub fn failing_for(mut self, place_ref: &str) -> Self {
        self.failing.insert(place_ref.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySource for FakeActivities {
    async fn activities_for(&self, place_ref: &str) -> Result<Vec<Activity>, ActivityLookupError> {
        self.lookups.lock().unwrap().push(place_ref.to_string());
        if self.failing.contains(place_ref) {
            return Err(ActivityLookupError::Unavailable(format!("no route to {}", place_ref)));
        }
        Ok(self.activities.get(place_ref).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), ActivityLookupError> {
        Ok(())
    }
}

/// A search hit carrying full metadata, content text and an embedding.
pub fn place_hit(reference: &str, name: &str, score: f64) -> ScoredHit {
    let mut metadata = Map::new();
    metadata.insert("ref".to_string(), json!(reference));
    metadata.insert("name".to_string(), json!(name));
    metadata.insert("imageUrl".to_string(), json!(format!("https://img.example/{}.jpg", reference)));
    metadata.insert("country".to_string(), json!("Somewhere"));
    metadata.insert("embedding".to_string(), json!([0.12, 0.34, 0.56]));

    ScoredHit {
        score,
        content: Some(format!("{} is known for its views", name)),
        metadata,
    }
}

pub fn image(bytes: &[u8]) -> InlineImage {
    InlineImage::from_bytes(bytes, "image/jpeg")
}

pub struct Harness {
    pub default_model: Arc<FakeModel>,
    pub alternate_model: Arc<FakeModel>,
    pub index: Arc<FakeIndex>,
    pub activities: Arc<FakeActivities>,
    pub flow: Arc<ItineraryFlow>,
}

impl Harness {
    pub fn new(default_model: FakeModel, index: FakeIndex, activities: FakeActivities) -> Self {
        Self::build(default_model, FakeModel::new("alternate"), index, activities, FlowSettings::default())
    }

    pub fn build(
        default_model: FakeModel,
        alternate_model: FakeModel,
        index: FakeIndex,
        activities: FakeActivities,
        settings: FlowSettings,
    ) -> Self {
        let default_model = Arc::new(default_model);
        let alternate_model = Arc::new(alternate_model);
        let index = Arc::new(index);
        let activities = Arc::new(activities);

        let flow = ItineraryFlow::new(
            ModelSelector::new(default_model.clone(), alternate_model.clone()),
            PlaceRetriever::new(index.clone()),
            ItineraryGenerator::new(activities.clone()),
            settings,
        );

        Self {
            default_model,
            alternate_model,
            index,
            activities,
            flow: Arc::new(flow),
        }
    }

    pub fn abort_on_failure(default_model: FakeModel, index: FakeIndex, activities: FakeActivities) -> Self {
        Self::build(
            default_model,
            FakeModel::new("alternate"),
            index,
            activities,
            FlowSettings {
                failure_policy: FailurePolicy::AbortOnFailure,
                ..FlowSettings::default()
            },
        )
    }

    pub fn state(&self, flow_timeout: Duration) -> AppState {
        AppState {
            flow: self.flow.clone(),
            activities: self.activities.clone(),
            flow_timeout,
            max_image_bytes: 1024,
        }
    }
}
