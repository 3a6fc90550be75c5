use std::sync::Arc;
use std::time::Duration;

use crate::services::activity_service::ActivitySource;
use crate::services::itinerary_flow::ItineraryFlow;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<ItineraryFlow>,
    pub activities: Arc<dyn ActivitySource>,
    pub flow_timeout: Duration,
    pub max_image_bytes: usize,
}
