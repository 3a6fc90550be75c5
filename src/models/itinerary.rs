use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::activity::Activity;

/// The structured plan returned by the model for one place.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDocument {
    pub place: String,
    pub itinerary_name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub day: u32,
    #[serde(default)]
    pub date: String,
    pub plan_for_day: Vec<PlannedActivity>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedActivity {
    #[serde(default)]
    pub activity_ref: String,
    pub activity_title: String,
    pub activity_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
}

impl ItineraryDocument {
    /// JSON schema handed to the model's structured-output mode.
    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "place": { "type": "string" },
                "itineraryName": { "type": "string" },
                "startDate": { "type": "string" },
                "endDate": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "itinerary": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "day": { "type": "integer" },
                            "date": { "type": "string" },
                            "planForDay": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "activityRef": { "type": "string" },
                                        "activityTitle": { "type": "string" },
                                        "activityDesc": { "type": "string" },
                                        "photoUri": { "type": "string" }
                                    },
                                    "required": ["activityTitle", "activityDesc"]
                                }
                            }
                        },
                        "required": ["day", "planForDay"]
                    }
                }
            },
            "required": ["place", "itineraryName", "itinerary"]
        })
    }
}

/// A generated itinerary, stamped with the place it was generated for.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub place_ref: String,
    pub itinerary_image_url: String,
    #[serde(flatten)]
    pub content: ItineraryDocument,
}

/// Input rendered into the itinerary prompt.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPromptInput {
    pub request: String,
    pub place: String,
    pub place_description: String,
    pub activities: Vec<Activity>,
}

impl ItineraryPromptInput {
    pub fn render(&self) -> String {
        let mut prompt = format!(
            "You are a travel agent planning a trip for a customer.\n\
             The customer asked for: {}\n\n\
             Plan an itinerary for {}.\n\
             About {}: {}\n\n",
            self.request, self.place, self.place, self.place_description
        );

        if self.activities.is_empty() {
            prompt.push_str(
                "There are no recorded activities for this place; suggest activities a visitor would enjoy.\n",
            );
        } else {
            prompt.push_str("Choose from these activities:\n");
            for activity in &self.activities {
                prompt.push_str(&format!("- {}: {}", activity.name, activity.description));
                if let Some(url) = &activity.image_url {
                    prompt.push_str(&format!(" (photo: {})", url));
                }
                prompt.push('\n');
            }
        }

        prompt.push_str(
            "\nGive the itinerary a short name and a few tags. Number the days from 1 and give each \
             day a plan of activities. Reuse an activity's photo as photoUri when one is listed. \
             Answer only with JSON matching the requested schema.",
        );
        prompt
    }
}
