use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the index's embedding vector. Never part of a `Place`.
pub const EMBEDDING_KEY: &str = "embedding";

/// A candidate destination from the place corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub known_for: String,
    pub image_url: String,
    pub continent: String,
    pub country: String,
    pub tags: Vec<String>,
}

impl Place {
    /// Builds a place from a search hit's metadata record.
    ///
    /// Every field is listed explicitly: a missing or non-string value becomes
    /// an empty string, missing tags become an empty set. When the hit carries
    /// non-empty content text it replaces the `knownFor` metadata. The
    /// embedding entry is dropped before anything is read.
    pub fn from_metadata(mut metadata: Map<String, Value>, content: Option<&str>) -> Self {
        metadata.remove(EMBEDDING_KEY);

        let text = |key: &str| -> String {
            metadata
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let mut place = Place {
            reference: text("ref"),
            name: text("name"),
            known_for: text("knownFor"),
            image_url: text("imageUrl"),
            continent: text("continent"),
            country: text("country"),
            tags: tag_set(metadata.get("tags")),
        };

        if let Some(content) = content.map(str::trim).filter(|c| !c.is_empty()) {
            place.known_for = content.to_string();
        }

        place
    }
}

// Tags arrive either as an array or as a comma separated string.
fn tag_set(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(joined)) => joined.split(',').collect(),
        _ => Vec::new(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
