use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::VertexSettings;
use crate::services::place_retriever::{PlaceIndex, RetrievalError, ScoredHit};

/// Struct field holding the text the data store embeds for each place.
const CONTENT_FIELD: &str = "content";

#[derive(Debug, Serialize)]
pub struct VertexSearchRequest {
    pub query: String,
    #[serde(rename = "pageSize")]
    pub page_size: i32,
    #[serde(rename = "queryExpansionSpec")]
    pub query_expansion_spec: QueryExpansionSpec,
    #[serde(rename = "spellCorrectionSpec")]
    pub spell_correction_spec: SpellCorrectionSpec,
    #[serde(rename = "relevanceScoreSpec")]
    pub relevance_score_spec: RelevanceScoreSpec,
}

#[derive(Debug, Serialize)]
pub struct QueryExpansionSpec {
    pub condition: String,
}

#[derive(Debug, Serialize)]
pub struct SpellCorrectionSpec {
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct RelevanceScoreSpec {
    #[serde(rename = "returnRelevanceScore")]
    pub return_relevance_score: bool,
}

#[derive(Debug, Deserialize)]
pub struct VertexSearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(rename = "totalSize")]
    pub total_size: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub document: Document,
    #[serde(rename = "modelScores")]
    pub model_scores: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "structData", default)]
    pub struct_data: Map<String, Value>,
}

impl SearchResult {
    fn relevance_score(&self) -> Option<f64> {
        self.model_scores
            .as_ref()?
            .get("relevance_score")?
            .get("values")?
            .get(0)?
            .as_f64()
    }

    fn into_hit(self, score: f64) -> ScoredHit {
        let mut metadata = self.document.struct_data;
        let content = match metadata.remove(CONTENT_FIELD) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        metadata
            .entry("ref")
            .or_insert_with(|| Value::String(self.document.id));

        ScoredHit {
            score,
            content,
            metadata,
        }
    }
}

impl VertexSearchResponse {
    fn into_hits(self) -> Vec<ScoredHit> {
        let raw: Vec<Option<f64>> = self.results.iter().map(SearchResult::relevance_score).collect();
        let scores = resolve_scores(&raw);

        self.results
            .into_iter()
            .zip(scores)
            .map(|(result, score)| result.into_hit(score))
            .collect()
    }
}

/// Fills in scores the service left out, keeping the service's ranking.
///
/// With no relevance scores at all, results score `1/(rank+1)`. Otherwise an
/// unscored result takes the score of the result ranked just above it, and
/// leading unscored results take the first reported score, so every score
/// stays on the service's own scale.
fn resolve_scores(raw: &[Option<f64>]) -> Vec<f64> {
    let Some(first) = raw.iter().flatten().next().copied() else {
        return (0..raw.len()).map(|rank| 1.0 / (rank as f64 + 1.0)).collect();
    };

    let mut previous = first;
    raw.iter()
        .map(|score| {
            if let Some(score) = score {
                previous = *score;
            }
            previous
        })
        .collect()
}

/// Place index backed by a Vertex AI Search (Discovery Engine) data store.
#[derive(Clone)]
pub struct VertexSearchService {
    client: Client,
    project_id: Option<String>,
    location: String,
    data_store_id: Option<String>,
    serving_config: String,
    access_token: Option<String>,
}

impl VertexSearchService {
    /// Missing project or data store settings are not fatal here; searches
    /// fail with `EnvironmentError` and `/health` reports the index as down.
    pub fn new(settings: &VertexSettings, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder().timeout(timeout).build()?;

        if settings.project_id.is_none() || settings.data_store_id.is_none() {
            log::warn!("Vertex AI Search is not configured; place retrieval will fail");
        }

        Ok(Self {
            client,
            project_id: settings.project_id.clone(),
            location: settings.location.clone(),
            data_store_id: settings.data_store_id.clone(),
            serving_config: settings.serving_config.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    fn search_url(&self) -> Result<String, RetrievalError> {
        let project_id = self.project_id.as_deref().ok_or_else(|| {
            RetrievalError::EnvironmentError("GOOGLE_CLOUD_PROJECT_ID not set".to_string())
        })?;
        let data_store_id = self.data_store_id.as_deref().ok_or_else(|| {
            RetrievalError::EnvironmentError("VERTEX_SEARCH_DATA_STORE_ID not set".to_string())
        })?;

        Ok(format!(
            "https://discoveryengine.googleapis.com/v1/projects/{}/locations/{}/dataStores/{}/servingConfigs/{}:search",
            project_id, self.location, data_store_id, self.serving_config
        ))
    }

    async fn execute_search(&self, request: VertexSearchRequest) -> Result<VertexSearchResponse, RetrievalError> {
        let url = self.search_url()?;
        let access_token = self.get_access_token().await?;

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RetrievalError::ResponseError(format!(
                "Search request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalError::ResponseError(format!("Failed to parse response: {}", e)))
    }

    async fn get_access_token(&self) -> Result<String, RetrievalError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let output = tokio::process::Command::new("gcloud")
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| RetrievalError::AuthError(format!("Failed to get gcloud token: {}", e)))?;

        if !output.status.success() {
            return Err(RetrievalError::AuthError(format!(
                "gcloud command failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| RetrievalError::AuthError(format!("Invalid UTF-8 in token: {}", e)))
    }
}

pub fn build_search_request(query: &str, limit: usize) -> VertexSearchRequest {
    VertexSearchRequest {
        query: query.trim().to_string(),
        page_size: i32::try_from(limit).unwrap_or(i32::MAX),
        query_expansion_spec: QueryExpansionSpec {
            condition: "AUTO".to_string(),
        },
        spell_correction_spec: SpellCorrectionSpec {
            mode: "AUTO".to_string(),
        },
        relevance_score_spec: RelevanceScoreSpec {
            return_relevance_score: true,
        },
    }
}

#[async_trait]
impl PlaceIndex for VertexSearchService {
    fn name(&self) -> &str {
        "vertex-search"
    }

    fn is_configured(&self) -> bool {
        self.project_id.is_some() && self.data_store_id.is_some()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredHit>, RetrievalError> {
        log::debug!("Vertex AI Search query: '{}'", query);

        let response = self.execute_search(build_search_request(query, limit)).await?;
        Ok(response.into_hits())
    }
}
