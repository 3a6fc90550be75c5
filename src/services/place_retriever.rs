use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

use crate::models::place::Place;

pub const DEFAULT_PLACE_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Environment error: {0}")]
    EnvironmentError(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
}

/// One scored record from the retrieval index.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub score: f64,
    pub content: Option<String>,
    pub metadata: Map<String, Value>,
}

/// A searchable store of destination records.
#[async_trait]
pub trait PlaceIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the index has what it needs to serve a search.
    fn is_configured(&self) -> bool;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredHit>, RetrievalError>;
}

#[derive(Clone)]
pub struct PlaceRetriever {
    index: Arc<dyn PlaceIndex>,
}

impl PlaceRetriever {
    pub fn new(index: Arc<dyn PlaceIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &dyn PlaceIndex {
        self.index.as_ref()
    }

    /// Top `limit` places for `query`, best match first.
    pub async fn retrieve_places(&self, query: &str, limit: usize) -> Result<Vec<Place>, RetrievalError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut hits = self.index.search(query, limit).await?;
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);

        log::info!("Retrieved {} place(s) from {}", hits.len(), self.index.name());

        Ok(hits
            .into_iter()
            .map(|hit| Place::from_metadata(hit.metadata, hit.content.as_deref()))
            .collect())
    }
}
