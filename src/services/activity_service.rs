use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use std::sync::Arc;
use thiserror::Error;

use crate::models::activity::{Activity, ActivityRecord};

#[derive(Debug, Error)]
pub enum ActivityLookupError {
    #[error("Activity store error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Activity store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only source of known activities, keyed by place reference.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Activities recorded for the place, in stored order. Empty when none.
    async fn activities_for(&self, place_ref: &str) -> Result<Vec<Activity>, ActivityLookupError>;

    async fn ping(&self) -> Result<(), ActivityLookupError>;
}

pub struct MongoActivitySource {
    client: Arc<Client>,
    database: String,
    collection: String,
}

impl MongoActivitySource {
    pub fn new(client: Arc<Client>, database: &str, collection: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    fn collection(&self) -> Collection<ActivityRecord> {
        self.client
            .database(&self.database)
            .collection(&self.collection)
    }
}

#[async_trait]
impl ActivitySource for MongoActivitySource {
    async fn activities_for(&self, place_ref: &str) -> Result<Vec<Activity>, ActivityLookupError> {
        let cursor = self
            .collection()
            .find(doc! { "destination_ref": place_ref })
            .sort(doc! { "_id": 1 })
            .await?;

        let records: Vec<ActivityRecord> = cursor.try_collect().await?;
        log::debug!("Found {} activities for place '{}'", records.len(), place_ref);

        Ok(records.into_iter().map(Activity::from).collect())
    }

    async fn ping(&self) -> Result<(), ActivityLookupError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
