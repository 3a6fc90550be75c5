use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::services::image_service::DEFAULT_MAX_IMAGE_BYTES;
use crate::services::place_retriever::DEFAULT_PLACE_LIMIT;
use crate::services::task_group::FailurePolicy;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const FLOW_TIMEOUT_SECS: u64 = 60;
const LLM_TIMEOUT_SECS: u64 = 60;
const SEARCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project_id: Option<String>,
    pub location: String,
    pub data_store_id: Option<String>,
    pub serving_config: String,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub activity_database: String,
    pub activity_collection: String,
    pub gemini: LlmSettings,
    pub openai: LlmSettings,
    pub llm_timeout: Duration,
    pub vertex: VertexSettings,
    pub search_timeout: Duration,
    pub place_limit: usize,
    pub flow_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub max_image_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: or("HOST", HOST),
            port: parse_or(&get, "PORT", PORT)?,
            mongodb_uri: get("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
            activity_database: or("ACTIVITY_DATABASE", "Places"),
            activity_collection: or("ACTIVITY_COLLECTION", "Activities"),
            gemini: LlmSettings {
                api_key: get("GEMINI_API_KEY"),
                model: or("GEMINI_MODEL", "gemini-1.5-pro"),
            },
            openai: LlmSettings {
                api_key: get("OPENAI_API_KEY"),
                model: or("OPENAI_MODEL", "gpt-4o"),
            },
            llm_timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", LLM_TIMEOUT_SECS)?),
            vertex: VertexSettings {
                project_id: get("GOOGLE_CLOUD_PROJECT_ID"),
                location: or("VERTEX_SEARCH_LOCATION", "global"),
                data_store_id: get("VERTEX_SEARCH_DATA_STORE_ID"),
                serving_config: or("VERTEX_SEARCH_SERVING_CONFIG", "default_config"),
                access_token: get("GOOGLE_CLOUD_ACCESS_TOKEN"),
            },
            search_timeout: Duration::from_secs(parse_or(&get, "SEARCH_TIMEOUT_SECS", SEARCH_TIMEOUT_SECS)?),
            place_limit: parse_or(&get, "PLACE_RESULT_LIMIT", DEFAULT_PLACE_LIMIT)?,
            flow_timeout: Duration::from_secs(parse_or(&get, "FLOW_TIMEOUT_SECS", FLOW_TIMEOUT_SECS)?),
            failure_policy: parse_or(&get, "GENERATION_FAILURE_POLICY", FailurePolicy::DropFailed)?,
            max_image_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
        })
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
