use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;

use crate::models::trip_request::ModelChoice;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: BTreeMap<String, ServiceStatus>,
    environment: String,
    version: String,
    checked_at: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: String) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details),
        }
    }

    fn error(details: String) -> Self {
        Self {
            status: "error".to_string(),
            details: Some(details),
        }
    }
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut services = BTreeMap::new();

    let activity_store = match state.activities.ping().await {
        Ok(()) => ServiceStatus::ok("Activity store reachable".to_string()),
        Err(e) => {
            log::warn!("Activity store health check failed: {}", e);
            ServiceStatus::error(format!("Failed to reach activity store: {}", e))
        }
    };
    services.insert("activity_store".to_string(), activity_store);

    for (choice, model) in state.flow.selector().models() {
        let key = match choice {
            ModelChoice::Default => "llm_default",
            ModelChoice::Alternate => "llm_alternate",
        };
        let label = format!("{}/{}", model.provider(), model.model());
        let status = if model.is_configured() {
            ServiceStatus::ok(format!("{} configured", label))
        } else {
            ServiceStatus::error(format!("{} API key not configured", label))
        };
        services.insert(key.to_string(), status);
    }

    let index = state.flow.retriever().index();
    let place_limit = state.flow.settings().place_limit;
    let place_index = if index.is_configured() {
        ServiceStatus::ok(format!("{} configured (limit {})", index.name(), place_limit))
    } else {
        ServiceStatus::error(format!("{} not configured", index.name()))
    };
    services.insert("place_index".to_string(), place_index);

    let degraded = services.values().any(|s| s.status != "ok");

    HttpResponse::Ok().json(HealthStatus {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        services,
        environment: env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checked_at: Utc::now().to_rfc3339(),
    })
}
