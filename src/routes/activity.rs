use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::state::AppState;

/*
    /api/places/{place_ref}/activities
*/
pub async fn get_activities(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let place_ref = path.into_inner();

    match state.activities.activities_for(&place_ref).await {
        Ok(activities) => HttpResponse::Ok().json(activities),
        Err(err) => {
            log::error!("Failed to find activities for '{}': {}", place_ref, err);
            HttpResponse::InternalServerError().json(json!({ "error": "Failed to find activities." }))
        }
    }
}
