use actix_web::web;

pub mod activity;
pub mod dream_vacation;
pub mod health;

/// Registers every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .route(
                    "/itineraries/generate",
                    web::post().to(dream_vacation::generate),
                )
                .route(
                    "/places/{place_ref}/activities",
                    web::get().to(activity::get_activities),
                ),
        );
}
