use std::{io, sync::Arc};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use dreamtrip_api::{
    config::AppConfig,
    db::mongo::create_mongo_client,
    routes,
    services::{
        activity_service::{ActivitySource, MongoActivitySource},
        itinerary_flow::{FlowSettings, ItineraryFlow},
        itinerary_generation_service::ItineraryGenerator,
        llm::{gemini::GeminiModel, openai::OpenAiModel},
        model_selector::ModelSelector,
        place_retriever::PlaceRetriever,
        vertex_search_service::VertexSearchService,
    },
    state::AppState,
};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    log::info!("Application starting...");

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let mongo = create_mongo_client(&config.mongodb_uri)
        .await
        .map_err(|e| startup_error("Failed to create MongoDB client", e))?;
    let activities: Arc<dyn ActivitySource> = Arc::new(MongoActivitySource::new(
        mongo,
        &config.activity_database,
        &config.activity_collection,
    ));

    let gemini = GeminiModel::new(config.gemini.api_key.clone(), &config.gemini.model, config.llm_timeout)
        .map_err(|e| startup_error("Failed to build Gemini client", e))?;
    let openai = OpenAiModel::new(config.openai.api_key.clone(), &config.openai.model, config.llm_timeout)
        .map_err(|e| startup_error("Failed to build OpenAI client", e))?;
    let selector = ModelSelector::new(Arc::new(gemini), Arc::new(openai));

    let index = VertexSearchService::new(&config.vertex, config.search_timeout)
        .map_err(|e| startup_error("Failed to build Vertex AI Search client", e))?;

    let flow = ItineraryFlow::new(
        selector,
        PlaceRetriever::new(Arc::new(index)),
        ItineraryGenerator::new(activities.clone()),
        FlowSettings {
            place_limit: config.place_limit,
            failure_policy: config.failure_policy,
        },
    );

    let state = AppState {
        flow: Arc::new(flow),
        activities,
        flow_timeout: config.flow_timeout,
        max_image_bytes: config.max_image_bytes,
    };

    log::info!("Starting HTTP server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
