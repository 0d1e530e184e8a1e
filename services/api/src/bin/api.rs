//! services/api/src/bin/api.rs

use std::sync::Arc;

use api_lib::{
    adapters::{
        blurb_llm::{NullBlurbs, OpenAiBlurbAdapter},
        db::PgStore,
    },
    config::Config,
    error::ApiError,
    web::{
        candidates_handler, checkin_handler, create_session_handler, delete_session_handler,
        get_session_handler, history_handler, identity_handler, next_adventure_handler,
        parameters_handler, register_pending_handler,
        rest::ApiDoc,
        state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use wayfarer_core::engine::AdventureEngine;
use wayfarer_core::ports::BlurbService;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Blurb Service ---
    // Without an API key the service still runs; candidates just carry a
    // generic comment instead of generated text.
    let blurbs: Arc<dyn BlurbService> = match &config.openai_api_key {
        Some(key) => {
            let openai_config = OpenAIConfig::new().with_api_key(key);
            Arc::new(OpenAiBlurbAdapter::new(
                Client::with_config(openai_config),
                config.blurb_model.clone(),
                config.blurb_timeout,
            ))
        }
        None => {
            info!("OPENAI_API_KEY not set; using the static blurb fallback");
            Arc::new(NullBlurbs)
        }
    };

    // --- 4. Build the Engine and Shared AppState ---
    let engine = AdventureEngine::new(store.clone(), store.clone(), store, blurbs);
    let app_state = Arc::new(AppState::new(engine));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/sessions/{id}/identity", post(identity_handler))
        .route(
            "/sessions/{id}/identity/register-pending",
            post(register_pending_handler),
        )
        .route("/sessions/{id}/parameters", post(parameters_handler))
        .route("/sessions/{id}/candidates", post(candidates_handler))
        .route("/sessions/{id}/checkin", post(checkin_handler))
        .route("/sessions/{id}/next", post(next_adventure_handler))
        .route("/sessions/{id}/history", get(history_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
