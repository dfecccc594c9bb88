//! Link Directory Backend
//!
//! Community-moderated link directory: submissions collect approval votes and
//! are merged into a versioned, deduplicated `sites.json` once they reach the
//! approval threshold.

mod api;
mod config;
mod errors;
mod models;
mod moderation;
mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use moderation::ModerationEngine;
use store::{IndexStore, SubmissionStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub moderation: Arc<ModerationEngine>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Link Directory Backend");
    tracing::info!("Main index: {:?}", config.index_path());
    tracing::info!("Submissions: {:?}", config.submissions_dir);
    tracing::info!("Approval threshold: {} votes", config.approval_threshold);
    tracing::info!("Bind address: {}", config.bind_addr);

    let state = build_state(config.clone()).await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open both stores and wire up the moderation engine.
pub async fn build_state(config: Config) -> Result<AppState, errors::AppError> {
    let submissions =
        Arc::new(SubmissionStore::open(&config.submissions_dir, config.io_retries).await?);
    let index = Arc::new(IndexStore::open(&config.index_path(), config.io_retries).await?);

    let moderation = Arc::new(ModerationEngine::new(
        submissions,
        index,
        config.approval_threshold,
    ));

    Ok(AppState {
        moderation,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    // API routes
    let api_routes = Router::new()
        // Submissions
        .route("/submit", post(api::submit))
        .route("/submissions", get(api::list_submissions))
        .route("/submissions/{id}", get(api::get_submission))
        // Moderation
        .route("/approve/{id}", post(api::approve_submission))
        .route("/reject/{id}", post(api::reject_submission));

    // Canonical index and health check
    let public_routes = Router::new()
        .route("/data/sites.json", get(api::get_sites))
        .route("/health", get(health_check));

    let mut router = Router::new().nest("/api", api_routes).merge(public_routes);

    // Static pages are a plain passthrough
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
