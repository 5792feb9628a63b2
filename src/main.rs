//! Study Journal Backend
//!
//! Local-first journal and flashcard service: SQLite cache as the source of
//! truth, with an optional REST mirror written in the background.

mod api;
mod cache;
mod config;
mod errors;
mod models;
mod remote;
mod store;
mod streak;
mod sync;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::LocalCache;
use config::Config;
use sync::{LogSink, RemoteDispatcher, SyncOrchestrator};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncOrchestrator>,
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

    tracing::info!("Starting Study Journal Backend");
    tracing::info!("Cache path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Open the durable cache
    let pool = cache::init_cache(&config.db_path).await?;
    let cache = LocalCache::new(pool);

    // Remote mirror is optional; without one every write stays local
    let mirror = remote::connect(config.remote.as_ref());
    let dispatcher = RemoteDispatcher::new(mirror, Arc::new(LogSink));

    let sync = SyncOrchestrator::initialize(cache, dispatcher).await;
    if sync.is_online() {
        tracing::info!("Remote mirror enabled, hydrating in background");
    } else {
        tracing::warn!("No remote mirror configured (STUDY_REMOTE_URL/STUDY_REMOTE_KEY). Running offline.");
    }

    let state = AppState { sync };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/state", get(api::get_state))
        // Journal
        .route("/logs", get(api::list_entries).post(api::create_entry))
        .route(
            "/logs/{id}",
            get(api::get_entry)
                .put(api::update_entry)
                .delete(api::delete_entry),
        )
        .route("/logs/{id}/edit", post(api::begin_edit))
        .route("/edit", get(api::get_edit).delete(api::cancel_edit))
        // Cards
        .route("/cards", get(api::list_cards).post(api::create_card))
        .route(
            "/cards/{id}",
            get(api::get_card)
                .put(api::update_card)
                .delete(api::delete_card),
        )
        .route("/deck", get(api::get_deck))
        .route("/deck/next", post(api::next_card))
        .route("/deck/prev", post(api::prev_card))
        // Views
        .route("/search", get(api::search))
        .route("/streak", get(api::get_streak))
        // Backup and sync
        .route("/backup", get(api::export_backup).post(api::import_backup))
        .route("/sync", post(api::sync_remote));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
