//! Chirp - a small Twitter-style microblogging service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Simulator REST API (/msgs, /register, /latest, /fllws)   │
//! │  - Page endpoints (timelines, follows, saved cheeps)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Pagination, timeline assembly                            │
//! │  - Existence checks with descriptive failures               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Author and cheep repositories                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for the simulator and page endpoints
//! - `service`: Business logic layer
//! - `data`: Database and repository layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use service::{AuthorService, CheepService};

/// Application state shared across all handlers
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool and repositories
    pub db: Arc<data::Database>,

    /// Simulator bookkeeping counter, reported by `GET /latest`
    pub latest: Arc<AtomicI64>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Connects to the SQLite database (creating it if absent) and runs
    /// pending migrations.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            latest: Arc::new(AtomicI64::new(-1)),
        })
    }

    /// Author service bound to this state's database
    pub fn author_service(&self) -> AuthorService {
        AuthorService::new(self.db.authors())
    }

    /// Cheep service bound to this state's database
    pub fn cheep_service(&self) -> CheepService {
        CheepService::new(self.db.cheeps(), self.author_service())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::simulator_router())
        .merge(api::pages_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
