//! TrustPaper Certificate Backend
//!
//! A REST backend for student signup, admin approval and graded certificate images,
//! with SQLite persistence.

mod api;
mod auth;
mod certificate;
mod config;
mod db;
mod errors;
mod grade;
mod mail;
mod models;
mod verify;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use certificate::FontSet;
use config::Config;
use db::Repository;
use mail::{LogMailer, Mailer};
use verify::{KeywordVerifier, SchoolVerifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub fonts: Arc<FontSet>,
    pub verifier: Arc<dyn SchoolVerifier>,
    pub mailer: Arc<dyn Mailer>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TrustPaper Certificate Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin key is not configured
    if config.admin_key.is_none() {
        tracing::warn!("No admin key configured (CERT_ADMIN_KEY). Admin routes are open!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Load certificate fonts once; renders share them read-only
    let fonts = FontSet::load(&config.font_paths);
    if fonts.is_builtin() {
        tracing::warn!("No TrueType font could be loaded, using the builtin bitmap face");
    }

    // Create application state
    let state = AppState {
        repo,
        fonts: Arc::new(fonts),
        verifier: Arc::new(KeywordVerifier::new(config.school_keywords.clone())),
        mailer: Arc::new(LogMailer),
        config: Arc::new(config.clone()),
    };

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

    // Clone the admin key for the auth layer
    let admin_key = state.config.admin_key.clone();

    // Admin routes, guarded by the pre-shared key
    let admin_routes = Router::new()
        .route("/dashboard", get(api::dashboard))
        .route("/notifications", get(api::list_notifications))
        .route("/notifications/{id}/approve", post(api::approve_notification))
        .route("/notifications/{id}/reject", post(api::reject_notification))
        .route("/students", get(api::list_students))
        .route("/students/{name}/{roll_no}", delete(api::remove_student))
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(admin_key.clone(), req, next)
        }));

    // Student routes; handlers authenticate through the session extractor
    let api_routes = Router::new()
        .route("/signup", post(api::signup))
        .route("/signin", post(api::signin))
        .route("/logout", post(api::logout))
        .route("/me", get(api::me))
        .route("/me/marks", put(api::update_marks))
        .route("/me/designs", get(api::list_designs))
        .route("/me/designs", post(api::create_design))
        .route("/me/certificate/preview", post(api::preview_certificate))
        .route("/me/certificate/download", post(api::download_certificate))
        .nest("/admin", admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
