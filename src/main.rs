//! Review QR Server - Main Application Entry Point
//!
//! Business owners register a business, receive a printable QR code that
//! sends customers to a review landing page, and watch how often and when the
//! code gets scanned.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: JSON collection files behind the `RecordStore` trait
//! - **QR Artifacts**: one PNG per business, error-correction level H
//! - **Identity**: forwarded by an authenticating proxy, see `middleware::identity`
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load and validate configuration from environment variables
//! 2. Open the record store
//! 3. Prepare the QR artifact directory
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod store;

#[cfg(test)]
mod tests;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{services::qr_service::QrProvisioner, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = store::open(&config).await?;

    let qr = QrProvisioner::new(&config.qr_dir, config.qr_settings()).await?;
    tracing::info!(path = %qr.dir().display(), "QR artifact directory ready");

    let port = config.server_port;
    let app = build_router(AppState::new(store, qr, config));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble every route with its middleware.
pub(crate) fn build_router(state: AppState) -> Router {
    // Routes that act on behalf of an identified owner or admin
    let owner_routes = Router::new()
        .route(
            "/api/businesses",
            post(handlers::businesses::create_business).get(handlers::businesses::list_businesses),
        )
        .route(
            "/api/businesses/{id}",
            axum::routing::delete(handlers::businesses::delete_business),
        )
        // Link-style delete kept for printed dashboards that use plain anchors
        .route(
            "/api/businesses/{id}/delete",
            get(handlers::businesses::delete_business),
        )
        .route(
            "/api/businesses/{id}/qr",
            get(handlers::businesses::get_qr_code),
        )
        .route(
            "/api/owner/analytics",
            get(handlers::analytics::owner_analytics),
        )
        .route(
            "/api/owner/scan-history/{id}",
            get(handlers::analytics::scan_history),
        )
        .route(
            "/api/admin/summary",
            get(handlers::analytics::admin_summary),
        )
        .route_layer(axum_middleware::from_fn(
            middleware::identity::identity_middleware,
        ));

    // Dashboards poll these from other origins
    let polling_routes = Router::new()
        .route("/api/scans/{id}", get(handlers::analytics::scan_count))
        .route(
            "/api/analytics/{id}",
            get(handlers::analytics::analytics_series),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET])
                .allow_origin(Any),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/r/{id}", get(handlers::landing::landing_page))
        .route("/redirect-review", get(handlers::landing::redirect_review))
        .merge(polling_routes)
        .merge(owner_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
