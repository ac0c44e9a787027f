//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when you want the REST server with OpenAPI/Swagger UI and nothing
//! else. The workspace's main `phr-run` binary serves the same router.

use api_rest::{router, AppState};
use phr_core::{CoreConfig, RestStore, StoreConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the PHR REST API server
///
/// # Environment Variables
/// - `PHR_STORE_URL`: Backend project URL (required)
/// - `PHR_PUBLISHABLE_KEY`: Client key for the backend (required)
/// - `PHR_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds (default: 15)
/// - `PHR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the store configuration is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PHR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_cfg = StoreConfig::from_env_values(
        std::env::var("PHR_STORE_URL").ok(),
        std::env::var("PHR_PUBLISHABLE_KEY").ok(),
        std::env::var("PHR_REQUEST_TIMEOUT_SECS").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(store_cfg.request_timeout())?);
    let store = Arc::new(RestStore::new(&store_cfg)?);

    tracing::info!(
        addr = %addr,
        store = %store_cfg.base_url(),
        "-- Starting PHR REST API"
    );

    let app = router(AppState::new(store, cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
