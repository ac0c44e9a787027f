use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use phr_core::{CoreConfig, RestStore, StoreConfig};

/// Main entry point for the PHR application
///
/// Connects to the hosted backend and serves the REST API (with Swagger UI at `/swagger-ui`)
/// until interrupted.
///
/// # Environment Variables
/// - `PHR_STORE_URL`: Backend project URL (required)
/// - `PHR_PUBLISHABLE_KEY`: Client key for the backend (required)
/// - `PHR_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds (default: 15)
/// - `PHR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
///
/// # Returns
/// * `Ok(())` - If the server runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("phr=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PHR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_cfg = StoreConfig::from_env_values(
        std::env::var("PHR_STORE_URL").ok(),
        std::env::var("PHR_PUBLISHABLE_KEY").ok(),
        std::env::var("PHR_REQUEST_TIMEOUT_SECS").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(store_cfg.request_timeout())?);
    let store = Arc::new(RestStore::new(&store_cfg)?);

    tracing::info!(
        addr = %rest_addr,
        store = %store_cfg.base_url(),
        timeout_secs = cfg.request_timeout().as_secs(),
        "++ Starting PHR REST server"
    );

    let app = router(AppState::new(store, cfg));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("PHR REST server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
