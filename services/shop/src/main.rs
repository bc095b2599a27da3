use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shop::{AppConfig, build_state, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shop service");

    let config = AppConfig::from_env()?;
    if config.uses_default_secret() {
        warn!("SHOP_SESSION_SECRET is not set; using the development secret");
    }

    let bind_address = config.bind_address.clone();
    let state = build_state(config).await?;
    info!("Shop service initialized successfully");

    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Shop service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shop service stopped");
    Ok(())
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, starting graceful shutdown");
}
