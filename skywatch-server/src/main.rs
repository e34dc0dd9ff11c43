/// SkyWatch backend: keeps the provider key server-side and proxies weather requests
mod config;
mod errors;
mod handlers;
mod rate_limit;
mod routes;

use anyhow::Context;
use skywatch_core::{OpenWeatherProvider, WeatherProvider};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::rate_limit::RateLimiter;
use crate::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(environment = %config.environment, "Configuration loaded");

    let provider: Option<Arc<dyn WeatherProvider>> = match &config.api_key {
        Some(key) => Some(Arc::new(OpenWeatherProvider::new(
            key.clone(),
            config.provider_base_url.as_str(),
            config.upstream_timeout,
        )?)),
        None => {
            warn!("OPENWEATHER_API_KEY is not set; weather endpoints will answer 500");
            None
        }
    };

    let limiter = RateLimiter::new(config.rate_limit.window, config.rate_limit.max_requests);
    let state = AppState::new(provider, limiter, config.environment.clone());
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("SkyWatch backend listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
