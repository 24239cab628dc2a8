mod config;
mod errors;
mod export;
mod llm_client;
mod rams;
mod rate_limit;
mod routes;
mod state;
mod toolbox;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::renderer::ChromiumRenderer;
use crate::llm_client::LlmClient;
use crate::rate_limit::FixedWindowLimiter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RAMS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.llm.clone()).context("Failed to build HTTP client")?;
    info!(
        "LLM client initialized (provider: {}, model: {})",
        llm.provider(),
        llm.model()
    );
    if config.llm.api_key.is_none() {
        warn!(
            "No API key configured for provider '{}': generation will serve fallback content",
            config.llm.provider
        );
    }

    // In-memory fixed window; counts reset on restart.
    let rate_limiter = Arc::new(FixedWindowLimiter::new(
        config.rate_limit_window,
        config.rate_limit_max_requests,
    ));
    info!(
        "Rate limiter: {} requests per {}s per client",
        config.rate_limit_max_requests,
        config.rate_limit_window.as_secs()
    );

    let pdf_renderer = Arc::new(ChromiumRenderer::new(
        config.chrome_bin.clone(),
        config.chrome_extra_args.clone(),
        config.pdf_render_timeout,
    ));
    info!("PDF renderer: {}", config.chrome_bin);

    // Build app state
    let state = AppState {
        llm,
        config: config.clone(),
        rate_limiter,
        pdf_renderer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the dashboard domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
