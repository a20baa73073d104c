mod config;
mod error;
mod proxy;
mod rate_limit;
mod routes;

use config::Config;
use rate_limit::RateLimiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    if config.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; /api/chat will answer 500 until it is configured");
    }
    info!("Using OpenAI model: {}", config.model);
    info!("Allowing CORS origin: {:?}", config.cors_origin);

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window,
    ));
    limiter.spawn_cleanup();

    let app = routes::router(&config, limiter);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://localhost:{}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
