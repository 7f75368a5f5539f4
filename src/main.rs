use anyhow::Context;
use tracing_subscriber::EnvFilter;

use newsrec_api::{
    api::{create_router, AppState},
    config::Config,
    repositories::redis::create_redis_client,
    services,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let client = create_redis_client(&config.redis_url).context("Invalid REDIS_URL")?;

    let recommenders = services::build_recommenders(&config, &client);
    let (shown_posts, shown_posts_writer) = services::build_shown_posts_handler(&config, &client);
    let state = AppState::new(
        recommenders,
        shown_posts,
        config.default_limit,
        config.max_limit,
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shown_posts_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
