//! Edgeguard Server entry point.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use edgeguard_server::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    if let Err(e) = run(config).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let store = edgeguard_server::build_store(&config).await?;
    let state = edgeguard_server::build_state(&config, store)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backends = state.pool().len(),
        store = state.store().kind(),
        rate_window = config.rate_window,
        rate_threshold = config.rate_threshold,
        hourly_stats = config.hourly_stats,
        "Edgeguard starting",
    );

    let app = edgeguard_server::router(state);

    let host = config
        .host
        .parse()
        .with_context(|| format!("invalid host: {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "Edgeguard ready");

    edgeguard_http::serve(listener, app, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Edgeguard shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install signal handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
