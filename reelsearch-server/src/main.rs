mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use reelsearch_core::{bootstrap, Config, MovieSearch};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // The only .env load. Done before logging init so RUST_LOG from it applies.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let ready = bootstrap(&config).await.context("bootstrap failed")?;
    tracing::info!(
        collection = %ready.collection,
        created = ready.created,
        inserted = ready.import.inserted,
        existing = ready.import.existing,
        "{}",
        ready.phase()
    );

    let gateway = Arc::new(ready.gateway);
    let search = MovieSearch::new(Arc::clone(&gateway), ready.collection, config.search_limit);
    let app = ui::router(search).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    gateway.close().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt received, shutting down");
}
