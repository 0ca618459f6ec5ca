use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tasktrack::config::Config;
use tasktrack::web;
use tasktrack::{HttpTaskClient, PageController, TaskStore, ViewController};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level);

    let client =
        HttpTaskClient::with_timeout(&config.api_url, Duration::from_secs(config.timeout_secs))
            .with_context(|| format!("configuring task service at {}", config.api_url))?;
    let api = client.base_url().to_string();
    let store = Arc::new(TaskStore::new(client));

    // the page renders as "loading" until the first fetch lands
    let initial = Arc::clone(&store);
    tokio::spawn(async move {
        if let Err(err) = initial.load().await {
            error!(error = %err, "initial task load failed");
        }
    });

    let state = PageController::new(Arc::clone(&store), ViewController::new(config.per_page));
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!(addr = %config.listen, %api, "tasktrack running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.detach();
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "listening for shutdown signal failed");
    }
}
