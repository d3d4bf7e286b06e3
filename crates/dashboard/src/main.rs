pub mod feed;
pub mod reports;
pub mod session;
pub mod shared;
pub mod worker;

use std::sync::Arc;

use session::DashboardSession;
use worker::PollWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("dashboard.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;
    tracing::info!(
        orders_url = %config.webhook.orders_url,
        interval_seconds = config.polling.interval_seconds,
        filter = config.feed.active_filter.code(),
        "order dashboard starting"
    );

    let api = Arc::new(feed::client::WebhookClient::new(&config));
    let session = DashboardSession::new(config.feed.active_filter);
    let mut worker = PollWorker::new(api, session, config.polling.clone());

    // First load is visible: a dead webhook should be obvious at startup,
    // not discovered thirty seconds in.
    if let Err(err) = worker.refresh().await {
        tracing::error!("initial load failed, will keep polling: {err}");
    }

    worker.run_loop().await;

    Ok(())
}
