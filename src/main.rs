// Artist monitor binary
//
// Loads config.json (path overridable via the first CLI argument), then runs
// scan cycles forever. Configuration errors terminate before any network
// activity; everything after startup is logged and survived.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use artist_monitor::{HttpFetcher, Scanner, SeenSet, WebhookClient, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = load_config(&config_path)?;

    info!("artist monitor starting");
    info!("artist URL: {}", config.artist_url);
    info!(
        "polling every {}s, checking {} page(s) each scan",
        config.poll_interval().as_secs(),
        config.page_count()
    );
    info!(
        "max file attachment size: {} MB (0 = no limit)",
        config.max_file_size_mb
    );

    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let notifier = WebhookClient::new(&config.webhook_url, config.max_file_bytes())?;
    let seen = SeenSet::load("seen.json");

    let mut scanner = Scanner::new(config, fetcher, notifier, seen);
    scanner.run().await;
    Ok(())
}
