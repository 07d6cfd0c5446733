use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use props_grader::api::{self, AppState};
use props_grader::config::Config;
use props_grader::db::Database;
use props_grader::live_scores::{EspnFeed, ScoreFeed};
use props_grader::poller::{Poller, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
    let feed: Arc<dyn ScoreFeed> = Arc::new(EspnFeed::new(Some(&config.feed_base_url), fetch_timeout)?);
    info!("Score feed: {} ({})", feed.name(), config.feed_base_url);

    let poller = Arc::new(Poller::new(db, feed, fetch_timeout));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&poller),
        Duration::from_secs(config.poll_interval_secs),
    ));
    if config.scheduler_enabled {
        scheduler.start();
    } else {
        info!("Scheduler disabled; polls run only on demand");
    }

    // Start the operator API
    let app = api::router(AppState {
        poller,
        scheduler: Arc::clone(&scheduler),
    });
    let addr: SocketAddr = config.api_addr.parse()?;
    info!("Operator API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve until Ctrl-C, then let any in-flight poll pass finish
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;
    scheduler.stop().await;

    Ok(())
}
