use clap::Parser;
use std::net::SocketAddr;

use crate::live_scores::espn::DEFAULT_BASE_URL;

/// Props league live-data poller and grading engine
#[derive(Parser, Debug, Clone)]
#[command(name = "props-grader", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "props.db")]
    pub database_path: String,

    /// Operator API listen address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    pub api_addr: String,

    /// Score feed base URL (ESPN site API for one league)
    #[arg(long, env = "FEED_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub feed_base_url: String,

    /// Seconds between scheduled poll passes
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "120")]
    pub poll_interval_secs: u64,

    /// Per-request timeout for score feed fetches, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "10")]
    pub fetch_timeout_secs: u64,

    /// Run the recurring poll job (manual polls via the API work either way)
    #[arg(
        long,
        env = "SCHEDULER_ENABLED",
        default_value = "true",
        action = clap::ArgAction::Set
    )]
    pub scheduler_enabled: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be positive");
        }
        if self.fetch_timeout_secs >= self.poll_interval_secs {
            anyhow::bail!(
                "fetch_timeout_secs ({}) must be shorter than poll_interval_secs ({})",
                self.fetch_timeout_secs,
                self.poll_interval_secs
            );
        }
        if self.api_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("api_addr '{}' is not a valid socket address", self.api_addr);
        }
        let feed_url = url::Url::parse(&self.feed_base_url)
            .map_err(|e| anyhow::anyhow!("feed_base_url '{}' is invalid: {}", self.feed_base_url, e))?;
        if !matches!(feed_url.scheme(), "http" | "https") {
            anyhow::bail!("feed_base_url must be an http(s) URL");
        }
        Ok(())
    }
}
