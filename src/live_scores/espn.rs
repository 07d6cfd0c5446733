use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::provider::ScoreFeed;
use super::snapshot::{self, GameSnapshot, RosterPlayer, ScoreboardEvent};

pub const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";

/// Score feed backed by ESPN's public site API.
pub struct EspnFeed {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
}

impl EspnFeed {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(EspnFeed {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    async fn fetch_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut url =
            Url::parse(&format!("{}/{}", self.base_url, path)).context("Invalid ESPN URL")?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!("Fetching {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("ESPN request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("ESPN error: {}", resp.status());
        }

        resp.json().await.context("Failed to parse ESPN response")
    }

    async fn fetch_summary(&self, external_id: &str) -> Result<GameSnapshot> {
        let raw = self.fetch_json("summary", &[("event", external_id)]).await?;
        if !raw["header"].is_object() {
            anyhow::bail!("summary for event {} has no header", external_id);
        }
        Ok(GameSnapshot::new(raw))
    }
}

#[async_trait]
impl ScoreFeed for EspnFeed {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn fetch_snapshot(&self, external_id: &str) -> Option<GameSnapshot> {
        match self.fetch_summary(external_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("ESPN summary for event {} unavailable: {:#}", external_id, e);
                None
            }
        }
    }

    async fn roster(&self, external_id: &str, positions: &[String]) -> Vec<RosterPlayer> {
        let Some(summary) = self.fetch_snapshot(external_id).await else {
            return vec![];
        };
        let team_ids = snapshot::competitor_team_ids(&summary);

        let fetches = team_ids.iter().map(|team_id| async move {
            let path = format!("teams/{}/roster", team_id);
            (team_id, self.fetch_json(&path, &[]).await)
        });
        let results = futures_util::future::join_all(fetches).await;

        let mut rosters = Vec::with_capacity(results.len());
        for (team_id, result) in results {
            match result {
                Ok(raw) => rosters.push(raw),
                Err(e) => warn!("ESPN roster for team {} unavailable: {:#}", team_id, e),
            }
        }
        snapshot::parse_roster(&rosters, positions)
    }

    async fn scoreboard(&self, date: Option<NaiveDate>) -> Vec<ScoreboardEvent> {
        let dates = date.map(|d| d.format("%Y%m%d").to_string());
        let query: Vec<(&str, &str)> = dates.iter().map(|d| ("dates", d.as_str())).collect();
        match self.fetch_json("scoreboard", &query).await {
            Ok(raw) => snapshot::parse_scoreboard(&raw),
            Err(e) => {
                warn!("ESPN scoreboard unavailable: {:#}", e);
                vec![]
            }
        }
    }
}
