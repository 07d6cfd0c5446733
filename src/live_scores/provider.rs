use async_trait::async_trait;
use chrono::NaiveDate;

use super::snapshot::{GameSnapshot, RosterPlayer, ScoreboardEvent};

/// Trait that every score feed must implement.
///
/// Feeds never fail loudly: network errors, timeouts and malformed bodies
/// are logged by the implementation and surface as `None` / empty lists.
#[async_trait]
pub trait ScoreFeed: Send + Sync {
    /// Fetch the current summary for one event.
    async fn fetch_snapshot(&self, external_id: &str) -> Option<GameSnapshot>;

    /// Players on both rosters of an event, optionally filtered by position.
    async fn roster(&self, external_id: &str, positions: &[String]) -> Vec<RosterPlayer>;

    /// Events on the given day (the feed's current day when `None`).
    async fn scoreboard(&self, date: Option<NaiveDate>) -> Vec<ScoreboardEvent>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
