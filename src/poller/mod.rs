pub mod scheduler;

pub use scheduler::{Scheduler, SchedulerStatus};

use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::db::models::{Game, GameState, Prop, TeamSide};
use crate::db::{Database, Store};
use crate::error::{PipelineError, Result};
use crate::grading::{auto_grade_from_live_data, grade_game, AutoGradeReport, GradeReport};
use crate::live_scores::snapshot::{self, CompletionStatus, GameSnapshot};
use crate::live_scores::ScoreFeed;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub games_polled: usize,
    pub games_failed: usize,
    pub games_completed: usize,
}

/// Result of polling one game.
#[derive(Debug, Clone, Serialize)]
pub struct PollOutcome {
    pub game_id: i64,
    pub state: GameState,
    pub status: CompletionStatus,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub props_updated: usize,
    /// True only on the poll that observed the transition to final
    pub completed_now: bool,
    pub auto_grade: Option<AutoGradeReport>,
    pub grade: Option<GradeReport>,
    pub grading_error: Option<String>,
}

/// Live fields written for one game in a single transaction.
#[derive(Debug, Clone)]
struct LiveUpdate {
    state: GameState,
    status: CompletionStatus,
    team_a_score: Option<i32>,
    team_b_score: Option<i32>,
    props_updated: usize,
    completed_now: bool,
}

/// Game's live fields plus every prop's live values and correct answers.
#[derive(Debug, Clone, Serialize)]
pub struct LiveStats {
    pub game: Game,
    pub props: Vec<Prop>,
}

pub fn live_stats(db: &Database, game_id: i64) -> Result<LiveStats> {
    db.read(|store| {
        let game = store.require_game(game_id)?;
        let props = store.props_for_game(game_id)?;
        Ok(LiveStats { game, props })
    })
}

/// Fetches snapshots for in-flight games, writes live fields, and runs
/// grading once a game goes final.
pub struct Poller {
    db: Database,
    feed: Arc<dyn ScoreFeed>,
    fetch_timeout: Duration,
}

impl Poller {
    pub fn new(db: Database, feed: Arc<dyn ScoreFeed>, fetch_timeout: Duration) -> Self {
        Poller {
            db,
            feed,
            fetch_timeout,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn feed(&self) -> &Arc<dyn ScoreFeed> {
        &self.feed
    }

    /// One pass over every started, unfinished, feed-linked game. Games are
    /// processed one after another; a failure only counts against that game.
    pub async fn poll_all_active_games(&self) -> PollSummary {
        let mut summary = PollSummary::default();

        let games = match self.db.read(|store| store.list_games_to_poll(Utc::now())) {
            Ok(games) => games,
            Err(e) => {
                error!("Failed to load games to poll: {}", e);
                return summary;
            }
        };
        info!(
            "Polling {} active games via {}",
            games.len(),
            self.feed.name()
        );

        for game in &games {
            match self.poll_game(game).await {
                Ok(outcome) => {
                    summary.games_polled += 1;
                    if outcome.completed_now {
                        summary.games_completed += 1;
                    }
                }
                Err(e) => {
                    warn!("Poll failed for game {} ({}): {}", game.id, game.name, e);
                    summary.games_failed += 1;
                }
            }
        }

        info!(
            "Polling complete: {} polled, {} failed, {} completed",
            summary.games_polled, summary.games_failed, summary.games_completed
        );
        summary
    }

    /// Poll a single game on demand, regardless of its start time or state.
    pub async fn manually_trigger_poll(&self, game_id: i64) -> Result<PollOutcome> {
        let game = self.db.read(|store| store.require_game(game_id))?;
        if game.external_id.is_none() {
            return Err(PipelineError::Validation(format!(
                "game {} has no external game ID",
                game_id
            )));
        }
        self.poll_game(&game).await
    }

    async fn poll_game(&self, game: &Game) -> Result<PollOutcome> {
        let external_id = game.external_id.as_deref().ok_or_else(|| {
            PipelineError::Validation(format!("game {} has no external game ID", game.id))
        })?;

        let snapshot =
            match tokio::time::timeout(self.fetch_timeout, self.feed.fetch_snapshot(external_id))
                .await
            {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    return Err(PipelineError::FeedUnavailable(format!(
                        "no data for event {}",
                        external_id
                    )))
                }
                Err(_) => {
                    return Err(PipelineError::FeedUnavailable(format!(
                        "event {} timed out after {:?}",
                        external_id, self.fetch_timeout
                    )))
                }
            };

        let update = self
            .db
            .write(|store| apply_snapshot(store, game.id, &snapshot))?;
        debug!(
            "Game {} live update: {:?} {:?}-{:?}, {} props",
            game.id, update.status, update.team_a_score, update.team_b_score, update.props_updated
        );

        let mut outcome = PollOutcome {
            game_id: game.id,
            state: update.state,
            status: update.status,
            team_a_score: update.team_a_score,
            team_b_score: update.team_b_score,
            props_updated: update.props_updated,
            completed_now: update.completed_now,
            auto_grade: None,
            grade: None,
            grading_error: None,
        };

        if update.completed_now {
            info!("Game {} ({}) has completed, grading", game.id, game.name);
            self.grade_completed(&mut outcome);
        }
        Ok(outcome)
    }

    /// Auto-grade then grade. Failures are recorded on the outcome; the
    /// completed state stays committed.
    fn grade_completed(&self, outcome: &mut PollOutcome) {
        let game_id = outcome.game_id;
        match auto_grade_from_live_data(&self.db, game_id) {
            Ok(report) => outcome.auto_grade = Some(report),
            Err(e) => {
                error!("Auto-grading failed for game {}: {}", game_id, e);
                outcome.grading_error = Some(e.to_string());
                return;
            }
        }
        match grade_game(&self.db, game_id) {
            Ok(report) => outcome.grade = Some(report),
            Err(e) => {
                error!("Grading failed for game {}: {}", game_id, e);
                outcome.grading_error = Some(e.to_string());
            }
        }
    }
}

/// Write one snapshot's live fields. The game row is re-read inside the
/// transaction so concurrent polls agree on which one saw completion.
fn apply_snapshot(store: &Store<'_>, game_id: i64, snapshot: &GameSnapshot) -> Result<LiveUpdate> {
    let game = store.require_game(game_id)?;
    let props = store.props_for_game(game_id)?;

    let status = snapshot::completion_status(snapshot);
    let is_final = status == CompletionStatus::Final;
    let scores = snapshot::team_scores(snapshot);
    let names = snapshot::team_display_names(snapshot);
    let winner = snapshot::winning_team(snapshot);

    let (team_a_score, team_b_score) = match props.iter().find_map(|p| match p {
        Prop::WinnerLoser(wl) => Some(wl),
        _ => None,
    }) {
        Some(wl) => matchup_scores(&wl.favorite, &wl.underdog, &scores, &names),
        None => (None, None),
    };
    if !scores.is_empty() && (team_a_score.is_none() || team_b_score.is_none()) {
        debug!(
            "Game {}: could not map feed teams {:?} onto both sides",
            game_id,
            snapshot::competitor_order(snapshot)
        );
    }

    let state = if is_final || game.state == GameState::Completed {
        GameState::Completed
    } else {
        GameState::Polling
    };
    store.update_game_live(game_id, state, team_a_score, team_b_score)?;
    let game_a = team_a_score.or(game.team_a_score);
    let game_b = team_b_score.or(game.team_b_score);

    let mut props_updated = 0;
    for prop in &props {
        match prop {
            Prop::OverUnder(p) => {
                let (Some(player), Some(stat)) = (p.player_name.as_deref(), p.stat_type.as_deref())
                else {
                    continue;
                };
                if let Some(value) = snapshot::player_stat(snapshot, player, stat) {
                    store.update_over_under_live(p.id, value)?;
                    props_updated += 1;
                }
            }
            Prop::WinnerLoser(p) => {
                let (favorite, underdog) = matchup_scores(&p.favorite, &p.underdog, &scores, &names);
                let favorite = favorite.or(game_a);
                let underdog = underdog.or(game_b);
                let winning = if is_final { winner.as_deref() } else { None };
                store.update_winner_loser_live(p.id, favorite, underdog, winning)?;
                props_updated += 1;
            }
            Prop::AnytimeTd(p) => {
                let mut touched = false;
                for option in &p.options {
                    if let Some(tds) = snapshot::anytime_td_count(snapshot, &option.player_name) {
                        store.update_anytime_td_option_live(option.id, tds)?;
                        touched = true;
                    }
                }
                if touched {
                    props_updated += 1;
                }
            }
            Prop::VariableOption(_) => {}
        }
    }

    Ok(LiveUpdate {
        state,
        status,
        team_a_score: game_a,
        team_b_score: game_b,
        props_updated,
        completed_now: is_final && game.state != GameState::Completed,
    })
}

/// Scores for both sides of a matchup. A feed team already matched by the
/// favorite never also matches the underdog.
fn matchup_scores(
    favorite: &TeamSide,
    underdog: &TeamSide,
    scores: &BTreeMap<String, i32>,
    names: &HashMap<String, String>,
) -> (Option<i32>, Option<i32>) {
    let favorite_team = side_team(favorite, scores, names);
    let underdog_team = side_team(underdog, scores, names).filter(|t| Some(*t) != favorite_team);
    let score = |team: Option<&str>| team.and_then(|t| scores.get(t).copied());
    (score(favorite_team), score(underdog_team))
}

/// Feed abbreviation for one side: by team id first, then by display name
/// containment in either direction.
fn side_team<'a>(
    side: &TeamSide,
    scores: &'a BTreeMap<String, i32>,
    names: &HashMap<String, String>,
) -> Option<&'a str> {
    if let Some(team_id) = side.team_id.as_deref() {
        let by_id = scores
            .keys()
            .find(|abbrev| abbrev.eq_ignore_ascii_case(team_id.trim()));
        if let Some(abbrev) = by_id {
            return Some(abbrev.as_str());
        }
    }

    let wanted = side.name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    scores
        .keys()
        .find(|abbrev| {
            names.get(*abbrev).is_some_and(|full| {
                let full = full.trim().to_lowercase();
                !full.is_empty() && (full.contains(&wanted) || wanted.contains(&full))
            })
        })
        .map(String::as_str)
}
