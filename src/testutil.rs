//! Fixture builders shared by the in-module test suites.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::db::models::*;
use crate::live_scores::{GameSnapshot, RosterPlayer, ScoreFeed, ScoreboardEvent};

pub fn game(external_id: Option<&str>, start_time: DateTime<Utc>) -> Game {
    Game {
        id: 0,
        league_id: 1,
        name: "Ravens @ Chiefs".into(),
        external_id: external_id.map(str::to_string),
        state: GameState::Scheduled,
        start_time,
        team_a_score: None,
        team_b_score: None,
        prop_limit: 2,
        graded: false,
    }
}

pub fn player(name: &str) -> Player {
    Player {
        id: 0,
        league_id: 1,
        name: name.into(),
        points: 0.0,
    }
}

pub fn winner_loser(
    game_id: i64,
    favorite: (&str, Option<&str>, f64),
    underdog: (&str, Option<&str>, f64),
) -> WinnerLoserProp {
    let side = |(name, team_id, points): (&str, Option<&str>, f64)| TeamSide {
        name: name.into(),
        team_id: team_id.map(str::to_string),
        points,
        score: None,
    };
    WinnerLoserProp {
        id: 0,
        game_id,
        question: "Who wins?".into(),
        is_mandatory: true,
        favorite: side(favorite),
        underdog: side(underdog),
        winning_team_id: None,
        correct_answer: None,
    }
}

pub fn over_under(game_id: i64, line: f64, over_points: f64, under_points: f64) -> OverUnderProp {
    OverUnderProp {
        id: 0,
        game_id,
        question: "Mahomes passing yards".into(),
        is_mandatory: false,
        player_name: Some("Patrick Mahomes".into()),
        player_id: None,
        stat_type: Some("passing_yards".into()),
        line_value: Some(line),
        current_value: None,
        over_points,
        under_points,
        correct_answer: None,
    }
}

pub fn variable_option(game_id: i64, choices: &[(&str, f64)]) -> VariableOptionProp {
    VariableOptionProp {
        id: 0,
        game_id,
        question: "First scoring play?".into(),
        is_mandatory: false,
        options: choices
            .iter()
            .map(|(choice, points)| VariableOption {
                id: 0,
                choice: (*choice).into(),
                points: *points,
            })
            .collect(),
        correct_answer: None,
    }
}

pub fn anytime_td(game_id: i64, options: &[(&str, f64, f64)]) -> AnytimeTdProp {
    AnytimeTdProp {
        id: 0,
        game_id,
        question: "Anytime touchdown scorer".into(),
        is_mandatory: false,
        options: options
            .iter()
            .map(|(name, td_line, points)| AnytimeTdOption {
                id: 0,
                player_name: (*name).into(),
                td_line: *td_line,
                points: *points,
                current_tds: None,
            })
            .collect(),
        correct_answer: None,
    }
}

/// An ESPN-style game summary: Chiefs (KC) vs Ravens (BAL) with a small
/// box score.
pub fn summary(status_name: &str, completed: bool, kc_score: i32, bal_score: i32) -> Value {
    json!({
        "header": {
            "id": "401671789",
            "competitions": [{
                "status": {
                    "type": {
                        "name": status_name,
                        "state": if completed { "post" } else { "in" },
                        "completed": completed
                    }
                },
                "competitors": [
                    {
                        "homeAway": "home",
                        "score": kc_score.to_string(),
                        "team": { "id": "12", "abbreviation": "KC", "displayName": "Kansas City Chiefs" }
                    },
                    {
                        "homeAway": "away",
                        "score": bal_score.to_string(),
                        "team": { "id": "33", "abbreviation": "BAL", "displayName": "Baltimore Ravens" }
                    }
                ]
            }]
        },
        "boxscore": {
            "players": [
                {
                    "team": { "abbreviation": "KC" },
                    "statistics": [
                        {
                            "name": "passing",
                            "keys": ["completions/passingAttempts", "passingYards", "passingTouchdowns", "interceptions"],
                            "athletes": [
                                { "athlete": { "id": "3139477", "displayName": "Patrick Mahomes" },
                                  "stats": ["20/28", "291", "1", "1"] }
                            ]
                        },
                        {
                            "name": "rushing",
                            "keys": ["rushingAttempts", "rushingYards", "rushingTouchdowns"],
                            "athletes": [
                                { "athlete": { "id": "3139477", "displayName": "Patrick Mahomes" },
                                  "stats": ["4", "22", "1"] }
                            ]
                        },
                        {
                            "name": "receiving",
                            "keys": ["receptions", "receivingYards", "receivingTouchdowns"],
                            "athletes": [
                                { "athlete": { "id": "15847", "displayName": "Travis Kelce" },
                                  "stats": ["3", "34", "1"] }
                            ]
                        }
                    ]
                },
                {
                    "team": { "abbreviation": "BAL" },
                    "statistics": [
                        {
                            "name": "rushing",
                            "keys": ["rushingAttempts", "rushingYards", "rushingTouchdowns"],
                            "athletes": [
                                { "athlete": { "id": "3043078", "displayName": "Derrick Henry" },
                                  "stats": ["13", "46", "0"] }
                            ]
                        }
                    ]
                }
            ]
        }
    })
}

/// In-memory score feed: serves whatever summary was last set per event and
/// counts fetches.
#[derive(Default)]
pub struct ScriptedFeed {
    snapshots: Mutex<HashMap<String, Value>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedFeed {
    /// A feed whose every fetch first sleeps for `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        ScriptedFeed {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn set(&self, external_id: &str, summary: Value) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(external_id.to_string(), summary);
    }

    pub fn clear(&self, external_id: &str) {
        self.snapshots.lock().unwrap().remove(external_id);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreFeed for ScriptedFeed {
    async fn fetch_snapshot(&self, external_id: &str) -> Option<GameSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let raw = self.snapshots.lock().unwrap().get(external_id).cloned();
        raw.map(GameSnapshot::new)
    }

    async fn roster(&self, external_id: &str, positions: &[String]) -> Vec<RosterPlayer> {
        if !self.snapshots.lock().unwrap().contains_key(external_id) {
            return vec![];
        }
        let all = vec![
            RosterPlayer {
                name: "Patrick Mahomes".into(),
                id: "3139477".into(),
                position: Some("QB".into()),
            },
            RosterPlayer {
                name: "Travis Kelce".into(),
                id: "15847".into(),
                position: Some("TE".into()),
            },
        ];
        all.into_iter()
            .filter(|p| {
                positions.is_empty()
                    || p.position
                        .as_deref()
                        .is_some_and(|pos| positions.iter().any(|w| w.eq_ignore_ascii_case(pos)))
            })
            .collect()
    }

    async fn scoreboard(&self, _date: Option<NaiveDate>) -> Vec<ScoreboardEvent> {
        vec![]
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
