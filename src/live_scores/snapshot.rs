use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Raw game-summary payload as returned by the score feed.
///
/// All accessors below are pure and tolerate missing or oddly-typed fields:
/// anything that cannot be read is simply absent from the result.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    raw: Value,
}

impl GameSnapshot {
    pub fn new(raw: Value) -> Self {
        GameSnapshot { raw }
    }

    fn competition(&self) -> &Value {
        &self.raw["header"]["competitions"][0]
    }

    fn competitors(&self) -> &[Value] {
        self.competition()["competitors"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotFinal,
    InProgress,
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterPlayer {
    pub name: String,
    pub id: String,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardEvent {
    pub external_id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// Feed status name, e.g. "STATUS_SCHEDULED"
    pub status: Option<String>,
    pub completed: bool,
}

pub fn completion_status(snapshot: &GameSnapshot) -> CompletionStatus {
    let status_type = &snapshot.competition()["status"]["type"];
    let name = status_type["name"].as_str().unwrap_or_default();

    if status_type["completed"].as_bool() == Some(true) || name.starts_with("STATUS_FINAL") {
        return CompletionStatus::Final;
    }
    match name {
        "STATUS_IN_PROGRESS" | "STATUS_HALFTIME" | "STATUS_END_PERIOD" => {
            CompletionStatus::InProgress
        }
        _ if status_type["state"].as_str() == Some("in") => CompletionStatus::InProgress,
        _ => CompletionStatus::NotFinal,
    }
}

/// Score per team abbreviation. Competitors without an abbreviation or a
/// readable score are skipped.
pub fn team_scores(snapshot: &GameSnapshot) -> BTreeMap<String, i32> {
    snapshot
        .competitors()
        .iter()
        .filter_map(|c| {
            let abbrev = c["team"]["abbreviation"].as_str()?;
            let score = parse_int(&c["score"])?;
            Some((abbrev.to_string(), score))
        })
        .collect()
}

/// Team abbreviations in feed order.
pub fn competitor_order(snapshot: &GameSnapshot) -> Vec<String> {
    snapshot
        .competitors()
        .iter()
        .filter_map(|c| c["team"]["abbreviation"].as_str().map(str::to_string))
        .collect()
}

pub fn team_display_names(snapshot: &GameSnapshot) -> HashMap<String, String> {
    snapshot
        .competitors()
        .iter()
        .filter_map(|c| {
            let abbrev = c["team"]["abbreviation"].as_str()?;
            let name = c["team"]["displayName"].as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            Some((abbrev.to_string(), name.to_string()))
        })
        .collect()
}

/// Feed team IDs (not abbreviations), used for roster lookups.
pub fn competitor_team_ids(snapshot: &GameSnapshot) -> Vec<String> {
    snapshot
        .competitors()
        .iter()
        .filter_map(|c| value_to_string(&c["team"]["id"]))
        .collect()
}

/// Abbreviation of the higher-scoring team, only once the game is final.
/// A tie has no winner.
pub fn winning_team(snapshot: &GameSnapshot) -> Option<String> {
    if completion_status(snapshot) != CompletionStatus::Final {
        return None;
    }
    let scores = team_scores(snapshot);
    if scores.len() < 2 {
        return None;
    }
    let top = scores.values().copied().max()?;
    let mut leaders = scores.iter().filter(|(_, s)| **s == top);
    let (abbrev, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(abbrev.clone())
}

/// Box-score category and column for each supported stat type.
fn stat_column(stat_type: &str) -> Option<(&'static str, &'static str)> {
    let column = match stat_type {
        "passing_yards" => ("passing", "passingYards"),
        "passing_tds" => ("passing", "passingTouchdowns"),
        "passing_interceptions" => ("passing", "interceptions"),
        "passing_completions" => ("passing", "completions"),
        "rushing_yards" => ("rushing", "rushingYards"),
        "rushing_tds" => ("rushing", "rushingTouchdowns"),
        "receiving_yards" => ("receiving", "receivingYards"),
        "receiving_tds" => ("receiving", "receivingTouchdowns"),
        "receiving_receptions" => ("receiving", "receptions"),
        _ => return None,
    };
    Some(column)
}

/// A player's value for `stat_type`, matched by display name ignoring case.
pub fn player_stat(snapshot: &GameSnapshot, player_name: &str, stat_type: &str) -> Option<f64> {
    let (category, key) = stat_column(stat_type)?;
    let wanted = player_name.trim().to_lowercase();

    let teams = snapshot.raw["boxscore"]["players"].as_array()?;
    for team in teams {
        let Some(groups) = team["statistics"].as_array() else {
            continue;
        };
        for group in groups {
            if !group["name"]
                .as_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(category))
            {
                continue;
            }
            let keys = group["keys"].as_array().map(Vec::as_slice).unwrap_or(&[]);
            let athletes = group["athletes"].as_array().map(Vec::as_slice).unwrap_or(&[]);
            for athlete in athletes {
                let name = athlete["athlete"]["displayName"].as_str().unwrap_or_default();
                if name.to_lowercase() != wanted {
                    continue;
                }
                let stats = athlete["stats"].as_array().map(Vec::as_slice).unwrap_or(&[]);
                if let Some(value) = stat_value(keys, stats, key) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Look up `key` among the column keys. Compound columns such as
/// `completions/passingAttempts` hold values like `"20/28"`.
fn stat_value(keys: &[Value], stats: &[Value], key: &str) -> Option<f64> {
    for (idx, column) in keys.iter().enumerate() {
        let Some(column) = column.as_str() else {
            continue;
        };
        let Some(part) = column.split('/').position(|k| k == key) else {
            continue;
        };
        let raw = stats.get(idx)?;
        if let Some(n) = raw.as_f64() {
            return (part == 0).then_some(n);
        }
        return raw.as_str()?.split('/').nth(part)?.trim().parse().ok();
    }
    None
}

/// Touchdowns a player scored: rushing plus receiving, whichever the box
/// score carries. `None` when neither column lists the player.
pub fn anytime_td_count(snapshot: &GameSnapshot, player_name: &str) -> Option<i32> {
    let rushing = player_stat(snapshot, player_name, "rushing_tds");
    let receiving = player_stat(snapshot, player_name, "receiving_tds");
    match (rushing, receiving) {
        (None, None) => None,
        (r, c) => Some((r.unwrap_or(0.0) + c.unwrap_or(0.0)).round() as i32),
    }
}

/// Flatten team roster payloads into players, deduplicated by ID. An empty
/// `positions` list keeps everyone; otherwise positions match ignoring case.
pub fn parse_roster(rosters: &[Value], positions: &[String]) -> Vec<RosterPlayer> {
    let mut seen = HashSet::new();
    let mut players = Vec::new();

    for roster in rosters {
        let Some(groups) = roster["athletes"].as_array() else {
            continue;
        };
        for group in groups {
            let Some(items) = group["items"].as_array() else {
                continue;
            };
            for item in items {
                let (Some(name), Some(id)) =
                    (item["displayName"].as_str(), value_to_string(&item["id"]))
                else {
                    continue;
                };
                let position = item["position"]["abbreviation"].as_str().map(str::to_string);
                if !positions.is_empty() {
                    let matches = position
                        .as_deref()
                        .is_some_and(|p| positions.iter().any(|want| want.eq_ignore_ascii_case(p)));
                    if !matches {
                        continue;
                    }
                }
                if seen.insert(id.clone()) {
                    players.push(RosterPlayer {
                        name: name.to_string(),
                        id,
                        position,
                    });
                }
            }
        }
    }
    players
}

pub fn parse_scoreboard(raw: &Value) -> Vec<ScoreboardEvent> {
    let Some(events) = raw["events"].as_array() else {
        return vec![];
    };
    events
        .iter()
        .filter_map(|ev| {
            let external_id = value_to_string(&ev["id"])?;
            let name = ev["name"].as_str()?.to_string();
            let status_type = &ev["status"]["type"];
            Some(ScoreboardEvent {
                external_id,
                name,
                short_name: ev["shortName"].as_str().map(str::to_string),
                start_time: ev["date"].as_str().and_then(parse_feed_time),
                status: status_type["name"].as_str().map(str::to_string),
                completed: status_type["completed"].as_bool().unwrap_or(false),
            })
        })
        .collect()
}

/// The feed writes minute-precision UTC times ("2024-09-06T00:20Z").
pub fn parse_feed_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_int(v: &Value) -> Option<i32> {
    match v {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
