use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a game as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Scheduled,
    Polling,
    Completed,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Scheduled => "scheduled",
            GameState::Polling => "polling",
            GameState::Completed => "completed",
        }
    }
}

impl FromStr for GameState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(GameState::Scheduled),
            "polling" => Ok(GameState::Polling),
            "completed" => Ok(GameState::Completed),
            other => Err(format!("unknown game state '{}'", other)),
        }
    }
}

/// One real-world event that props are attached to; the unit of polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Ignored on insert
    pub id: i64,
    pub league_id: i64,
    pub name: String,
    /// Score-feed event ID; `None` means the game is not live-tracked
    pub external_id: Option<String>,
    pub state: GameState,
    pub start_time: DateTime<Utc>,
    /// Favorite side's live score
    pub team_a_score: Option<i32>,
    /// Underdog side's live score
    pub team_b_score: Option<i32>,
    /// Max optional props a player may select for this game
    pub prop_limit: u32,
    /// Whether grading has run at least once
    pub graded: bool,
}

/// Discriminator for the four prop variants, as stored alongside answers,
/// selections and awards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    WinnerLoser,
    OverUnder,
    VariableOption,
    AnytimeTd,
}

impl PropKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropKind::WinnerLoser => "winner_loser",
            PropKind::OverUnder => "over_under",
            PropKind::VariableOption => "variable_option",
            PropKind::AnytimeTd => "anytime_td",
        }
    }

    /// Variants whose correct answer is a list rather than a single value.
    pub fn is_multi_answer(&self) -> bool {
        matches!(self, PropKind::VariableOption | PropKind::AnytimeTd)
    }
}

impl fmt::Display for PropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "winner_loser" => Ok(PropKind::WinnerLoser),
            "over_under" => Ok(PropKind::OverUnder),
            "variable_option" => Ok(PropKind::VariableOption),
            "anytime_td" => Ok(PropKind::AnytimeTd),
            other => Err(format!(
                "invalid prop type '{}': expected winner_loser, over_under, variable_option or anytime_td",
                other
            )),
        }
    }
}

impl ToSql for PropKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PropKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for GameState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for GameState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// A prop's correct answer: one value for winner/loser and over/under,
/// a list for variable-option and anytime-TD props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multi(Vec<String>),
}

impl fmt::Display for CorrectAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectAnswer::Single(value) => f.write_str(value),
            CorrectAnswer::Multi(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

/// One side of a winner/loser prop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSide {
    /// Display name players pick, e.g. "Baltimore Ravens"
    pub name: String,
    /// Score-feed team abbreviation, e.g. "BAL"
    pub team_id: Option<String>,
    pub points: f64,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerLoserProp {
    pub id: i64,
    pub game_id: i64,
    pub question: String,
    pub is_mandatory: bool,
    /// Team A
    pub favorite: TeamSide,
    /// Team B
    pub underdog: TeamSide,
    /// Feed abbreviation of the winner, set once the game is final
    pub winning_team_id: Option<String>,
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverUnderProp {
    pub id: i64,
    pub game_id: i64,
    pub question: String,
    pub is_mandatory: bool,
    pub player_name: Option<String>,
    /// Score-feed athlete ID
    pub player_id: Option<String>,
    /// e.g. "passing_yards", "rushing_tds"
    pub stat_type: Option<String>,
    pub line_value: Option<f64>,
    pub current_value: Option<f64>,
    pub over_points: f64,
    pub under_points: f64,
    /// "over" | "under"
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableOption {
    pub id: i64,
    pub choice: String,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableOptionProp {
    pub id: i64,
    pub game_id: i64,
    pub question: String,
    pub is_mandatory: bool,
    /// In display order
    pub options: Vec<VariableOption>,
    pub correct_answer: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnytimeTdOption {
    pub id: i64,
    pub player_name: String,
    /// 0.5 = 1+ TD, 1.5 = 2+ TDs, ...
    pub td_line: f64,
    pub points: f64,
    /// Live touchdown count, updated by polling
    pub current_tds: Option<i32>,
}

impl AnytimeTdOption {
    pub fn has_hit_line(&self) -> bool {
        match self.current_tds {
            Some(tds) => f64::from(tds) >= self.td_line,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnytimeTdProp {
    pub id: i64,
    pub game_id: i64,
    pub question: String,
    pub is_mandatory: bool,
    pub options: Vec<AnytimeTdOption>,
    /// Player names who hit their line. `Some(vec![])` means graded with no hits.
    pub correct_answer: Option<Vec<String>>,
}

/// A gradeable question attached to a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prop {
    WinnerLoser(WinnerLoserProp),
    OverUnder(OverUnderProp),
    VariableOption(VariableOptionProp),
    AnytimeTd(AnytimeTdProp),
}

impl Prop {
    pub fn id(&self) -> i64 {
        match self {
            Prop::WinnerLoser(p) => p.id,
            Prop::OverUnder(p) => p.id,
            Prop::VariableOption(p) => p.id,
            Prop::AnytimeTd(p) => p.id,
        }
    }

    pub fn game_id(&self) -> i64 {
        match self {
            Prop::WinnerLoser(p) => p.game_id,
            Prop::OverUnder(p) => p.game_id,
            Prop::VariableOption(p) => p.game_id,
            Prop::AnytimeTd(p) => p.game_id,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            Prop::WinnerLoser(p) => &p.question,
            Prop::OverUnder(p) => &p.question,
            Prop::VariableOption(p) => &p.question,
            Prop::AnytimeTd(p) => &p.question,
        }
    }

    pub fn kind(&self) -> PropKind {
        match self {
            Prop::WinnerLoser(_) => PropKind::WinnerLoser,
            Prop::OverUnder(_) => PropKind::OverUnder,
            Prop::VariableOption(_) => PropKind::VariableOption,
            Prop::AnytimeTd(_) => PropKind::AnytimeTd,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        match self {
            Prop::WinnerLoser(p) => p.is_mandatory,
            Prop::OverUnder(p) => p.is_mandatory,
            Prop::VariableOption(p) => p.is_mandatory,
            Prop::AnytimeTd(p) => p.is_mandatory,
        }
    }

    pub fn correct_answer(&self) -> Option<CorrectAnswer> {
        match self {
            Prop::WinnerLoser(p) => p.correct_answer.clone().map(CorrectAnswer::Single),
            Prop::OverUnder(p) => p.correct_answer.clone().map(CorrectAnswer::Single),
            Prop::VariableOption(p) => p.correct_answer.clone().map(CorrectAnswer::Multi),
            Prop::AnytimeTd(p) => p.correct_answer.clone().map(CorrectAnswer::Multi),
        }
    }
}

/// A player's answer to one prop. One row per (player, prop); resubmission
/// overwrites `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub player_id: i64,
    pub prop_kind: PropKind,
    pub prop_id: i64,
    pub value: String,
    pub submitted_at: DateTime<Utc>,
}

/// Opt-in record that makes an optional prop gradeable for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSelection {
    pub id: i64,
    pub player_id: i64,
    pub game_id: i64,
    pub prop_kind: PropKind,
    pub prop_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Ignored on insert
    pub id: i64,
    pub league_id: i64,
    pub name: String,
    pub points: f64,
}

/// Points actually credited to a player for one prop. Grading skips triples
/// that already carry an award; regrading reverses and deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointAward {
    pub player_id: i64,
    pub prop_kind: PropKind,
    pub prop_id: i64,
    /// The answer value that earned the points
    pub answer: String,
    pub points: f64,
    pub awarded_at: DateTime<Utc>,
}
