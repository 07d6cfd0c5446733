use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::*;
use crate::error::{PipelineError, Result};

/// Repository queries over a borrowed connection or transaction.
///
/// Obtained through [`super::Database::read`] / [`super::Database::write`];
/// every relationship the pipeline walks (game → props → answers, player →
/// selections) is an explicit query here.
pub struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Store { conn }
    }

    // ── Games ────────────────────────────────────────────────────────────────

    pub fn insert_game(&self, game: &Game) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO games (league_id, name, external_id, state, start_time,
                                team_a_score, team_b_score, prop_limit, graded)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                game.league_id,
                game.name,
                game.external_id,
                game.state,
                game.start_time,
                game.team_a_score,
                game.team_b_score,
                game.prop_limit,
                game.graded,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_game(&self, id: i64) -> Result<Option<Game>> {
        let game = self
            .conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
                params![id],
                map_game,
            )
            .optional()?;
        Ok(game)
    }

    pub fn require_game(&self, id: i64) -> Result<Game> {
        self.get_game(id)?
            .ok_or_else(|| PipelineError::not_found("game", id))
    }

    /// Games that have started, are not completed, and carry a feed ID.
    pub fn list_games_to_poll(&self, now: DateTime<Utc>) -> Result<Vec<Game>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE start_time <= ?1 AND state != ?2 AND external_id IS NOT NULL
             ORDER BY start_time, id"
        ))?;
        let games = stmt
            .query_map(params![now, GameState::Completed], map_game)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }

    /// Write the poller's live fields. Scores left as `None` keep their
    /// stored value.
    pub fn update_game_live(
        &self,
        id: i64,
        state: GameState,
        team_a_score: Option<i32>,
        team_b_score: Option<i32>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE games SET state = ?1,
                              team_a_score = COALESCE(?2, team_a_score),
                              team_b_score = COALESCE(?3, team_b_score)
             WHERE id = ?4",
            params![state, team_a_score, team_b_score, id],
        )?;
        if changed == 0 {
            return Err(PipelineError::not_found("game", id));
        }
        Ok(())
    }

    pub fn mark_game_graded(&self, id: i64) -> Result<()> {
        self.conn
            .execute("UPDATE games SET graded = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Players ──────────────────────────────────────────────────────────────

    pub fn insert_player(&self, player: &Player) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO players (league_id, name, points) VALUES (?1,?2,?3)",
            params![player.league_id, player.name, player.points],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_player(&self, id: i64) -> Result<Option<Player>> {
        let player = self
            .conn
            .query_row(
                "SELECT id, league_id, name, points FROM players WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Player {
                        id: row.get(0)?,
                        league_id: row.get(1)?,
                        name: row.get(2)?,
                        points: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(player)
    }

    pub fn require_player(&self, id: i64) -> Result<Player> {
        self.get_player(id)?
            .ok_or_else(|| PipelineError::not_found("player", id))
    }

    /// Add `delta` (possibly negative) to a player's ledger in place.
    pub fn adjust_points(&self, player_id: i64, delta: f64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE players SET points = points + ?1 WHERE id = ?2",
            params![delta, player_id],
        )?;
        if changed == 0 {
            return Err(PipelineError::not_found("player", player_id));
        }
        Ok(())
    }

    // ── Props ────────────────────────────────────────────────────────────────

    pub fn insert_winner_loser_prop(&self, prop: &WinnerLoserProp) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO winner_loser_props (
                game_id, question, is_mandatory,
                favorite_team, favorite_team_id, favorite_points, favorite_score,
                underdog_team, underdog_team_id, underdog_points, underdog_score,
                winning_team_id, correct_answer
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
            params![
                prop.game_id,
                prop.question,
                prop.is_mandatory,
                prop.favorite.name,
                prop.favorite.team_id,
                prop.favorite.points,
                prop.favorite.score,
                prop.underdog.name,
                prop.underdog.team_id,
                prop.underdog.points,
                prop.underdog.score,
                prop.winning_team_id,
                prop.correct_answer,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_over_under_prop(&self, prop: &OverUnderProp) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO over_under_props (
                game_id, question, is_mandatory, player_name, player_id, stat_type,
                line_value, current_value, over_points, under_points, correct_answer
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                prop.game_id,
                prop.question,
                prop.is_mandatory,
                prop.player_name,
                prop.player_id,
                prop.stat_type,
                prop.line_value,
                prop.current_value,
                prop.over_points,
                prop.under_points,
                prop.correct_answer,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_variable_option_prop(&self, prop: &VariableOptionProp) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO variable_option_props (game_id, question, is_mandatory, correct_answer)
             VALUES (?1,?2,?3,?4)",
            params![
                prop.game_id,
                prop.question,
                prop.is_mandatory,
                encode_list(prop.correct_answer.as_deref())?,
            ],
        )?;
        let prop_id = self.conn.last_insert_rowid();
        for option in &prop.options {
            self.conn.execute(
                "INSERT INTO variable_option_choices (prop_id, choice, points) VALUES (?1,?2,?3)",
                params![prop_id, option.choice, option.points],
            )?;
        }
        Ok(prop_id)
    }

    pub fn insert_anytime_td_prop(&self, prop: &AnytimeTdProp) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO anytime_td_props (game_id, question, is_mandatory, correct_answer)
             VALUES (?1,?2,?3,?4)",
            params![
                prop.game_id,
                prop.question,
                prop.is_mandatory,
                encode_list(prop.correct_answer.as_deref())?,
            ],
        )?;
        let prop_id = self.conn.last_insert_rowid();
        for option in &prop.options {
            self.conn.execute(
                "INSERT INTO anytime_td_options (prop_id, player_name, td_line, points, current_tds)
                 VALUES (?1,?2,?3,?4,?5)",
                params![
                    prop_id,
                    option.player_name,
                    option.td_line,
                    option.points,
                    option.current_tds
                ],
            )?;
        }
        Ok(prop_id)
    }

    /// All props of a game, grouped by variant in a stable order.
    pub fn props_for_game(&self, game_id: i64) -> Result<Vec<Prop>> {
        let mut props = Vec::new();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WINNER_LOSER_COLUMNS} FROM winner_loser_props WHERE game_id = ?1 ORDER BY id"
        ))?;
        for prop in stmt.query_map(params![game_id], map_winner_loser)? {
            props.push(Prop::WinnerLoser(prop?));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OVER_UNDER_COLUMNS} FROM over_under_props WHERE game_id = ?1 ORDER BY id"
        ))?;
        for prop in stmt.query_map(params![game_id], map_over_under)? {
            props.push(Prop::OverUnder(prop?));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, question, is_mandatory, correct_answer
             FROM variable_option_props WHERE game_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![game_id], map_variable_option)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for mut prop in rows {
            prop.options = self.variable_options(prop.id)?;
            props.push(Prop::VariableOption(prop));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, question, is_mandatory, correct_answer
             FROM anytime_td_props WHERE game_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![game_id], map_anytime_td)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for mut prop in rows {
            prop.options = self.anytime_td_options(prop.id)?;
            props.push(Prop::AnytimeTd(prop));
        }

        Ok(props)
    }

    pub fn get_prop(&self, kind: PropKind, id: i64) -> Result<Option<Prop>> {
        let prop = match kind {
            PropKind::WinnerLoser => self
                .conn
                .query_row(
                    &format!("SELECT {WINNER_LOSER_COLUMNS} FROM winner_loser_props WHERE id = ?1"),
                    params![id],
                    map_winner_loser,
                )
                .optional()?
                .map(Prop::WinnerLoser),
            PropKind::OverUnder => self
                .conn
                .query_row(
                    &format!("SELECT {OVER_UNDER_COLUMNS} FROM over_under_props WHERE id = ?1"),
                    params![id],
                    map_over_under,
                )
                .optional()?
                .map(Prop::OverUnder),
            PropKind::VariableOption => {
                let prop = self
                    .conn
                    .query_row(
                        "SELECT id, game_id, question, is_mandatory, correct_answer
                         FROM variable_option_props WHERE id = ?1",
                        params![id],
                        map_variable_option,
                    )
                    .optional()?;
                match prop {
                    Some(mut p) => {
                        p.options = self.variable_options(p.id)?;
                        Some(Prop::VariableOption(p))
                    }
                    None => None,
                }
            }
            PropKind::AnytimeTd => {
                let prop = self
                    .conn
                    .query_row(
                        "SELECT id, game_id, question, is_mandatory, correct_answer
                         FROM anytime_td_props WHERE id = ?1",
                        params![id],
                        map_anytime_td,
                    )
                    .optional()?;
                match prop {
                    Some(mut p) => {
                        p.options = self.anytime_td_options(p.id)?;
                        Some(Prop::AnytimeTd(p))
                    }
                    None => None,
                }
            }
        };
        Ok(prop)
    }

    pub fn require_prop(&self, kind: PropKind, id: i64) -> Result<Prop> {
        self.get_prop(kind, id)?
            .ok_or_else(|| PipelineError::not_found(prop_entity(kind), id))
    }

    fn variable_options(&self, prop_id: i64) -> Result<Vec<VariableOption>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, choice, points FROM variable_option_choices WHERE prop_id = ?1 ORDER BY id",
        )?;
        let options = stmt
            .query_map(params![prop_id], |row| {
                Ok(VariableOption {
                    id: row.get(0)?,
                    choice: row.get(1)?,
                    points: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(options)
    }

    fn anytime_td_options(&self, prop_id: i64) -> Result<Vec<AnytimeTdOption>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_name, td_line, points, current_tds
             FROM anytime_td_options WHERE prop_id = ?1 ORDER BY id",
        )?;
        let options = stmt
            .query_map(params![prop_id], |row| {
                Ok(AnytimeTdOption {
                    id: row.get(0)?,
                    player_name: row.get(1)?,
                    td_line: row.get(2)?,
                    points: row.get(3)?,
                    current_tds: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(options)
    }

    /// Overwrite a prop's correct answer. The answer shape must already have
    /// been checked against the prop kind.
    pub fn set_correct_answer(
        &self,
        kind: PropKind,
        prop_id: i64,
        answer: &CorrectAnswer,
    ) -> Result<()> {
        let stored = match (kind.is_multi_answer(), answer) {
            (false, CorrectAnswer::Single(value)) => value.clone(),
            (true, CorrectAnswer::Multi(values)) => serde_json::to_string(values)?,
            _ => {
                return Err(PipelineError::Validation(format!(
                    "correct answer {} has the wrong shape for a {} prop",
                    answer, kind
                )))
            }
        };
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET correct_answer = ?1 WHERE id = ?2",
                prop_table(kind)
            ),
            params![stored, prop_id],
        )?;
        if changed == 0 {
            return Err(PipelineError::not_found(prop_entity(kind), prop_id));
        }
        Ok(())
    }

    pub fn update_winner_loser_live(
        &self,
        prop_id: i64,
        favorite_score: Option<i32>,
        underdog_score: Option<i32>,
        winning_team_id: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE winner_loser_props
             SET favorite_score = COALESCE(?1, favorite_score),
                 underdog_score = COALESCE(?2, underdog_score),
                 winning_team_id = COALESCE(?3, winning_team_id)
             WHERE id = ?4",
            params![favorite_score, underdog_score, winning_team_id, prop_id],
        )?;
        Ok(())
    }

    pub fn update_over_under_live(&self, prop_id: i64, current_value: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE over_under_props SET current_value = ?1 WHERE id = ?2",
            params![current_value, prop_id],
        )?;
        Ok(())
    }

    pub fn update_anytime_td_option_live(&self, option_id: i64, current_tds: i32) -> Result<()> {
        self.conn.execute(
            "UPDATE anytime_td_options SET current_tds = ?1 WHERE id = ?2",
            params![current_tds, option_id],
        )?;
        Ok(())
    }

    // ── Answers ──────────────────────────────────────────────────────────────

    /// Insert or overwrite a player's answer (last write wins).
    pub fn upsert_answer(
        &self,
        player_id: i64,
        kind: PropKind,
        prop_id: i64,
        value: &str,
    ) -> Result<Answer> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO answers (player_id, prop_kind, prop_id, answer, submitted_at)
             VALUES (?1,?2,?3,?4,?5)
             ON CONFLICT(player_id, prop_kind, prop_id) DO UPDATE SET
                answer = excluded.answer,
                submitted_at = excluded.submitted_at",
            params![player_id, kind, prop_id, value, now],
        )?;
        let answer = self.conn.query_row(
            "SELECT id, player_id, prop_kind, prop_id, answer, submitted_at
             FROM answers WHERE player_id = ?1 AND prop_kind = ?2 AND prop_id = ?3",
            params![player_id, kind, prop_id],
            map_answer,
        )?;
        Ok(answer)
    }

    pub fn answers_for_prop(&self, kind: PropKind, prop_id: i64) -> Result<Vec<Answer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, prop_kind, prop_id, answer, submitted_at
             FROM answers WHERE prop_kind = ?1 AND prop_id = ?2 ORDER BY id",
        )?;
        let answers = stmt
            .query_map(params![kind, prop_id], map_answer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(answers)
    }

    /// Returns the number of rows removed (0 or 1).
    pub fn delete_answer(&self, player_id: i64, kind: PropKind, prop_id: i64) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM answers WHERE player_id = ?1 AND prop_kind = ?2 AND prop_id = ?3",
            params![player_id, kind, prop_id],
        )?;
        Ok(removed)
    }

    // ── Prop selections ──────────────────────────────────────────────────────

    pub fn insert_selection(
        &self,
        player_id: i64,
        game_id: i64,
        kind: PropKind,
        prop_id: i64,
    ) -> Result<PropSelection> {
        self.conn.execute(
            "INSERT INTO prop_selections (player_id, game_id, prop_kind, prop_id)
             VALUES (?1,?2,?3,?4)",
            params![player_id, game_id, kind, prop_id],
        )?;
        Ok(PropSelection {
            id: self.conn.last_insert_rowid(),
            player_id,
            game_id,
            prop_kind: kind,
            prop_id,
        })
    }

    pub fn get_selection(&self, id: i64) -> Result<Option<PropSelection>> {
        let selection = self
            .conn
            .query_row(
                "SELECT id, player_id, game_id, prop_kind, prop_id
                 FROM prop_selections WHERE id = ?1",
                params![id],
                map_selection,
            )
            .optional()?;
        Ok(selection)
    }

    pub fn selections_for_player_game(
        &self,
        player_id: i64,
        game_id: i64,
    ) -> Result<Vec<PropSelection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, game_id, prop_kind, prop_id
             FROM prop_selections WHERE player_id = ?1 AND game_id = ?2 ORDER BY id",
        )?;
        let selections = stmt
            .query_map(params![player_id, game_id], map_selection)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(selections)
    }

    pub fn has_selection(
        &self,
        player_id: i64,
        game_id: i64,
        kind: PropKind,
        prop_id: i64,
    ) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM prop_selections
                 WHERE player_id = ?1 AND game_id = ?2 AND prop_kind = ?3 AND prop_id = ?4",
                params![player_id, game_id, kind, prop_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn delete_selection(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM prop_selections WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Point awards ─────────────────────────────────────────────────────────

    pub fn record_award(&self, award: &PointAward) -> Result<()> {
        self.conn.execute(
            "INSERT INTO point_awards (player_id, prop_kind, prop_id, answer, points, awarded_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                award.player_id,
                award.prop_kind,
                award.prop_id,
                award.answer,
                award.points,
                award.awarded_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_award(
        &self,
        player_id: i64,
        kind: PropKind,
        prop_id: i64,
    ) -> Result<Option<PointAward>> {
        let award = self
            .conn
            .query_row(
                "SELECT player_id, prop_kind, prop_id, answer, points, awarded_at
                 FROM point_awards WHERE player_id = ?1 AND prop_kind = ?2 AND prop_id = ?3",
                params![player_id, kind, prop_id],
                map_award,
            )
            .optional()?;
        Ok(award)
    }

    pub fn awards_for_prop(&self, kind: PropKind, prop_id: i64) -> Result<Vec<PointAward>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, prop_kind, prop_id, answer, points, awarded_at
             FROM point_awards WHERE prop_kind = ?1 AND prop_id = ?2 ORDER BY player_id",
        )?;
        let awards = stmt
            .query_map(params![kind, prop_id], map_award)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(awards)
    }

    pub fn delete_awards_for_prop(&self, kind: PropKind, prop_id: i64) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM point_awards WHERE prop_kind = ?1 AND prop_id = ?2",
            params![kind, prop_id],
        )?;
        Ok(removed)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

const GAME_COLUMNS: &str = "id, league_id, name, external_id, state, start_time,
    team_a_score, team_b_score, prop_limit, graded";

const WINNER_LOSER_COLUMNS: &str = "id, game_id, question, is_mandatory,
    favorite_team, favorite_team_id, favorite_points, favorite_score,
    underdog_team, underdog_team_id, underdog_points, underdog_score,
    winning_team_id, correct_answer";

const OVER_UNDER_COLUMNS: &str = "id, game_id, question, is_mandatory, player_name,
    player_id, stat_type, line_value, current_value, over_points, under_points, correct_answer";

fn prop_table(kind: PropKind) -> &'static str {
    match kind {
        PropKind::WinnerLoser => "winner_loser_props",
        PropKind::OverUnder => "over_under_props",
        PropKind::VariableOption => "variable_option_props",
        PropKind::AnytimeTd => "anytime_td_props",
    }
}

fn prop_entity(kind: PropKind) -> &'static str {
    match kind {
        PropKind::WinnerLoser => "winner/loser prop",
        PropKind::OverUnder => "over/under prop",
        PropKind::VariableOption => "variable option prop",
        PropKind::AnytimeTd => "anytime TD prop",
    }
}

fn encode_list(values: Option<&[String]>) -> Result<Option<String>> {
    Ok(values.map(serde_json::to_string).transpose()?)
}

fn decode_list(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Vec<String>>> {
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn map_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        league_id: row.get(1)?,
        name: row.get(2)?,
        external_id: row.get(3)?,
        state: row.get(4)?,
        start_time: row.get(5)?,
        team_a_score: row.get(6)?,
        team_b_score: row.get(7)?,
        prop_limit: row.get(8)?,
        graded: row.get(9)?,
    })
}

fn map_winner_loser(row: &rusqlite::Row) -> rusqlite::Result<WinnerLoserProp> {
    Ok(WinnerLoserProp {
        id: row.get(0)?,
        game_id: row.get(1)?,
        question: row.get(2)?,
        is_mandatory: row.get(3)?,
        favorite: TeamSide {
            name: row.get(4)?,
            team_id: row.get(5)?,
            points: row.get(6)?,
            score: row.get(7)?,
        },
        underdog: TeamSide {
            name: row.get(8)?,
            team_id: row.get(9)?,
            points: row.get(10)?,
            score: row.get(11)?,
        },
        winning_team_id: row.get(12)?,
        correct_answer: row.get(13)?,
    })
}

fn map_over_under(row: &rusqlite::Row) -> rusqlite::Result<OverUnderProp> {
    Ok(OverUnderProp {
        id: row.get(0)?,
        game_id: row.get(1)?,
        question: row.get(2)?,
        is_mandatory: row.get(3)?,
        player_name: row.get(4)?,
        player_id: row.get(5)?,
        stat_type: row.get(6)?,
        line_value: row.get(7)?,
        current_value: row.get(8)?,
        over_points: row.get(9)?,
        under_points: row.get(10)?,
        correct_answer: row.get(11)?,
    })
}

fn map_variable_option(row: &rusqlite::Row) -> rusqlite::Result<VariableOptionProp> {
    Ok(VariableOptionProp {
        id: row.get(0)?,
        game_id: row.get(1)?,
        question: row.get(2)?,
        is_mandatory: row.get(3)?,
        options: Vec::new(),
        correct_answer: decode_list(4, row.get(4)?)?,
    })
}

fn map_anytime_td(row: &rusqlite::Row) -> rusqlite::Result<AnytimeTdProp> {
    Ok(AnytimeTdProp {
        id: row.get(0)?,
        game_id: row.get(1)?,
        question: row.get(2)?,
        is_mandatory: row.get(3)?,
        options: Vec::new(),
        correct_answer: decode_list(4, row.get(4)?)?,
    })
}

fn map_answer(row: &rusqlite::Row) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: row.get(0)?,
        player_id: row.get(1)?,
        prop_kind: row.get(2)?,
        prop_id: row.get(3)?,
        value: row.get(4)?,
        submitted_at: row.get(5)?,
    })
}

fn map_selection(row: &rusqlite::Row) -> rusqlite::Result<PropSelection> {
    Ok(PropSelection {
        id: row.get(0)?,
        player_id: row.get(1)?,
        game_id: row.get(2)?,
        prop_kind: row.get(3)?,
        prop_id: row.get(4)?,
    })
}

fn map_award(row: &rusqlite::Row) -> rusqlite::Result<PointAward> {
    Ok(PointAward {
        player_id: row.get(0)?,
        prop_kind: row.get(1)?,
        prop_id: row.get(2)?,
        answer: row.get(3)?,
        points: row.get(4)?,
        awarded_at: row.get(5)?,
    })
}
