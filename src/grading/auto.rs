use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info};

use super::engine::{set_correct_answer_in, RegradeReport};
use crate::db::models::{AnytimeTdOption, CorrectAnswer, Game, GameState, Prop, PropKind, WinnerLoserProp};
use crate::db::{Database, Store};
use crate::error::{PipelineError, Result};

/// `"over"` / `"under"` against the line; `None` on a push or missing data.
pub fn over_under_outcome(current: Option<f64>, line: Option<f64>) -> Option<&'static str> {
    match current?.partial_cmp(&line?)? {
        Ordering::Greater => Some("over"),
        Ordering::Less => Some("under"),
        Ordering::Equal => None,
    }
}

/// Name of the higher-scoring side; `None` on a tie or missing score.
/// Per-side prop scores fall back to the game's scores.
pub fn winner_loser_outcome(prop: &WinnerLoserProp, game: &Game) -> Option<String> {
    let favorite = prop.favorite.score.or(game.team_a_score)?;
    let underdog = prop.underdog.score.or(game.team_b_score)?;
    match favorite.cmp(&underdog) {
        Ordering::Greater => Some(prop.favorite.name.clone()),
        Ordering::Less => Some(prop.underdog.name.clone()),
        Ordering::Equal => None,
    }
}

/// Options whose live TD count reached their line, in option order.
pub fn anytime_td_outcome(options: &[AnytimeTdOption]) -> Vec<String> {
    options
        .iter()
        .filter(|o| o.has_hit_line())
        .map(|o| o.player_name.clone())
        .collect()
}

/// The correct answer live data implies for `prop`, if any. Variable-option
/// props are never derived.
pub fn derive_correct_answer(prop: &Prop, game: &Game) -> Option<CorrectAnswer> {
    match prop {
        Prop::OverUnder(p) => over_under_outcome(p.current_value, p.line_value)
            .map(|o| CorrectAnswer::Single(o.to_string())),
        Prop::WinnerLoser(p) => winner_loser_outcome(p, game).map(CorrectAnswer::Single),
        Prop::AnytimeTd(p) => Some(CorrectAnswer::Multi(anytime_td_outcome(&p.options))),
        Prop::VariableOption(_) => None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoGradeResult {
    pub prop_kind: PropKind,
    pub prop_id: i64,
    pub correct_answer: Option<CorrectAnswer>,
    pub changed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoGradeReport {
    pub game_id: i64,
    pub props_set: usize,
    pub props_unchanged: usize,
    /// Pushes, ties and props missing live data
    pub props_unresolved: usize,
    pub props_manual: usize,
    pub awards_reversed: usize,
    pub results: Vec<AutoGradeResult>,
}

/// Set correct answers for a completed game from its stored live fields.
///
/// Re-running with unchanged live data writes nothing. A changed value on a
/// graded game goes through the regrade path and reverses earlier awards.
pub fn auto_grade_from_live_data(db: &Database, game_id: i64) -> Result<AutoGradeReport> {
    let report = db.write(|store| auto_grade_in(store, game_id))?;
    info!(
        "Auto-graded game {}: {} set, {} unchanged, {} unresolved, {} manual",
        game_id,
        report.props_set,
        report.props_unchanged,
        report.props_unresolved,
        report.props_manual
    );
    Ok(report)
}

pub fn auto_grade_in(store: &Store<'_>, game_id: i64) -> Result<AutoGradeReport> {
    let game = store.require_game(game_id)?;
    if game.state != GameState::Completed {
        return Err(PipelineError::InvalidState(format!(
            "game {} is {}; only completed games can be auto-graded",
            game_id,
            game.state.as_str()
        )));
    }

    let mut report = AutoGradeReport {
        game_id,
        ..Default::default()
    };

    for prop in store.props_for_game(game_id)? {
        let kind = prop.kind();
        if kind == PropKind::VariableOption {
            report.props_manual += 1;
            continue;
        }

        let current = prop.correct_answer();
        let derived = derive_correct_answer(&prop, &game);
        let changed = match &derived {
            None => {
                debug!("{} prop {} unresolved from live data", kind, prop.id());
                report.props_unresolved += 1;
                false
            }
            Some(value) if current.as_ref() == Some(value) => {
                report.props_unchanged += 1;
                false
            }
            Some(value) => {
                let RegradeReport {
                    awards_reversed, ..
                } = set_correct_answer_in(store, kind, prop.id(), value.clone())?;
                debug!("{} prop {} correct answer set to {}", kind, prop.id(), value);
                report.props_set += 1;
                report.awards_reversed += awards_reversed;
                true
            }
        };

        report.results.push(AutoGradeResult {
            prop_kind: kind,
            prop_id: prop.id(),
            correct_answer: derived.or(current),
            changed,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::engine::grade_game;
    use crate::testutil;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn completed_game(db: &Database) -> i64 {
        db.write(|s| {
            let mut g = testutil::game(Some("401"), Utc::now());
            g.state = GameState::Completed;
            s.insert_game(&g)
        })
        .unwrap()
    }

    #[test]
    fn test_over_under_boundaries() {
        assert_eq!(over_under_outcome(Some(100.0), Some(100.5)), Some("under"));
        assert_eq!(over_under_outcome(Some(101.0), Some(100.5)), Some("over"));
        assert_eq!(over_under_outcome(Some(100.5), Some(100.5)), None);
        assert_eq!(over_under_outcome(None, Some(100.5)), None);
        assert_eq!(over_under_outcome(Some(3.0), None), None);
    }

    #[test]
    fn test_winner_loser_tie_and_fallback() {
        let mut game = testutil::game(Some("401"), Utc::now());
        let mut prop = testutil::winner_loser(1, ("A", None, 2.0), ("B", None, 3.0));
        assert_eq!(winner_loser_outcome(&prop, &game), None);

        game.team_a_score = Some(17);
        game.team_b_score = Some(24);
        assert_eq!(winner_loser_outcome(&prop, &game).as_deref(), Some("B"));

        prop.favorite.score = Some(24);
        prop.underdog.score = Some(24);
        assert_eq!(winner_loser_outcome(&prop, &game), None);
    }

    #[test]
    fn test_anytime_td_scenario() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        let prop_id = db
            .write(|s| {
                let mut p = testutil::anytime_td(game_id, &[("Kelce", 0.5, 5.0), ("Mahomes", 1.5, 12.0)]);
                p.options[0].current_tds = Some(1);
                p.options[1].current_tds = Some(1);
                s.insert_anytime_td_prop(&p)
            })
            .unwrap();

        auto_grade_from_live_data(&db, game_id).unwrap();
        let prop = db.read(|s| s.require_prop(PropKind::AnytimeTd, prop_id)).unwrap();
        assert_eq!(prop.correct_answer(), Some(CorrectAnswer::Multi(vec!["Kelce".into()])));
    }

    #[test]
    fn test_anytime_td_no_hits_stores_empty_list() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        let prop_id = db
            .write(|s| s.insert_anytime_td_prop(&testutil::anytime_td(game_id, &[("Kelce", 0.5, 5.0)])))
            .unwrap();

        auto_grade_from_live_data(&db, game_id).unwrap();
        let prop = db.read(|s| s.require_prop(PropKind::AnytimeTd, prop_id)).unwrap();
        assert_eq!(prop.correct_answer(), Some(CorrectAnswer::Multi(vec![])));
    }

    #[test]
    fn test_over_under_push_stays_unset() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        let (push, under) = db
            .write(|s| {
                let mut p = testutil::over_under(game_id, 100.5, 1.0, 1.0);
                p.current_value = Some(100.5);
                let push = s.insert_over_under_prop(&p)?;
                p.current_value = Some(100.0);
                let under = s.insert_over_under_prop(&p)?;
                Ok((push, under))
            })
            .unwrap();

        let report = auto_grade_from_live_data(&db, game_id).unwrap();
        assert_eq!(report.props_set, 1);
        assert_eq!(report.props_unresolved, 1);

        let push = db.read(|s| s.require_prop(PropKind::OverUnder, push)).unwrap();
        assert_eq!(push.correct_answer(), None);
        let under = db.read(|s| s.require_prop(PropKind::OverUnder, under)).unwrap();
        assert_eq!(under.correct_answer(), Some(CorrectAnswer::Single("under".into())));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        let (player_id, prop_id) = db
            .write(|s| {
                let player = s.insert_player(&testutil::player("alice"))?;
                let mut p = testutil::winner_loser(game_id, ("A", None, 2.0), ("B", None, 3.0));
                p.favorite.score = Some(21);
                p.underdog.score = Some(14);
                let prop = s.insert_winner_loser_prop(&p)?;
                s.upsert_answer(player, PropKind::WinnerLoser, prop, "A")?;
                Ok((player, prop))
            })
            .unwrap();

        let first = auto_grade_from_live_data(&db, game_id).unwrap();
        assert_eq!(first.props_set, 1);
        grade_game(&db, game_id).unwrap();

        let second = auto_grade_from_live_data(&db, game_id).unwrap();
        assert_eq!(second.props_set, 0);
        assert_eq!(second.props_unchanged, 1);
        assert_eq!(second.awards_reversed, 0);

        let player = db.read(|s| s.require_player(player_id)).unwrap();
        assert_relative_eq!(player.points, 2.0, epsilon = 1e-9);
        let prop = db.read(|s| s.require_prop(PropKind::WinnerLoser, prop_id)).unwrap();
        assert_eq!(prop.correct_answer(), Some(CorrectAnswer::Single("A".into())));
    }

    #[test]
    fn test_post_facto_change_reverses_awards() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        let (player_id, prop_id) = db
            .write(|s| {
                let player = s.insert_player(&testutil::player("alice"))?;
                let mut p = testutil::over_under(game_id, 250.5, 4.0, 1.0);
                p.is_mandatory = true;
                p.current_value = Some(260.0);
                let prop = s.insert_over_under_prop(&p)?;
                s.upsert_answer(player, PropKind::OverUnder, prop, "over")?;
                Ok((player, prop))
            })
            .unwrap();

        auto_grade_from_live_data(&db, game_id).unwrap();
        grade_game(&db, game_id).unwrap();
        assert_relative_eq!(
            db.read(|s| s.require_player(player_id)).unwrap().points,
            4.0,
            epsilon = 1e-9
        );

        // Stat correction after the final whistle
        db.write(|s| s.update_over_under_live(prop_id, 248.0)).unwrap();
        let report = auto_grade_from_live_data(&db, game_id).unwrap();
        assert_eq!(report.awards_reversed, 1);
        assert_relative_eq!(
            db.read(|s| s.require_player(player_id)).unwrap().points,
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_requires_completed_game() {
        let db = Database::open_in_memory().unwrap();
        let game_id = db
            .write(|s| s.insert_game(&testutil::game(Some("401"), Utc::now())))
            .unwrap();
        assert!(matches!(
            auto_grade_from_live_data(&db, game_id),
            Err(PipelineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_variable_option_untouched() {
        let db = Database::open_in_memory().unwrap();
        let game_id = completed_game(&db);
        db.write(|s| s.insert_variable_option_prop(&testutil::variable_option(game_id, &[("Yes", 1.0)])))
            .unwrap();
        let report = auto_grade_from_live_data(&db, game_id).unwrap();
        assert_eq!(report.props_manual, 1);
        assert!(report.results.is_empty());
    }
}
