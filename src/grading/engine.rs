use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::normalize_correct_answer;
use crate::db::models::{CorrectAnswer, PointAward, PropKind};
use crate::db::{Database, Store};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Serialize)]
pub struct GradeReport {
    pub game_id: i64,
    pub props_graded: usize,
    /// Props skipped because no correct answer is set yet
    pub props_without_answer: usize,
    pub answers_considered: usize,
    pub awards_made: usize,
    pub points_awarded: f64,
    /// Answers on optional props the player never selected
    pub skipped_unselected: usize,
    /// Answers already credited by an earlier Grade call
    pub already_awarded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegradeReport {
    pub prop_kind: PropKind,
    pub prop_id: i64,
    pub previous: Option<CorrectAnswer>,
    pub current: CorrectAnswer,
    pub game_was_graded: bool,
    pub awards_reversed: usize,
    pub points_reversed: f64,
}

/// Credit every matching answer on the game's props.
///
/// Additive only: answers that already carry an award are skipped, so
/// calling this repeatedly never double-credits. Runs in one transaction.
pub fn grade_game(db: &Database, game_id: i64) -> Result<GradeReport> {
    let report = db.write(|store| grade_game_in(store, game_id))?;
    info!(
        "Graded game {}: {} awards, {:.1} points ({} props unanswered, {} unselected, {} already awarded)",
        game_id,
        report.awards_made,
        report.points_awarded,
        report.props_without_answer,
        report.skipped_unselected,
        report.already_awarded
    );
    Ok(report)
}

pub fn grade_game_in(store: &Store<'_>, game_id: i64) -> Result<GradeReport> {
    store.require_game(game_id)?;
    let mut report = GradeReport {
        game_id,
        ..Default::default()
    };

    for prop in store.props_for_game(game_id)? {
        if prop.correct_answer().is_none() {
            report.props_without_answer += 1;
            continue;
        }
        report.props_graded += 1;
        let kind = prop.kind();

        for answer in store.answers_for_prop(kind, prop.id())? {
            report.answers_considered += 1;
            if !prop.is_mandatory()
                && !store.has_selection(answer.player_id, game_id, kind, prop.id())?
            {
                report.skipped_unselected += 1;
                continue;
            }
            if store.get_award(answer.player_id, kind, prop.id())?.is_some() {
                report.already_awarded += 1;
                continue;
            }
            let Some(points) = prop.points_for(&answer.value) else {
                continue;
            };

            store.adjust_points(answer.player_id, points)?;
            store.record_award(&PointAward {
                player_id: answer.player_id,
                prop_kind: kind,
                prop_id: prop.id(),
                answer: answer.value.clone(),
                points,
                awarded_at: Utc::now(),
            })?;
            report.awards_made += 1;
            report.points_awarded += points;
        }
    }

    store.mark_game_graded(game_id)?;
    Ok(report)
}

/// Overwrite a prop's correct answer. On a graded game every award made
/// under the old value is reversed first, in the same transaction. New
/// awards wait for the next [`grade_game`] call.
pub fn set_correct_answer(
    db: &Database,
    kind: PropKind,
    prop_id: i64,
    value: CorrectAnswer,
) -> Result<RegradeReport> {
    let report = db.write(|store| set_correct_answer_in(store, kind, prop_id, value))?;
    info!(
        "Correct answer for {} prop {} set to {} ({} awards reversed, {:.1} points)",
        kind, prop_id, report.current, report.awards_reversed, report.points_reversed
    );
    Ok(report)
}

pub fn set_correct_answer_in(
    store: &Store<'_>,
    kind: PropKind,
    prop_id: i64,
    value: CorrectAnswer,
) -> Result<RegradeReport> {
    let prop = store.require_prop(kind, prop_id)?;
    let game = store.get_game(prop.game_id())?.ok_or_else(|| {
        PipelineError::InvalidState(format!(
            "{} prop {} references missing game {}",
            kind,
            prop_id,
            prop.game_id()
        ))
    })?;
    let value = normalize_correct_answer(&prop, value)?;

    let mut awards_reversed = 0;
    let mut points_reversed = 0.0;
    if game.graded {
        for award in store.awards_for_prop(kind, prop_id)? {
            store.adjust_points(award.player_id, -award.points)?;
            awards_reversed += 1;
            points_reversed += award.points;
        }
        store.delete_awards_for_prop(kind, prop_id)?;
    }

    store.set_correct_answer(kind, prop_id, &value)?;

    Ok(RegradeReport {
        prop_kind: kind,
        prop_id,
        previous: prop.correct_answer(),
        current: value,
        game_was_graded: game.graded,
        awards_reversed,
        points_reversed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::selection::select_prop;
    use crate::testutil;
    use approx::assert_relative_eq;

    struct Fixture {
        db: Database,
        game_id: i64,
        p1: i64,
        p2: i64,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let (game_id, p1, p2) = db
            .write(|s| {
                let g = s.insert_game(&testutil::game(Some("401"), Utc::now()))?;
                let p1 = s.insert_player(&testutil::player("Player1"))?;
                let p2 = s.insert_player(&testutil::player("Player2"))?;
                Ok((g, p1, p2))
            })
            .unwrap();
        Fixture { db, game_id, p1, p2 }
    }

    fn points(db: &Database, player_id: i64) -> f64 {
        db.read(|s| s.require_player(player_id)).unwrap().points
    }

    fn answer(db: &Database, player_id: i64, kind: PropKind, prop_id: i64, value: &str) {
        db.write(|s| s.upsert_answer(player_id, kind, prop_id, value))
            .unwrap();
    }

    #[test]
    fn test_winner_loser_reversal_scenario() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| {
                s.insert_winner_loser_prop(&testutil::winner_loser(
                    f.game_id,
                    ("A", None, 2.0),
                    ("B", None, 3.0),
                ))
            })
            .unwrap();
        answer(&f.db, f.p1, PropKind::WinnerLoser, prop_id, "A");
        answer(&f.db, f.p2, PropKind::WinnerLoser, prop_id, "B");

        set_correct_answer(&f.db, PropKind::WinnerLoser, prop_id, CorrectAnswer::Single("A".into()))
            .unwrap();
        grade_game(&f.db, f.game_id).unwrap();
        assert_relative_eq!(points(&f.db, f.p1), 2.0, epsilon = 1e-9);
        assert_relative_eq!(points(&f.db, f.p2), 0.0, epsilon = 1e-9);

        let regrade = set_correct_answer(
            &f.db,
            PropKind::WinnerLoser,
            prop_id,
            CorrectAnswer::Single("B".into()),
        )
        .unwrap();
        assert!(regrade.game_was_graded);
        assert_eq!(regrade.awards_reversed, 1);
        assert_eq!(regrade.previous, Some(CorrectAnswer::Single("A".into())));
        assert_relative_eq!(points(&f.db, f.p1), 0.0, epsilon = 1e-9);
        assert_relative_eq!(points(&f.db, f.p2), 0.0, epsilon = 1e-9);

        grade_game(&f.db, f.game_id).unwrap();
        assert_relative_eq!(points(&f.db, f.p1), 0.0, epsilon = 1e-9);
        assert_relative_eq!(points(&f.db, f.p2), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_racing_corrections_and_grades_keep_ledger_consistent() {
        let f = fixture();
        let (prop_id, pickers) = f
            .db
            .write(|s| {
                let prop_id = s.insert_winner_loser_prop(&testutil::winner_loser(
                    f.game_id,
                    ("A", None, 2.0),
                    ("B", None, 3.0),
                ))?;
                let mut pickers = Vec::new();
                for i in 0..20 {
                    let id = s.insert_player(&testutil::player(&format!("racer{}", i)))?;
                    let pick = if i % 2 == 0 { "A" } else { "B" };
                    s.upsert_answer(id, PropKind::WinnerLoser, prop_id, pick)?;
                    pickers.push((id, pick));
                }
                Ok((prop_id, pickers))
            })
            .unwrap();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let db = f.db.clone();
                scope.spawn(move || {
                    for round in 0..5 {
                        let value = if (t + round) % 2 == 0 { "A" } else { "B" };
                        set_correct_answer(&db, PropKind::WinnerLoser, prop_id, CorrectAnswer::Single(value.into()))
                            .unwrap();
                        grade_game(&db, f.game_id).unwrap();
                    }
                });
            }
        });

        set_correct_answer(&f.db, PropKind::WinnerLoser, prop_id, CorrectAnswer::Single("B".into()))
            .unwrap();
        grade_game(&f.db, f.game_id).unwrap();

        let mut total = 0.0;
        for (id, pick) in &pickers {
            let expected = if *pick == "B" { 3.0 } else { 0.0 };
            assert_relative_eq!(points(&f.db, *id), expected, epsilon = 1e-9);
            total += points(&f.db, *id);
        }
        assert_relative_eq!(total, 30.0, epsilon = 1e-9);

        let awards = f.db.read(|s| s.awards_for_prop(PropKind::WinnerLoser, prop_id)).unwrap();
        assert_eq!(awards.len(), 10);
        let ledger: f64 = awards.iter().map(|a| a.points).sum();
        assert_relative_eq!(ledger, total, epsilon = 1e-9);
    }

    #[test]
    fn test_grade_twice_does_not_double_award() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| {
                s.insert_winner_loser_prop(&testutil::winner_loser(
                    f.game_id,
                    ("A", None, 2.0),
                    ("B", None, 3.0),
                ))
            })
            .unwrap();
        answer(&f.db, f.p1, PropKind::WinnerLoser, prop_id, "A");
        set_correct_answer(&f.db, PropKind::WinnerLoser, prop_id, CorrectAnswer::Single("A".into()))
            .unwrap();

        let first = grade_game(&f.db, f.game_id).unwrap();
        let second = grade_game(&f.db, f.game_id).unwrap();
        assert_eq!(first.awards_made, 1);
        assert_eq!(second.awards_made, 0);
        assert_eq!(second.already_awarded, 1);
        assert_relative_eq!(points(&f.db, f.p1), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optional_prop_requires_selection() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| s.insert_over_under_prop(&testutil::over_under(f.game_id, 250.5, 4.0, 1.0)))
            .unwrap();
        answer(&f.db, f.p1, PropKind::OverUnder, prop_id, "over");
        answer(&f.db, f.p2, PropKind::OverUnder, prop_id, "over");
        select_prop(&f.db, f.p2, f.game_id, PropKind::OverUnder, prop_id).unwrap();

        set_correct_answer(&f.db, PropKind::OverUnder, prop_id, CorrectAnswer::Single("Over".into()))
            .unwrap();
        let report = grade_game(&f.db, f.game_id).unwrap();

        assert_eq!(report.skipped_unselected, 1);
        assert_relative_eq!(points(&f.db, f.p1), 0.0, epsilon = 1e-9);
        assert_relative_eq!(points(&f.db, f.p2), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mandatory_prop_graded_without_selection() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| {
                let mut p = testutil::variable_option(f.game_id, &[("Yes", 1.0), ("No", 2.5)]);
                p.is_mandatory = true;
                s.insert_variable_option_prop(&p)
            })
            .unwrap();
        answer(&f.db, f.p1, PropKind::VariableOption, prop_id, "No");
        answer(&f.db, f.p2, PropKind::VariableOption, prop_id, "No");
        set_correct_answer(
            &f.db,
            PropKind::VariableOption,
            prop_id,
            CorrectAnswer::Multi(vec!["No".into()]),
        )
        .unwrap();

        grade_game(&f.db, f.game_id).unwrap();
        assert_relative_eq!(points(&f.db, f.p1), 2.5, epsilon = 1e-9);
        assert_relative_eq!(points(&f.db, f.p2), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_set_correct_answer_on_ungraded_game_just_overwrites() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| s.insert_over_under_prop(&testutil::over_under(f.game_id, 10.5, 1.0, 1.0)))
            .unwrap();
        set_correct_answer(&f.db, PropKind::OverUnder, prop_id, CorrectAnswer::Single("over".into()))
            .unwrap();
        let report =
            set_correct_answer(&f.db, PropKind::OverUnder, prop_id, CorrectAnswer::Single("under".into()))
                .unwrap();
        assert!(!report.game_was_graded);
        assert_eq!(report.awards_reversed, 0);
    }

    #[test]
    fn test_set_correct_answer_rejects_unknown_choice() {
        let f = fixture();
        let prop_id = f
            .db
            .write(|s| {
                s.insert_winner_loser_prop(&testutil::winner_loser(
                    f.game_id,
                    ("A", None, 2.0),
                    ("B", None, 3.0),
                ))
            })
            .unwrap();
        let err = set_correct_answer(&f.db, PropKind::WinnerLoser, prop_id, CorrectAnswer::Single("C".into()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        let err = set_correct_answer(&f.db, PropKind::WinnerLoser, 999, CorrectAnswer::Single("A".into()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn test_grade_unknown_game() {
        let f = fixture();
        assert!(matches!(
            grade_game(&f.db, 12345),
            Err(PipelineError::NotFound { entity: "game", .. })
        ));
    }
}
