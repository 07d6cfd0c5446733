use serde::Serialize;
use tracing::debug;

use super::normalize_answer;
use crate::db::models::{Answer, Prop, PropKind, PropSelection};
use crate::db::{Database, Store};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    pub selections_removed: usize,
    pub answers_removed: usize,
}

/// Opt a player into an optional prop.
pub fn select_prop(
    db: &Database,
    player_id: i64,
    game_id: i64,
    kind: PropKind,
    prop_id: i64,
) -> Result<PropSelection> {
    db.write(|store| {
        store.require_player(player_id)?;
        let game = store.require_game(game_id)?;
        let prop = prop_in_game(store, game_id, kind, prop_id)?;

        if prop.is_mandatory() {
            return Err(PipelineError::Validation(
                "Mandatory props cannot be manually selected".into(),
            ));
        }
        if store.has_selection(player_id, game_id, kind, prop_id)? {
            return Err(PipelineError::Validation(format!(
                "{} prop {} is already selected",
                kind, prop_id
            )));
        }

        let held = optional_selection_count(store, player_id, game_id)?;
        if held >= game.prop_limit as usize {
            return Err(PipelineError::Validation(format!(
                "already selected {} optional props for this game",
                game.prop_limit
            )));
        }

        let selection = store.insert_selection(player_id, game_id, kind, prop_id)?;
        debug!(
            "Player {} selected {} prop {} ({}/{})",
            player_id,
            kind,
            prop_id,
            held + 1,
            game.prop_limit
        );
        Ok(selection)
    })
}

/// Drop a selection and the player's answer on that prop.
pub fn deselect_prop(db: &Database, selection_id: i64, player_id: i64) -> Result<()> {
    db.write(|store| {
        let selection = store
            .get_selection(selection_id)?
            .ok_or_else(|| PipelineError::not_found("prop selection", selection_id))?;
        if selection.player_id != player_id {
            return Err(PipelineError::Validation(
                "You can only deselect your own prop selections".into(),
            ));
        }
        let prop = store.require_prop(selection.prop_kind, selection.prop_id)?;
        if prop.is_mandatory() {
            return Err(PipelineError::Validation(
                "Mandatory props cannot be deselected".into(),
            ));
        }

        store.delete_selection(selection_id)?;
        store.delete_answer(player_id, selection.prop_kind, selection.prop_id)?;
        Ok(())
    })
}

/// Remove all of a player's selections for a game and their answers on the
/// game's optional props.
pub fn reset_selections(db: &Database, player_id: i64, game_id: i64) -> Result<ResetReport> {
    db.write(|store| {
        store.require_game(game_id)?;
        let mut report = ResetReport::default();

        for prop in store.props_for_game(game_id)? {
            if !prop.is_mandatory() {
                report.answers_removed += store.delete_answer(player_id, prop.kind(), prop.id())?;
            }
        }
        for selection in store.selections_for_player_game(player_id, game_id)? {
            store.delete_selection(selection.id)?;
            report.selections_removed += 1;
        }
        Ok(report)
    })
}

/// Mandatory props are always answerable; optional ones need a selection.
pub fn ensure_can_answer(
    store: &Store<'_>,
    player_id: i64,
    game_id: i64,
    kind: PropKind,
    prop_id: i64,
) -> Result<Prop> {
    let prop = prop_in_game(store, game_id, kind, prop_id)?;
    if prop.is_mandatory() || store.has_selection(player_id, game_id, kind, prop_id)? {
        Ok(prop)
    } else {
        Err(PipelineError::Validation(format!(
            "{} prop {} is optional; select it before answering",
            kind, prop_id
        )))
    }
}

/// Record a player's answer through the selection gate.
pub fn submit_answer(
    db: &Database,
    player_id: i64,
    game_id: i64,
    kind: PropKind,
    prop_id: i64,
    value: &str,
) -> Result<Answer> {
    db.write(|store| {
        store.require_player(player_id)?;
        let prop = ensure_can_answer(store, player_id, game_id, kind, prop_id)?;
        let value = normalize_answer(&prop, value)?;
        store.upsert_answer(player_id, kind, prop_id, &value)
    })
}

fn prop_in_game(store: &Store<'_>, game_id: i64, kind: PropKind, prop_id: i64) -> Result<Prop> {
    let prop = store.require_prop(kind, prop_id)?;
    if prop.game_id() != game_id {
        return Err(PipelineError::Validation(format!(
            "{} prop {} does not belong to the specified game",
            kind, prop_id
        )));
    }
    Ok(prop)
}

fn optional_selection_count(store: &Store<'_>, player_id: i64, game_id: i64) -> Result<usize> {
    let mut count = 0;
    for selection in store.selections_for_player_game(player_id, game_id)? {
        let optional = store
            .get_prop(selection.prop_kind, selection.prop_id)?
            .is_some_and(|p| !p.is_mandatory());
        if optional {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Utc;

    struct Fixture {
        db: Database,
        game_id: i64,
        player_id: i64,
        optional: Vec<i64>,
        mandatory: i64,
    }

    /// Game with prop_limit 2, three optional over/unders and one mandatory
    /// winner/loser.
    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let (game_id, player_id) = db
            .write(|s| {
                let g = s.insert_game(&testutil::game(Some("401"), Utc::now()))?;
                let p = s.insert_player(&testutil::player("alice"))?;
                Ok((g, p))
            })
            .unwrap();
        let optional = (0..3)
            .map(|i| {
                db.write(|s| {
                    s.insert_over_under_prop(&testutil::over_under(game_id, 10.5 + i as f64, 1.0, 1.0))
                })
                .unwrap()
            })
            .collect();
        let mandatory = db
            .write(|s| {
                s.insert_winner_loser_prop(&testutil::winner_loser(
                    game_id,
                    ("Kansas City Chiefs", Some("KC"), 1.0),
                    ("Baltimore Ravens", Some("BAL"), 2.0),
                ))
            })
            .unwrap();
        Fixture {
            db,
            game_id,
            player_id,
            optional,
            mandatory,
        }
    }

    #[test]
    fn test_selection_limit() {
        let f = fixture();
        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[0]).unwrap();
        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[1]).unwrap();

        let err = select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[2])
            .unwrap_err();
        assert!(err.to_string().contains("already selected 2 optional props"));
    }

    #[test]
    fn test_select_rejects_mandatory_duplicate_and_foreign_prop() {
        let f = fixture();
        let err = select_prop(&f.db, f.player_id, f.game_id, PropKind::WinnerLoser, f.mandatory)
            .unwrap_err();
        assert!(err.to_string().contains("Mandatory props"));

        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[0]).unwrap();
        let err = select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[0])
            .unwrap_err();
        assert!(err.to_string().contains("already selected"));

        let other_game = f
            .db
            .write(|s| s.insert_game(&testutil::game(Some("402"), Utc::now())))
            .unwrap();
        let err = select_prop(&f.db, f.player_id, other_game, PropKind::OverUnder, f.optional[1])
            .unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[test]
    fn test_mandatory_always_answerable() {
        let f = fixture();
        let answer = submit_answer(
            &f.db,
            f.player_id,
            f.game_id,
            PropKind::WinnerLoser,
            f.mandatory,
            "Baltimore Ravens",
        )
        .unwrap();
        assert_eq!(answer.value, "Baltimore Ravens");
    }

    #[test]
    fn test_optional_needs_selection_before_answer() {
        let f = fixture();
        let prop_id = f.optional[0];
        let err = submit_answer(&f.db, f.player_id, f.game_id, PropKind::OverUnder, prop_id, "over")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, prop_id).unwrap();
        let answer =
            submit_answer(&f.db, f.player_id, f.game_id, PropKind::OverUnder, prop_id, "UNDER")
                .unwrap();
        assert_eq!(answer.value, "under");
    }

    #[test]
    fn test_deselect_removes_answer_and_checks_owner() {
        let f = fixture();
        let prop_id = f.optional[0];
        let selection =
            select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, prop_id).unwrap();
        submit_answer(&f.db, f.player_id, f.game_id, PropKind::OverUnder, prop_id, "over").unwrap();

        let err = deselect_prop(&f.db, selection.id, f.player_id + 100).unwrap_err();
        assert!(err.to_string().contains("your own"));

        deselect_prop(&f.db, selection.id, f.player_id).unwrap();
        let answers = f
            .db
            .read(|s| s.answers_for_prop(PropKind::OverUnder, prop_id))
            .unwrap();
        assert!(answers.is_empty());

        // The freed slot can be reused
        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[1]).unwrap();
        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[2]).unwrap();
    }

    #[test]
    fn test_reset_selections_keeps_mandatory_answers() {
        let f = fixture();
        select_prop(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[0]).unwrap();
        submit_answer(&f.db, f.player_id, f.game_id, PropKind::OverUnder, f.optional[0], "over")
            .unwrap();
        submit_answer(
            &f.db,
            f.player_id,
            f.game_id,
            PropKind::WinnerLoser,
            f.mandatory,
            "Kansas City Chiefs",
        )
        .unwrap();

        let report = reset_selections(&f.db, f.player_id, f.game_id).unwrap();
        assert_eq!(report.selections_removed, 1);
        assert_eq!(report.answers_removed, 1);

        let mandatory_answers = f
            .db
            .read(|s| s.answers_for_prop(PropKind::WinnerLoser, f.mandatory))
            .unwrap();
        assert_eq!(mandatory_answers.len(), 1);
        let selections = f
            .db
            .read(|s| s.selections_for_player_game(f.player_id, f.game_id))
            .unwrap();
        assert!(selections.is_empty());
    }
}
