pub mod auto;
pub mod engine;
pub mod selection;

pub use auto::{auto_grade_from_live_data, AutoGradeReport};
pub use engine::{grade_game, set_correct_answer, GradeReport, RegradeReport};
pub use selection::{deselect_prop, reset_selections, select_prop, submit_answer, ResetReport};

use serde::Serialize;

use crate::db::models::{CorrectAnswer, Prop, PropKind};
use crate::db::Database;
use crate::error::{PipelineError, Result};

impl Prop {
    /// Points a player earns for `answer` under the current correct answer,
    /// or `None` when it does not match (or no correct answer is set).
    pub fn points_for(&self, answer: &str) -> Option<f64> {
        match self {
            Prop::WinnerLoser(p) => {
                let correct = p.correct_answer.as_deref()?;
                if answer != correct {
                    return None;
                }
                if correct == p.favorite.name {
                    Some(p.favorite.points)
                } else if correct == p.underdog.name {
                    Some(p.underdog.points)
                } else {
                    None
                }
            }
            Prop::OverUnder(p) => {
                let correct = p.correct_answer.as_deref()?;
                if !answer.trim().eq_ignore_ascii_case(correct) {
                    return None;
                }
                match correct.to_ascii_lowercase().as_str() {
                    "over" => Some(p.over_points),
                    "under" => Some(p.under_points),
                    _ => None,
                }
            }
            Prop::VariableOption(p) => {
                let correct = p.correct_answer.as_ref()?;
                if !correct.iter().any(|c| c == answer) {
                    return None;
                }
                p.options.iter().find(|o| o.choice == answer).map(|o| o.points)
            }
            Prop::AnytimeTd(p) => {
                let correct = p.correct_answer.as_ref()?;
                if !correct.iter().any(|c| c == answer) {
                    return None;
                }
                p.options
                    .iter()
                    .find(|o| o.player_name == answer)
                    .map(|o| o.points)
            }
        }
    }

    /// Values a player may pick for this prop.
    pub fn valid_answers(&self) -> Vec<String> {
        match self {
            Prop::WinnerLoser(p) => vec![p.favorite.name.clone(), p.underdog.name.clone()],
            Prop::OverUnder(_) => vec!["over".into(), "under".into()],
            Prop::VariableOption(p) => p.options.iter().map(|o| o.choice.clone()).collect(),
            Prop::AnytimeTd(p) => p.options.iter().map(|o| o.player_name.clone()).collect(),
        }
    }
}

/// Check a player's answer against the prop's choices and return the value
/// to store. Over/under answers are stored lowercase.
pub fn normalize_answer(prop: &Prop, value: &str) -> Result<String> {
    let value = value.trim();
    let normalized = match prop {
        Prop::OverUnder(_) => value.to_ascii_lowercase(),
        _ => value.to_string(),
    };
    let valid = prop.valid_answers();
    if !valid.contains(&normalized) {
        return Err(PipelineError::Validation(format!(
            "'{}' is not a valid answer for {} prop {}; expected one of: {}",
            value,
            prop.kind(),
            prop.id(),
            valid.join(", ")
        )));
    }
    Ok(normalized)
}

/// Check a correct answer's shape and values against the prop.
///
/// Single-answer kinds take one valid choice. Multi-answer kinds take a list
/// of valid choices; a lone string is accepted as a one-element list and an
/// empty list means "nobody hit".
pub fn normalize_correct_answer(prop: &Prop, value: CorrectAnswer) -> Result<CorrectAnswer> {
    if prop.kind().is_multi_answer() {
        let values = match value {
            CorrectAnswer::Single(v) => vec![v],
            CorrectAnswer::Multi(vs) => vs,
        };
        let mut out: Vec<String> = Vec::with_capacity(values.len());
        for v in &values {
            let v = normalize_answer(prop, v)?;
            if !out.contains(&v) {
                out.push(v);
            }
        }
        Ok(CorrectAnswer::Multi(out))
    } else {
        match value {
            CorrectAnswer::Single(v) => Ok(CorrectAnswer::Single(normalize_answer(prop, &v)?)),
            CorrectAnswer::Multi(_) => Err(PipelineError::Validation(format!(
                "{} props take a single correct answer, not a list",
                prop.kind()
            ))),
        }
    }
}

/// A prop's saved correct answer, as listed for operators.
#[derive(Debug, Clone, Serialize)]
pub struct SavedCorrectAnswer {
    pub prop_kind: PropKind,
    pub prop_id: i64,
    pub question: String,
    pub correct_answer: Option<CorrectAnswer>,
}

pub fn correct_answers(db: &Database, game_id: i64) -> Result<Vec<SavedCorrectAnswer>> {
    db.read(|store| {
        store.require_game(game_id)?;
        let saved = store
            .props_for_game(game_id)?
            .iter()
            .map(|prop| SavedCorrectAnswer {
                prop_kind: prop.kind(),
                prop_id: prop.id(),
                question: prop.question().to_string(),
                correct_answer: prop.correct_answer(),
            })
            .collect();
        Ok(saved)
    })
}
