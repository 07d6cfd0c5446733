use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::db::models::{CorrectAnswer, PropKind};
use crate::error::PipelineError;
use crate::grading;
use crate::poller::{self, Poller, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
    pub scheduler: Arc<Scheduler>,
}

/// Build the Axum router for the operator API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/poll", post(poll_all_handler))
        .route("/api/games/:id/poll", post(poll_game_handler))
        .route("/api/games/:id/auto-grade", post(auto_grade_handler))
        .route("/api/games/:id/grade", post(grade_handler))
        .route("/api/games/:id/live-stats", get(live_stats_handler))
        .route("/api/games/:id/correct-answers", get(correct_answers_handler))
        .route("/api/games/:id/players", get(game_players_handler))
        .route("/api/games/:id/selections", post(select_prop_handler))
        .route("/api/games/:id/selections/reset", post(reset_selections_handler))
        .route("/api/games/:id/answers", put(submit_answer_handler))
        .route("/api/selections/:id", delete(deselect_prop_handler))
        .route("/api/events/:external_id/players", get(event_players_handler))
        .route("/api/props/:kind/:id/correct-answer", put(set_correct_answer_handler))
        .route("/api/scoreboard", get(scoreboard_handler))
        .route("/api/scheduler", get(scheduler_status_handler))
        .route("/api/scheduler/pause", post(scheduler_pause_handler))
        .route("/api/scheduler/resume", post(scheduler_resume_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Pipeline error rendered as `{"success": false, "error": reason}`.
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::InvalidState(_) => StatusCode::CONFLICT,
            PipelineError::FeedUnavailable(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Database(_) | PipelineError::Serialization(_) => {
                error!("API request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({ "success": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn success<T: Serialize>(data: T) -> ApiResult {
    let data = serde_json::to_value(data).map_err(PipelineError::from)?;
    Ok(Json(json!({ "success": true, "data": data })))
}

#[derive(Debug, Deserialize)]
struct PlayersQuery {
    /// Comma-separated position abbreviations, e.g. "QB,RB"
    positions: Option<String>,
}

impl PlayersQuery {
    fn positions(&self) -> Vec<String> {
        self.positions
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ScoreboardQuery {
    /// YYYYMMDD
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CorrectAnswerBody {
    correct_answer: CorrectAnswer,
}

#[derive(Debug, Deserialize)]
struct PlayerBody {
    player_id: i64,
}

#[derive(Debug, Deserialize)]
struct SelectionBody {
    player_id: i64,
    prop_kind: PropKind,
    prop_id: i64,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    player_id: i64,
    prop_kind: PropKind,
    prop_id: i64,
    value: String,
}

/// POST /api/poll
async fn poll_all_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    success(state.poller.poll_all_active_games().await)
}

/// POST /api/games/:id/poll
async fn poll_game_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    success(state.poller.manually_trigger_poll(id).await?)
}

/// POST /api/games/:id/auto-grade
async fn auto_grade_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    success(grading::auto_grade_from_live_data(state.poller.db(), id)?)
}

/// POST /api/games/:id/grade
async fn grade_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    success(grading::grade_game(state.poller.db(), id)?)
}

/// GET /api/games/:id/live-stats
async fn live_stats_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    success(poller::live_stats(state.poller.db(), id)?)
}

/// GET /api/games/:id/correct-answers
async fn correct_answers_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult {
    success(grading::correct_answers(state.poller.db(), id)?)
}

/// GET /api/games/:id/players?positions=QB,RB
async fn game_players_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<PlayersQuery>,
) -> ApiResult {
    let game = state.poller.db().read(|store| store.require_game(id))?;
    let external_id = game.external_id.ok_or_else(|| {
        PipelineError::Validation(format!("game {} has no external game ID", id))
    })?;
    let players = state
        .poller
        .feed()
        .roster(&external_id, &query.positions())
        .await;
    success(players)
}

/// GET /api/events/:external_id/players?positions=QB,RB
async fn event_players_handler(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Query(query): Query<PlayersQuery>,
) -> ApiResult {
    let players = state
        .poller
        .feed()
        .roster(&external_id, &query.positions())
        .await;
    success(players)
}

/// POST /api/games/:id/selections
async fn select_prop_handler(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<i64>,
    Json(body): Json<SelectionBody>,
) -> ApiResult {
    success(grading::select_prop(
        state.poller.db(),
        body.player_id,
        game_id,
        body.prop_kind,
        body.prop_id,
    )?)
}

/// POST /api/games/:id/selections/reset
async fn reset_selections_handler(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<i64>,
    Json(body): Json<PlayerBody>,
) -> ApiResult {
    success(grading::reset_selections(
        state.poller.db(),
        body.player_id,
        game_id,
    )?)
}

/// DELETE /api/selections/:id
async fn deselect_prop_handler(
    State(state): State<Arc<AppState>>,
    Path(selection_id): Path<i64>,
    Json(body): Json<PlayerBody>,
) -> ApiResult {
    grading::deselect_prop(state.poller.db(), selection_id, body.player_id)?;
    success(json!({ "selection_id": selection_id }))
}

/// PUT /api/games/:id/answers
async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<i64>,
    Json(body): Json<AnswerBody>,
) -> ApiResult {
    success(grading::submit_answer(
        state.poller.db(),
        body.player_id,
        game_id,
        body.prop_kind,
        body.prop_id,
        &body.value,
    )?)
}

/// PUT /api/props/:kind/:id/correct-answer
async fn set_correct_answer_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
    Json(body): Json<CorrectAnswerBody>,
) -> ApiResult {
    let kind: PropKind = kind.parse().map_err(PipelineError::Validation)?;
    success(grading::set_correct_answer(
        state.poller.db(),
        kind,
        id,
        body.correct_answer,
    )?)
}

/// GET /api/scoreboard?date=YYYYMMDD
async fn scoreboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoreboardQuery>,
) -> ApiResult {
    let date = match query.date.as_deref() {
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| {
            PipelineError::Validation(format!("invalid date '{}', expected YYYYMMDD", raw))
        })?),
        None => None,
    };
    success(state.poller.feed().scoreboard(date).await)
}

/// GET /api/scheduler
async fn scheduler_status_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    success(state.scheduler.status())
}

/// POST /api/scheduler/pause
async fn scheduler_pause_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.scheduler.pause();
    success(state.scheduler.status())
}

/// POST /api/scheduler/resume
async fn scheduler_resume_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.scheduler.resume();
    success(state.scheduler.status())
}
