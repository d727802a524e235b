//! HTTP endpoint handlers. These are thin wrappers that forward to the quiz manager.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::manager::QuizSnapshot;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>) -> Json<QuizSnapshot> {
  Json(state.manager.read().await.snapshot())
}

/// A request without a JSON body falls back to the payload's defaults.
/// Any other rejection (bad syntax, wrong field types) is a 400.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  match body {
    Ok(Json(b)) => Ok(b),
    Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
    Err(e) => {
      warn!(target: "trivia_backend", error = %e.body_text(), "Rejected request body");
      Err(ApiError::BadRequest(e.body_text()))
    }
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_load(
  State(state): State<Arc<AppState>>,
  body: Result<Json<LoadIn>, JsonRejection>,
) -> Result<Json<QuizSnapshot>, ApiError> {
  let query = body_or_default(body)?.resolve(state.default_query);
  state.load_questions(query).await?;
  let snapshot = state.manager.read().await.snapshot();
  info!(target: "quiz", count = snapshot.questions.len(), difficulty = %query.difficulty, "HTTP load served");
  Ok(Json(snapshot))
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.answer.len()))]
pub async fn http_post_select(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectIn>,
) -> Json<TransitionOut> {
  let mut m = state.manager.write().await;
  let t = m.select(body.answer);
  Json(TransitionOut::new(t, m.snapshot()))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_confirm(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ConfirmIn>, JsonRejection>,
) -> Result<Json<TransitionOut>, ApiError> {
  let record = body_or_default(body)?.record;
  let mut m = state.manager.write().await;
  let t = m.confirm();
  if t.applied() && record {
    m.record_current_answer();
  }
  info!(target: "quiz", applied = t.applied(), score = m.session().score(), "HTTP confirm evaluated");
  Ok(Json(TransitionOut::new(t, m.snapshot())))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_record(State(state): State<Arc<AppState>>) -> Json<TransitionOut> {
  let mut m = state.manager.write().await;
  let t = m.record_current_answer();
  Json(TransitionOut::new(t, m.snapshot()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_advance(State(state): State<Arc<AppState>>) -> Json<TransitionOut> {
  let mut m = state.manager.write().await;
  let t = m.advance();
  Json(TransitionOut::new(t, m.snapshot()))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_choices(State(state): State<Arc<AppState>>) -> Json<ChoicesOut> {
  let choices = state.manager.read().await.shuffled_choices();
  Json(ChoicesOut { choices })
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_save(
  State(state): State<Arc<AppState>>,
) -> Result<Json<crate::domain::QuizResult>, ApiError> {
  let result = state.manager.write().await.save_result().ok_or(ApiError::NothingToSave)?;
  Ok(Json(result))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_history(State(state): State<Arc<AppState>>) -> Json<HistoryOut> {
  let m = state.manager.read().await;
  Json(HistoryOut {
    entries: m.history().entries().to_vec(),
    next_attempt_number: m.history().next_attempt_number(),
  })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_history(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeletedOut>, ApiError> {
  if state.manager.write().await.delete_history_entry(id) {
    Ok(Json(DeletedOut { deleted: true }))
  } else {
    Err(ApiError::NotFound(format!("history entry {}", id)))
  }
}
