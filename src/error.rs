//! Error type of the local API surface and its HTTP mapping.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};

use crate::protocol::ErrorOut;
use crate::trivia::TriviaError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// Fetching questions failed; the run was not (re)loaded.
  #[error("Question fetch failed: {0}")]
  Trivia(#[from] TriviaError),

  #[error("Not found: {0}")]
  NotFound(String),

  /// Request body present but not a valid payload for the endpoint.
  #[error("Bad request: {0}")]
  BadRequest(String),

  /// `save` with no run loaded.
  #[error("No quiz run to save")]
  NothingToSave,
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Trivia(_) => StatusCode::BAD_GATEWAY,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NothingToSave => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
