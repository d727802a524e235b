//! Minimal Open Trivia DB client.
//!
//! One GET per call, no retry. The provider HTML-encodes every text field, so
//! decoded questions have their entities resolved before they leave this module.
//! Calls are instrumented and log status, latency and sizes (not contents).

use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::TriviaConfig;
use crate::domain::{Difficulty, Question};
use crate::util::{decode_entities, trunc_for_log};

/// Failure of a single fetch. Surfaces once to whoever asked for questions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriviaError {
  /// Bad URL, transport failure, or a non-success HTTP status.
  #[error("network error: {0}")]
  Network(String),
  /// The body did not have the expected shape.
  #[error("could not decode trivia response: {0}")]
  Decode(String),
  /// The provider answered but reported a non-zero `response_code`.
  #[error("trivia provider returned code {code}: {reason}")]
  Upstream { code: u8, reason: &'static str },
  #[error("trivia provider returned no questions")]
  NoQuestions,
}

fn upstream_reason(code: u8) -> &'static str {
  match code {
    1 => "not enough questions for this query",
    2 => "invalid parameter",
    3 => "session token not found",
    4 => "session token exhausted",
    5 => "rate limited",
    _ => "unknown response code",
  }
}

/// Parameters of one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuestionQuery {
  pub amount: u32,
  pub category: u32,
  pub difficulty: Difficulty,
}

impl Default for QuestionQuery {
  fn default() -> Self {
    Self { amount: 5, category: 9, difficulty: Difficulty::Easy }
  }
}

#[derive(Deserialize)]
struct ApiResponse {
  #[serde(default)]
  response_code: u8,
  #[serde(default)]
  results: Option<Vec<RawQuestion>>,
}

#[derive(Deserialize)]
struct RawQuestion {
  category: String,
  #[serde(rename = "type")]
  kind: String,
  difficulty: String,
  question: String,
  correct_answer: String,
  incorrect_answers: Vec<String>,
}

impl RawQuestion {
  fn into_question(self) -> Result<Question, TriviaError> {
    let difficulty = self.difficulty.parse::<Difficulty>().map_err(TriviaError::Decode)?;
    Ok(Question {
      id: Uuid::new_v4(),
      category: decode_entities(&self.category),
      kind: self.kind,
      difficulty,
      prompt: decode_entities(&self.question),
      correct_answer: decode_entities(&self.correct_answer),
      incorrect_answers: self.incorrect_answers.iter().map(|s| decode_entities(s)).collect(),
    })
  }
}

#[derive(Clone)]
pub struct TriviaClient {
  client: reqwest::Client,
  pub base_url: String,
}

impl TriviaClient {
  /// Build the HTTP client. The timeout is optional; without one reqwest's default applies.
  pub fn new(cfg: &TriviaConfig) -> Result<Self, TriviaError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = cfg.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().map_err(|e| TriviaError::Network(e.to_string()))?;
    Ok(Self { client, base_url: cfg.base_url.clone() })
  }

  /// Full request URL for a query, including the fixed `type=multiple` constraint.
  pub fn request_url(&self, query: &QuestionQuery) -> Result<reqwest::Url, TriviaError> {
    let endpoint = format!("{}/api.php", self.base_url.trim_end_matches('/'));
    let mut url = reqwest::Url::parse(&endpoint)
      .map_err(|e| TriviaError::Network(format!("invalid URL {}: {}", endpoint, e)))?;
    url
      .query_pairs_mut()
      .append_pair("amount", &query.amount.to_string())
      .append_pair("category", &query.category.to_string())
      .append_pair("difficulty", query.difficulty.as_str())
      .append_pair("type", "multiple");
    Ok(url)
  }

  #[instrument(level = "info", skip(self), fields(amount = query.amount, category = query.category, difficulty = %query.difficulty))]
  pub async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, TriviaError> {
    let url = self.request_url(query)?;
    let started = Instant::now();

    let res = self.client.get(url)
      .header(USER_AGENT, "trivia-backend/0.1")
      .send().await
      .map_err(|e| TriviaError::Network(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "quiz", %status, body = %trunc_for_log(&body, 200), "Trivia provider returned an error status");
      return Err(TriviaError::Network(format!("HTTP {}", status)));
    }

    let body = res.text().await.map_err(|e| TriviaError::Network(e.to_string()))?;
    info!(target: "quiz", %status, bytes = body.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Trivia response received");

    let questions = parse_response(&body)?;
    info!(target: "quiz", count = questions.len(), "Trivia questions decoded");
    Ok(questions)
  }
}

/// Decode a provider body into questions. Split out so it can be tested without a server.
pub fn parse_response(body: &str) -> Result<Vec<Question>, TriviaError> {
  let parsed: ApiResponse = serde_json::from_str(body).map_err(|e| {
    error!(target: "quiz", error = %e, body = %trunc_for_log(body, 200), "Trivia response shape mismatch");
    TriviaError::Decode(e.to_string())
  })?;

  if parsed.response_code != 0 {
    return Err(TriviaError::Upstream {
      code: parsed.response_code,
      reason: upstream_reason(parsed.response_code),
    });
  }

  let raw = parsed.results.ok_or_else(|| TriviaError::Decode("missing `results` array".into()))?;
  if raw.is_empty() {
    return Err(TriviaError::NoQuestions);
  }
  raw.into_iter().map(RawQuestion::into_question).collect()
}
