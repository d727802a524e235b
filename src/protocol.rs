//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Difficulty, QuizResult};
use crate::manager::QuizSnapshot;
use crate::session::{Misuse, Transition};
use crate::trivia::QuestionQuery;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  Load(LoadIn),
  Select {
    answer: String,
  },
  Confirm {
    #[serde(default = "default_record")]
    record: bool,
  },
  Advance,
  RecordAnswer,
  Choices,
  Save,
  DeleteHistory {
    id: Uuid,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  /// Pushed on connect and after every state change.
  Snapshot {
    snapshot: Box<QuizSnapshot>,
  },
  Choices {
    choices: Vec<String>,
  },
  Saved {
    result: QuizResult,
  },
  Deleted {
    id: Uuid,
    deleted: bool,
  },
  Ignored {
    op: &'static str,
    reason: Misuse,
  },
  Error {
    message: String,
  },
}

//
// HTTP request/response DTOs
//

/// Optional overrides of the configured default query.
#[derive(Debug, Default, Deserialize)]
pub struct LoadIn {
  pub amount: Option<u32>,
  pub category: Option<u32>,
  pub difficulty: Option<Difficulty>,
}

impl LoadIn {
  pub fn resolve(&self, defaults: QuestionQuery) -> QuestionQuery {
    QuestionQuery {
      amount: self.amount.unwrap_or(defaults.amount),
      category: self.category.unwrap_or(defaults.category),
      difficulty: self.difficulty.unwrap_or(defaults.difficulty),
    }
  }
}

#[derive(Deserialize)]
pub struct SelectIn {
  pub answer: String,
}

fn default_record() -> bool {
  true
}

/// Confirming also records the answer unless `record` is false.
#[derive(Deserialize)]
pub struct ConfirmIn {
  #[serde(default = "default_record")]
  pub record: bool,
}

impl Default for ConfirmIn {
  fn default() -> Self {
    Self { record: default_record() }
  }
}

#[derive(Debug, Serialize)]
pub struct TransitionOut {
  pub applied: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ignored: Option<Misuse>,
  pub snapshot: QuizSnapshot,
}

impl TransitionOut {
  pub fn new(t: Transition, snapshot: QuizSnapshot) -> Self {
    let ignored = match t {
      Transition::Applied => None,
      Transition::Ignored(reason) => Some(reason),
    };
    Self { applied: t.applied(), ignored, snapshot }
  }
}

#[derive(Serialize)]
pub struct ChoicesOut {
  pub choices: Vec<String>,
}

#[derive(Serialize)]
pub struct HistoryOut {
  pub entries: Vec<QuizResult>,
  #[serde(rename = "nextAttemptNumber")]
  pub next_attempt_number: u32,
}

#[derive(Serialize)]
pub struct DeletedOut {
  pub deleted: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub error: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_in_falls_back_to_defaults() {
    let q = LoadIn { difficulty: Some(Difficulty::Hard), ..LoadIn::default() }.resolve(QuestionQuery::default());
    assert_eq!(q, QuestionQuery { amount: 5, category: 9, difficulty: Difficulty::Hard });
  }

  #[test]
  fn client_messages_parse() {
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"load","amount":3}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::Load(LoadIn { amount: Some(3), .. })));

    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"confirm"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::Confirm { record: true }));

    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"select","answer":"Paris"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::Select { answer } if answer == "Paris"));
  }

  #[test]
  fn ignored_reply_is_tagged() {
    let v = serde_json::to_value(ServerWsMessage::Ignored { op: "advance", reason: Misuse::NotConfirmed }).unwrap();
    assert_eq!(v["type"], "ignored");
    assert_eq!(v["reason"], "not_confirmed");
  }
}
