//! Domain models: questions as served to a run, and the per-run results kept in history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Difficulty levels understood by the trivia provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(format!("unknown difficulty: {}", other)),
    }
  }
}

/// One multiple-choice question. Text fields are already entity-decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  /// Generated locally; the provider has no stable ids.
  pub id: Uuid,
  pub category: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub difficulty: Difficulty,
  pub prompt: String,
  pub correct_answer: String,
  pub incorrect_answers: Vec<String>,
}

/// Per-question outcome stored inside a `QuizResult`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
  pub id: Uuid,
  pub question: String,
  pub correct_answer: String,
  /// `None` means the question was never answered.
  #[serde(default)]
  pub selected_answer: Option<String>,
}

impl QuestionResult {
  pub fn is_correct(&self) -> bool {
    self.selected_answer.as_deref() == Some(self.correct_answer.as_str())
  }
}

/// One finished (or abandoned) run, as persisted in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub id: Uuid,
  pub date: DateTime<Utc>,
  pub score: u32,
  pub total_questions: u32,
  pub attempt_number: u32,
  pub question_results: Vec<QuestionResult>,
}
