//! The quiz manager: the single state container the presentation side talks to.
//!
//! It composes the session state machine, the answer log and the history store,
//! and publishes an immutable `QuizSnapshot` over a `watch` channel after every
//! change. Callers never touch the parts directly.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Question, QuestionResult, QuizResult};
use crate::history::{HistoryStore, PersistenceWarning};
use crate::session::{AnswerLog, Session, SessionPhase, Transition};
use crate::trivia::TriviaError;

/// Progress of the most recent question fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
  #[default]
  Idle,
  Loading,
  Ready,
  /// The fetch failed; a retry is a fresh fetch.
  Failed { message: String },
}

/// Everything the presentation side may render.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSnapshot {
  pub questions: Vec<Question>,
  pub current_index: usize,
  pub selected_answer: Option<String>,
  pub is_answered: bool,
  pub score: u32,
  pub finished: bool,
  pub phase: SessionPhase,
  pub load_status: LoadStatus,
  pub recorded_answers: Vec<Option<String>>,
  pub quiz_history: Vec<QuizResult>,
  pub next_attempt_number: u32,
  pub last_warning: Option<PersistenceWarning>,
}

pub struct QuizManager {
  session: Session,
  answers: AnswerLog,
  history: HistoryStore,
  load_status: LoadStatus,
  tx: watch::Sender<QuizSnapshot>,
}

impl QuizManager {
  pub fn new(history: HistoryStore) -> Self {
    let session = Session::new();
    let answers = AnswerLog::default();
    let load_status = LoadStatus::Idle;
    let initial = build_snapshot(&session, &answers, &history, &load_status);
    let (tx, _rx) = watch::channel(initial);
    Self { session, answers, history, load_status, tx }
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn answers(&self) -> &AnswerLog {
    &self.answers
  }

  pub fn history(&self) -> &HistoryStore {
    &self.history
  }

  pub fn load_status(&self) -> &LoadStatus {
    &self.load_status
  }

  pub fn snapshot(&self) -> QuizSnapshot {
    build_snapshot(&self.session, &self.answers, &self.history, &self.load_status)
  }

  /// Receive a fresh snapshot after every change.
  pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
    self.tx.subscribe()
  }

  fn publish(&self) {
    self.tx.send_replace(self.snapshot());
  }

  fn settle(&self, op: &'static str, t: Transition) -> Transition {
    match t {
      Transition::Applied => self.publish(),
      Transition::Ignored(reason) => {
        debug!(target: "quiz", op, ?reason, index = self.session.current_index(), "Transition ignored");
      }
    }
    t
  }

  /// Mark a fetch as in flight. The current session stays as it is until the result arrives.
  pub fn begin_loading(&mut self) {
    self.load_status = LoadStatus::Loading;
    self.publish();
  }

  /// Apply the outcome of a fetch. On failure the previous session is kept and
  /// the status becomes `Failed`; the error is handed back to the caller.
  pub fn finish_loading(&mut self, outcome: Result<Vec<Question>, TriviaError>) -> Result<(), TriviaError> {
    match outcome {
      Ok(questions) => {
        if !self.load(questions).applied() {
          self.load_status = LoadStatus::Failed { message: TriviaError::NoQuestions.to_string() };
          self.publish();
          return Err(TriviaError::NoQuestions);
        }
        Ok(())
      }
      Err(e) => {
        warn!(target: "quiz", error = %e, "Question fetch failed");
        self.load_status = LoadStatus::Failed { message: e.to_string() };
        self.publish();
        Err(e)
      }
    }
  }

  #[instrument(level = "info", skip_all, fields(count = questions.len()))]
  pub fn load(&mut self, questions: Vec<Question>) -> Transition {
    let len = questions.len();
    let t = self.session.load(questions);
    if t.applied() {
      self.answers = AnswerLog::with_len(len);
      self.load_status = LoadStatus::Ready;
      info!(target: "quiz", count = len, attempt = self.history.next_attempt_number(), "Run started");
    }
    self.settle("load", t)
  }

  pub fn select(&mut self, answer: impl Into<String>) -> Transition {
    let t = self.session.select(answer);
    self.settle("select", t)
  }

  pub fn confirm(&mut self) -> Transition {
    let before = self.session.score();
    let t = self.session.confirm();
    if t.applied() {
      debug!(target: "quiz", index = self.session.current_index(), correct = self.session.score() > before, "Answer confirmed");
    }
    self.settle("confirm", t)
  }

  pub fn advance(&mut self) -> Transition {
    let t = self.session.advance();
    if t.applied() && self.session.finished() {
      info!(target: "quiz", score = self.session.score(), total = self.session.questions().len(), "Run finished");
    }
    self.settle("advance", t)
  }

  pub fn record_current_answer(&mut self) -> Transition {
    let t = self.answers.record_current(&self.session);
    self.settle("record_current_answer", t)
  }

  pub fn shuffled_choices(&self) -> Vec<String> {
    self.session.shuffled_choices()
  }

  pub fn is_correct(&self, answer: &str) -> bool {
    self.session.is_correct(answer)
  }

  /// Turn the current run (finished or abandoned) into a history entry and
  /// discard it. Returns `None` when no run is loaded.
  #[instrument(level = "info", skip(self))]
  pub fn save_result(&mut self) -> Option<QuizResult> {
    if self.session.phase() == SessionPhase::Empty {
      debug!(target: "quiz", "save_result without a loaded run");
      return None;
    }

    let question_results = self
      .session
      .questions()
      .iter()
      .enumerate()
      .map(|(i, q)| QuestionResult {
        id: Uuid::new_v4(),
        question: q.prompt.clone(),
        correct_answer: q.correct_answer.clone(),
        selected_answer: self.answers.get(i).map(str::to_string),
      })
      .collect::<Vec<_>>();

    let result = QuizResult {
      id: Uuid::new_v4(),
      date: Utc::now(),
      score: self.session.score(),
      total_questions: question_results.len() as u32,
      attempt_number: self.history.next_attempt_number(),
      question_results,
    };

    self.history.append(result.clone());
    info!(target: "quiz", id = %result.id, attempt = result.attempt_number, score = result.score, total = result.total_questions, "Result saved");

    self.session.reset();
    self.answers = AnswerLog::default();
    self.load_status = LoadStatus::Idle;
    self.publish();
    Some(result)
  }

  /// Remove a history entry. Returns whether it existed.
  pub fn delete_history_entry(&mut self, id: Uuid) -> bool {
    let removed = self.history.remove(id);
    if removed {
      info!(target: "quiz", %id, "History entry deleted");
      self.publish();
    }
    removed
  }
}

fn build_snapshot(
  session: &Session,
  answers: &AnswerLog,
  history: &HistoryStore,
  load_status: &LoadStatus,
) -> QuizSnapshot {
  QuizSnapshot {
    questions: session.questions().to_vec(),
    current_index: session.current_index(),
    selected_answer: session.selected_answer().map(str::to_string),
    is_answered: session.is_answered(),
    score: session.score(),
    finished: session.finished(),
    phase: session.phase(),
    load_status: load_status.clone(),
    recorded_answers: answers.slots().to_vec(),
    quiz_history: history.entries().to_vec(),
    next_attempt_number: history.next_attempt_number(),
    last_warning: history.last_warning().cloned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;
  use crate::storage::MemoryStore;
  use std::sync::Arc;

  fn questions(n: usize) -> Vec<Question> {
    (0..n)
      .map(|i| Question {
        id: Uuid::new_v4(),
        category: "Science".into(),
        kind: "multiple".into(),
        difficulty: Difficulty::Medium,
        prompt: format!("Q{}", i),
        correct_answer: format!("A{}", i),
        incorrect_answers: vec!["x".into(), "y".into(), "z".into()],
      })
      .collect()
  }

  fn manager() -> QuizManager {
    QuizManager::new(HistoryStore::load(Arc::new(MemoryStore::new())))
  }

  #[test]
  fn load_publishes_ready_snapshot() {
    let mut m = manager();
    let rx = m.subscribe();
    m.begin_loading();
    assert_eq!(rx.borrow().load_status, LoadStatus::Loading);

    m.finish_loading(Ok(questions(3))).unwrap();
    let snap = rx.borrow().clone();
    assert_eq!(snap.load_status, LoadStatus::Ready);
    assert_eq!(snap.questions.len(), 3);
    assert_eq!(snap.recorded_answers, vec![None, None, None]);
    assert_eq!(snap.phase, SessionPhase::Answering);
  }

  #[test]
  fn failed_fetch_keeps_previous_run() {
    let mut m = manager();
    m.load(questions(2));
    m.select("A0");
    m.begin_loading();
    let err = m.finish_loading(Err(TriviaError::Network("connection refused".into()))).unwrap_err();
    assert!(matches!(err, TriviaError::Network(_)));
    assert!(matches!(m.load_status(), LoadStatus::Failed { .. }));
    assert_eq!(m.session().questions().len(), 2);
    assert_eq!(m.session().selected_answer(), Some("A0"));
  }

  #[test]
  fn empty_fetch_result_fails_loading() {
    let mut m = manager();
    m.begin_loading();
    assert_eq!(m.finish_loading(Ok(vec![])), Err(TriviaError::NoQuestions));
    assert_eq!(m.session().phase(), SessionPhase::Empty);
  }

  #[test]
  fn ignored_transition_does_not_publish() {
    let mut m = manager();
    m.load(questions(1));
    let rx = m.subscribe();
    assert!(!m.advance().applied());
    assert!(!rx.has_changed().unwrap());
    m.select("A0");
    assert!(rx.has_changed().unwrap());
  }

  #[test]
  fn save_result_discards_run_and_bumps_attempt() {
    let mut m = manager();
    m.load(questions(1));
    m.select("A0");
    m.confirm();
    m.record_current_answer();
    m.advance();

    let r = m.save_result().unwrap();
    assert_eq!(r.attempt_number, 1);
    assert_eq!(r.score, 1);
    assert_eq!(m.session().phase(), SessionPhase::Empty);
    assert_eq!(m.load_status(), &LoadStatus::Idle);
    assert_eq!(m.snapshot().next_attempt_number, 2);
    assert_eq!(m.snapshot().quiz_history, vec![r]);
  }

  #[test]
  fn save_without_run_is_none() {
    let mut m = manager();
    assert!(m.save_result().is_none());
    assert!(m.history().is_empty());
  }

  #[test]
  fn persistence_warning_reaches_snapshot() {
    let storage = Arc::new(MemoryStore::new());
    let mut m = QuizManager::new(HistoryStore::load(storage.clone()));
    storage.set_fail_writes(true);
    m.load(questions(1));
    assert!(m.save_result().is_some());

    let snap = m.snapshot();
    assert_eq!(snap.quiz_history.len(), 1);
    assert!(snap.last_warning.is_some());
  }
}
