//! Quiz history: every saved run, persisted as one JSON array under a single key.
//!
//! Persistence is best-effort. Read failures degrade to an empty history and
//! write failures keep the in-memory state; both are recorded as a
//! `PersistenceWarning` (and logged) instead of failing the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::QuizResult;
use crate::storage::KeyValueStore;

/// Storage key holding the serialized history.
pub const HISTORY_KEY: &str = "quizHistory";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceOp {
  Load,
  Save,
}

/// A swallowed persistence failure, kept so callers can observe it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersistenceWarning {
  pub op: PersistenceOp,
  pub message: String,
}

pub struct HistoryStore {
  storage: Arc<dyn KeyValueStore>,
  entries: Vec<QuizResult>,
  next_attempt: u32,
  last_warning: Option<PersistenceWarning>,
}

impl HistoryStore {
  /// Read the stored history once at startup. Never fails: a missing slot is
  /// an empty history, an unreadable or corrupt one is an empty history plus a warning.
  #[instrument(level = "info", skip_all)]
  pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
    let (entries, last_warning) = match storage.get(HISTORY_KEY) {
      Ok(None) => (Vec::new(), None),
      Ok(Some(blob)) => match serde_json::from_str::<Vec<QuizResult>>(&blob) {
        Ok(entries) => (entries, None),
        Err(e) => {
          warn!(target: "quiz", error = %e, bytes = blob.len(), "Stored history is corrupt; starting empty");
          (Vec::new(), Some(PersistenceWarning {
            op: PersistenceOp::Load,
            message: format!("corrupt history: {}", e),
          }))
        }
      },
      Err(e) => {
        warn!(target: "quiz", error = %e, "Could not read stored history; starting empty");
        (Vec::new(), Some(PersistenceWarning { op: PersistenceOp::Load, message: e.to_string() }))
      }
    };

    let next_attempt = entries.len() as u32 + 1;
    info!(target: "quiz", entries = entries.len(), next_attempt, "History loaded");
    Self { storage, entries, next_attempt, last_warning }
  }

  pub fn entries(&self) -> &[QuizResult] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Attempt number the next appended result should carry.
  /// Derived from the stored count at startup, then tracked in memory only.
  pub fn next_attempt_number(&self) -> u32 {
    self.next_attempt
  }

  /// The most recent swallowed failure; cleared by the next successful write.
  pub fn last_warning(&self) -> Option<&PersistenceWarning> {
    self.last_warning.as_ref()
  }

  #[instrument(level = "debug", skip(self, result), fields(id = %result.id, attempt = result.attempt_number))]
  pub fn append(&mut self, result: QuizResult) {
    self.entries.push(result);
    self.next_attempt += 1;
    self.persist();
  }

  /// Remove the entry with `id`. Returns whether one was found.
  #[instrument(level = "debug", skip(self))]
  pub fn remove(&mut self, id: Uuid) -> bool {
    let Some(pos) = self.entries.iter().position(|r| r.id == id) else {
      return false;
    };
    self.entries.remove(pos);
    self.persist();
    true
  }

  /// Overwrite the stored blob with the full in-memory sequence.
  pub fn persist(&mut self) {
    let outcome = serde_json::to_string(&self.entries)
      .map_err(|e| e.to_string())
      .and_then(|blob| self.storage.set(HISTORY_KEY, &blob).map_err(|e| e.to_string()));

    match outcome {
      Ok(()) => self.last_warning = None,
      Err(message) => {
        warn!(target: "quiz", error = %message, entries = self.entries.len(), "History write failed; keeping in-memory copy");
        self.last_warning = Some(PersistenceWarning { op: PersistenceOp::Save, message });
      }
    }
  }
}
