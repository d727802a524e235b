//! Application state: the quiz manager behind a lock, the trivia client, and the default query.
//!
//! Session transitions are synchronous and short, so they run under the write
//! lock. The question fetch is the only await point and runs outside it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::manager::QuizManager;
use crate::storage::{FileStore, KeyValueStore};
use crate::trivia::{QuestionQuery, TriviaClient, TriviaError};

#[derive(Clone)]
pub struct AppState {
  pub manager: Arc<RwLock<QuizManager>>,
  pub trivia: TriviaClient,
  pub default_query: QuestionQuery,
}

impl AppState {
  /// Build state from config, with history kept in files under `storage.data_dir`.
  #[instrument(level = "info", skip_all)]
  pub fn new(cfg: &AppConfig) -> Result<Self, TriviaError> {
    let store = FileStore::new(&cfg.storage.data_dir);
    info!(target: "trivia_backend", data_dir = %store.dir().display(), base_url = %cfg.trivia.base_url, "Using file-backed history");
    Self::with_storage(cfg, Arc::new(store))
  }

  pub fn with_storage(cfg: &AppConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, TriviaError> {
    let history = HistoryStore::load(storage);
    Ok(Self {
      manager: Arc::new(RwLock::new(QuizManager::new(history))),
      trivia: TriviaClient::new(&cfg.trivia)?,
      default_query: cfg.trivia.default_query(),
    })
  }

  /// Fetch questions and start a new run with them.
  /// Callers should not overlap two loads; nothing here prevents it.
  #[instrument(level = "info", skip(self))]
  pub async fn load_questions(&self, query: QuestionQuery) -> Result<(), TriviaError> {
    self.manager.write().await.begin_loading();
    let outcome = self.trivia.fetch_questions(&query).await;
    self.manager.write().await.finish_loading(outcome)
  }
}
