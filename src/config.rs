//! Loading application configuration (trivia provider + storage) from TOML.
//!
//! See `AppConfig` for the expected schema. Every field has a default, so an
//! absent or partial file is fine. Env variables override the file.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;
use crate::trivia::QuestionQuery;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub trivia: TriviaConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

/// Trivia provider settings and the default query used when a load request omits fields.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TriviaConfig {
  pub base_url: String,
  pub amount: u32,
  pub category: u32,
  pub difficulty: Difficulty,
  /// No timeout unless set.
  pub timeout_secs: Option<u64>,
}

impl Default for TriviaConfig {
  fn default() -> Self {
    let q = QuestionQuery::default();
    Self {
      base_url: "https://opentdb.com".into(),
      amount: q.amount,
      category: q.category,
      difficulty: q.difficulty,
      timeout_secs: None,
    }
  }
}

impl TriviaConfig {
  pub fn default_query(&self) -> QuestionQuery {
    QuestionQuery { amount: self.amount, category: self.category, difficulty: self.difficulty }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  pub data_dir: PathBuf,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self { data_dir: PathBuf::from("./data") }
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from QUIZ_CONFIG_PATH, then apply env overrides.
/// On any parsing/IO error, the defaults are used.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "trivia_backend", %path, "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "trivia_backend", %path, error = %e, "Failed to parse TOML config");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "trivia_backend", %path, error = %e, "Failed to read TOML config file");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };

  if let Ok(url) = std::env::var("TRIVIA_BASE_URL") {
    cfg.trivia.base_url = url;
  }
  if let Ok(dir) = std::env::var("QUIZ_DATA_DIR") {
    cfg.storage.data_dir = PathBuf::from(dir);
  }
  cfg
}
