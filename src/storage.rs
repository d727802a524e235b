//! Durable key-value slots.
//!
//! Each key holds one UTF-8 blob. `FileStore` keeps one JSON file per key and
//! replaces it atomically (temp file + rename). `MemoryStore` backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("invalid storage key: {0:?}")]
  InvalidKey(String),

  #[error("IO error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("storage backend rejected write: {0}")]
  Rejected(String),
}

pub trait KeyValueStore: Send + Sync {
  /// `Ok(None)` when nothing has been stored under `key` yet.
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
  /// Overwrite the slot.
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

fn check_key(key: &str) -> Result<(), StorageError> {
  let ok = !key.is_empty()
    && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if ok { Ok(()) } else { Err(StorageError::InvalidKey(key.to_string())) }
}

/// One `<key>.json` file per slot under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
    check_key(key)?;
    Ok(self.dir.join(format!("{}.json", key)))
  }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
  move |source| StorageError::Io { path: path.to_path_buf(), source }
}

fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
  let tmp = path.with_extension("tmp");
  fs::write(&tmp, content).map_err(io_err(&tmp))?;
  fs::rename(&tmp, path).map_err(io_err(path))?;
  Ok(())
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key)?;
    match fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(StorageError::Io { path, source: e }),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let path = self.path_for(key)?;
    fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
    atomic_write(&path, value)?;
    debug!(target: "quiz", path = %path.display(), bytes = value.len(), "Slot written");
    Ok(())
  }
}

/// In-process slots. Writes can be made to fail to exercise recovery paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
  slots: Mutex<HashMap<String, String>>,
  fail_writes: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-populate a slot, bypassing `fail_writes`.
  pub fn with_slot(key: &str, value: &str) -> Self {
    let store = Self::default();
    store.slots_mut().insert(key.to_string(), value.to_string());
    store
  }

  pub fn set_fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  fn slots_mut(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    // A poisoned map is still a valid map.
    self.slots.lock().unwrap_or_else(|p| p.into_inner())
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    check_key(key)?;
    Ok(self.slots_mut().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    check_key(key)?;
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StorageError::Rejected(format!("writes disabled for {}", key)));
    }
    self.slots_mut().insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("trivia-storage-{}", Uuid::new_v4()))
  }

  #[test]
  fn file_store_missing_slot_is_none() {
    let store = FileStore::new(scratch_dir());
    assert!(store.get("quizHistory").unwrap().is_none());
  }

  #[test]
  fn file_store_overwrites_slot() {
    let dir = scratch_dir();
    let store = FileStore::new(&dir);
    store.set("quizHistory", "[1]").unwrap();
    store.set("quizHistory", "[1,2]").unwrap();
    assert_eq!(store.get("quizHistory").unwrap().as_deref(), Some("[1,2]"));
    assert!(!dir.join("quizHistory.tmp").exists());
    let _ = fs::remove_dir_all(dir);
  }

  #[test]
  fn keys_with_path_separators_are_rejected() {
    let store = FileStore::new(scratch_dir());
    assert!(matches!(store.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(MemoryStore::new().get(""), Err(StorageError::InvalidKey(_))));
  }

  #[test]
  fn memory_store_can_reject_writes() {
    let store = MemoryStore::with_slot("k", "v");
    store.set_fail_writes(true);
    assert!(matches!(store.set("k", "w"), Err(StorageError::Rejected(_))));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
  }
}
