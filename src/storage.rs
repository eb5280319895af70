//! Durable blob storage behind the topic store.
//!
//! The store keeps one opaque JSON document under a single key, read whole and
//! rewritten whole. `FileStorage` backs the server; `MemoryStorage` backs tests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;

use tracing::debug;

use crate::error::StoreError;

pub trait BlobStorage: Send + Sync {
  /// `Ok(None)` when nothing has ever been written.
  fn load(&self) -> Result<Option<String>, StoreError>;
  fn save(&self, blob: &str) -> Result<(), StoreError>;
}

/// JSON file on disk. The parent directory is created on first write.
pub struct FileStorage {
  path: PathBuf,
}

impl FileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl BlobStorage for FileStorage {
  fn load(&self) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(&self.path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn save(&self, blob: &str) -> Result<(), StoreError> {
    if let Some(dir) = self.path.parent() {
      if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
      }
    }
    // Write next to the target then rename, so a crash never leaves half a document.
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, blob)?;
    fs::rename(&tmp, &self.path)?;
    debug!(target: "topic_store", path = %self.path.display(), bytes = blob.len(), "Blob written");
    Ok(())
  }
}

/// In-memory stand-in for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
  blob: Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-populated storage, e.g. to simulate a blob left by an earlier run.
  pub fn with_blob(blob: impl Into<String>) -> Self {
    Self { blob: Mutex::new(Some(blob.into())) }
  }
}

#[cfg(test)]
impl BlobStorage for MemoryStorage {
  fn load(&self) -> Result<Option<String>, StoreError> {
    Ok(self.blob.lock().unwrap_or_else(|p| p.into_inner()).clone())
  }

  fn save(&self, blob: &str) -> Result<(), StoreError> {
    *self.blob.lock().unwrap_or_else(|p| p.into_inner()) = Some(blob.to_string());
    Ok(())
  }
}
