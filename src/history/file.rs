use super::{decode_history, encode_history, History, HistoryStore};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// History persisted as a single JSON file.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic_sync(path: PathBuf, contents: String) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self) -> History {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => {
                let history = decode_history(&blob);
                tracing::debug!(
                    "Loaded {} history entries from {}",
                    history.len(),
                    self.path.display()
                );
                history
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No history file at {}", self.path.display());
                History::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read history from {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                History::new()
            }
        }
    }

    async fn save(&self, history: &History) -> Result<()> {
        let contents = encode_history(history)?;

        tokio::task::spawn_blocking({
            let path = self.path.clone();
            move || Self::write_atomic_sync(path, contents)
        })
        .await
        .map_err(|e| Error::Invariant(format!("History write task join error: {}", e)))??;

        tracing::debug!(
            "Saved {} history entries to {}",
            history.len(),
            self.path.display()
        );
        Ok(())
    }
}
