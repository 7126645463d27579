//! Generation history and its persistence
//!
//! The history is an ordered list of generated images, newest first. It is
//! persisted as a whole through a [`HistoryStore`] after every mutation and
//! loaded once at startup.

pub mod file;
pub mod memory;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Storage port for the serialized history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Read the persisted history. Missing or unreadable data yields an
    /// empty history; this never fails.
    async fn load(&self) -> History;

    /// Replace the persisted history with `history`.
    async fn save(&self, history: &History) -> Result<()>;
}

/// Newest-first list of generated images with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GeneratedImage>", into = "Vec<GeneratedImage>")]
pub struct History {
    images: Vec<GeneratedImage>,
}

impl History {
    pub fn new() -> Self {
        Self { images: Vec::new() }
    }

    /// An empty history. Callers must confirm with the user before
    /// replacing a non-empty history with this.
    pub fn clear() -> Self {
        Self::new()
    }

    /// Insert `image` at the head. An older record with the same id is dropped.
    pub fn append(mut self, image: GeneratedImage) -> Self {
        self.images.retain(|existing| existing.id != image.id);
        self.images.insert(0, image);
        self
    }

    /// Remove the record with `id`, keeping the order of the rest.
    pub fn remove_by_id(mut self, id: Uuid) -> Self {
        self.images.retain(|image| image.id != id);
        self
    }

    pub fn get(&self, id: Uuid) -> Option<&GeneratedImage> {
        self.images.iter().find(|image| image.id == id)
    }

    /// Look up a record by full id or by an unambiguous id prefix.
    pub fn find(&self, needle: &str) -> Option<&GeneratedImage> {
        let needle = needle.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Ok(id) = Uuid::parse_str(&needle) {
            return self.get(id);
        }

        let mut matches = self
            .images
            .iter()
            .filter(|image| image.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(image), None) => Some(image),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedImage> {
        self.images.iter()
    }

    pub fn as_slice(&self) -> &[GeneratedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<i64> {
        self.images.first().map(|image| image.timestamp)
    }
}

impl From<Vec<GeneratedImage>> for History {
    fn from(images: Vec<GeneratedImage>) -> Self {
        let mut seen = HashSet::new();
        let images = images
            .into_iter()
            .filter(|image| seen.insert(image.id))
            .collect();
        Self { images }
    }
}

impl From<History> for Vec<GeneratedImage> {
    fn from(history: History) -> Self {
        history.images
    }
}

/// Decode a persisted blob, degrading to an empty history on any error.
pub fn decode_history(blob: &str) -> History {
    if blob.trim().is_empty() {
        return History::new();
    }

    match serde_json::from_str::<History>(blob) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!("Failed to load history, starting empty: {}", e);
            History::new()
        }
    }
}

pub fn encode_history(history: &History) -> Result<String> {
    Ok(serde_json::to_string(history)?)
}
