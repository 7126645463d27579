use super::{decode_history, encode_history, History, HistoryStore};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory history store holding the same serialized blob a file would.
#[derive(Clone)]
pub struct MemoryHistoryStore {
    blob: Arc<Mutex<Option<String>>>,
    save_count: Arc<Mutex<usize>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            blob: Arc::new(Mutex::new(None)),
            save_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Seed the store with a raw blob, valid or not.
    pub fn with_blob(self, blob: String) -> Self {
        *self.blob.lock().unwrap() = Some(blob);
        self
    }

    pub fn get_blob(&self) -> Option<String> {
        self.blob.lock().unwrap().clone()
    }

    pub fn get_save_count(&self) -> usize {
        *self.save_count.lock().unwrap()
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self) -> History {
        match self.blob.lock().unwrap().as_deref() {
            Some(blob) => decode_history(blob),
            None => History::new(),
        }
    }

    async fn save(&self, history: &History) -> Result<()> {
        let blob = encode_history(history)?;
        *self.blob.lock().unwrap() = Some(blob);
        *self.save_count.lock().unwrap() += 1;
        Ok(())
    }
}
