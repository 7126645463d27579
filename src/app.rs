//! Application shell tying the generator, the history and the session together.

use crate::ai::{GeminiImageClient, ImageGenerationService};
use crate::confirm::ConfirmationGate;
use crate::export::export_image;
use crate::history::{FileHistoryStore, History, HistoryStore};
use crate::models::{Config, GeneratedImage};
use crate::session::{Completion, Session};
use crate::{Error, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const CLEAR_HISTORY_QUESTION: &str = "Are you sure you want to clear your history?";

/// Owns the history and is the only place it is mutated.
pub struct App {
    image_gen: Box<dyn ImageGenerationService>,
    store: Box<dyn HistoryStore>,
    history: History,
    session: Session,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub image_gen: Box<dyn ImageGenerationService>,
    pub store: Box<dyn HistoryStore>,
}

/// What a call to [`App::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank prompt or a request already in flight; nothing was sent.
    Ignored,
    Generated(GeneratedImage),
    Failed(String),
}

impl App {
    /// Build an app from concrete services, loading the persisted history.
    pub async fn with_services(services: AppServices) -> Self {
        let history = services.store.load().await;
        info!("Loaded {} images from history", history.len());

        Self {
            image_gen: services.image_gen,
            store: services.store,
            history,
            session: Session::new(),
        }
    }

    /// Construct an app from environment configuration.
    pub async fn new(config: &Config) -> Self {
        if config.gemini_api_key.is_none() {
            warn!("No API key configured; generation will fail until GEMINI_API_KEY is set");
        }

        let image_gen = GeminiImageClient::new(
            config.gemini_api_key.clone(),
            config.image_model.clone(),
        )
        .with_base_url(config.gemini_base_url.clone());
        info!("Image provider: Gemini (model: {})", image_gen.model());

        let store = FileHistoryStore::new(&config.history_path);
        info!("History file: {}", store.path().display());

        Self::with_services(AppServices {
            image_gen: Box::new(image_gen),
            store: Box::new(store),
        })
        .await
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    async fn replace_history(&mut self, history: History) -> Result<()> {
        self.history = history;
        self.store.save(&self.history).await.map_err(|e| {
            error!("Failed to save history: {}", e);
            e
        })
    }

    /// Submit the session's current prompt.
    ///
    /// Generation failures are reported as [`SubmitOutcome::Failed`]; an
    /// `Err` means the new history could not be persisted.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let Some(request) = self.session.begin() else {
            return Ok(SubmitOutcome::Ignored);
        };

        info!(
            "Generating {} image for prompt ({} chars)",
            request.aspect_ratio,
            request.prompt.len()
        );
        let outcome = self
            .image_gen
            .generate_image(&request.prompt, request.aspect_ratio)
            .await;

        let now = Utc::now().timestamp_millis();
        let timestamp = self
            .history
            .latest_timestamp()
            .map_or(now, |latest| now.max(latest));

        match self.session.finish(outcome, timestamp)? {
            Completion::Generated(image) => {
                info!("Generated image {}", image.id);
                let history = std::mem::take(&mut self.history).append(image.clone());
                self.replace_history(history).await?;
                Ok(SubmitOutcome::Generated(image))
            }
            Completion::Failed(message) => {
                error!("Image generation failed: {}", message);
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// Set the prompt and submit it in one step.
    pub async fn generate(&mut self, prompt: &str) -> Result<SubmitOutcome> {
        if !self.session.set_prompt(prompt) {
            return Ok(SubmitOutcome::Ignored);
        }
        self.submit().await
    }

    /// Delete the record with the given id (or unique id prefix).
    ///
    /// Returns the removed record, or `None` if nothing matched.
    pub async fn delete(&mut self, id: &str) -> Result<Option<GeneratedImage>> {
        let Some(image) = self.history.find(id).cloned() else {
            return Ok(None);
        };

        let history = std::mem::take(&mut self.history).remove_by_id(image.id);
        self.replace_history(history).await?;
        info!("Deleted image {}", image.id);
        Ok(Some(image))
    }

    /// Empty the history after `gate` confirms. Returns whether it was cleared.
    pub async fn clear_history(&mut self, gate: &dyn ConfirmationGate) -> Result<bool> {
        if self.history.is_empty() {
            return Ok(false);
        }
        if !gate.confirm(CLEAR_HISTORY_QUESTION) {
            info!("Clear history cancelled");
            return Ok(false);
        }

        let removed = self.history.len();
        self.replace_history(History::clear()).await?;
        info!("Cleared {} images from history", removed);
        Ok(true)
    }

    /// Save the record with the given id (or unique id prefix) into `dir`.
    pub async fn download(&self, id: &str, dir: &Path) -> Result<PathBuf> {
        let image = self
            .history
            .find(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        export_image(image, dir).await
    }
}
