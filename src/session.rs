//! Submission state machine
//!
//! Tracks the prompt being edited, the selected aspect ratio and whether a
//! generation is in flight. Only one request may be outstanding at a time:
//! [`Session::begin`] refuses to start while the state is `Generating`.

use crate::models::{AspectRatio, GeneratedImage, GenerationSettings};
use crate::{Error, Result};

/// What gets sent to the generation service for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Trimmed prompt text.
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Generating(GenerationRequest),
    Error(String),
}

/// Result of resolving an in-flight request.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Generated(GeneratedImage),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct Session {
    prompt: String,
    settings: GenerationSettings,
    state: SubmissionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Replace the prompt input. Ignored while a request is in flight.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> bool {
        if self.is_generating() {
            return false;
        }
        self.prompt = prompt.into();
        true
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    /// Change the aspect ratio for the next submission. Ignored while a
    /// request is in flight.
    pub fn select_aspect_ratio(&mut self, aspect_ratio: AspectRatio) -> bool {
        if self.is_generating() {
            return false;
        }
        self.settings.aspect_ratio = aspect_ratio;
        true
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.state, SubmissionState::Generating(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.prompt.trim().is_empty()
    }

    /// Move to `Generating` and hand back the request to issue.
    ///
    /// Returns `None` without changing state when the prompt is blank or a
    /// request is already in flight. A previous error is cleared.
    pub fn begin(&mut self) -> Option<GenerationRequest> {
        if !self.can_submit() {
            return None;
        }

        let request = GenerationRequest {
            prompt: self.prompt.trim().to_string(),
            aspect_ratio: self.settings.aspect_ratio,
        };
        self.state = SubmissionState::Generating(request.clone());
        Some(request)
    }

    /// Resolve the in-flight request.
    ///
    /// On success the prompt input is cleared and the new record returned;
    /// on failure the prompt is kept for a retry and the message is stored.
    pub fn finish(&mut self, outcome: Result<String>, timestamp: i64) -> Result<Completion> {
        let request = match std::mem::take(&mut self.state) {
            SubmissionState::Generating(request) => request,
            other => {
                self.state = other;
                return Err(Error::Invariant(
                    "finish called without a request in flight".to_string(),
                ));
            }
        };

        match outcome {
            Ok(url) => {
                self.prompt.clear();
                Ok(Completion::Generated(GeneratedImage::new(
                    url,
                    &request.prompt,
                    request.aspect_ratio,
                    timestamp,
                )))
            }
            Err(e) => {
                let message = e.to_string();
                self.state = SubmissionState::Error(message.clone());
                Ok(Completion::Failed(message))
            }
        }
    }
}
