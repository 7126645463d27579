//! Data models and structures
//!
//! Defines generated image records, the supported aspect ratios, the
//! per-session generation settings and environment configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const HISTORY_FILE_NAME: &str = "lumina_history.json";

/// Closed set of aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Story,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Story,
        AspectRatio::Wide,
    ];

    /// Value sent verbatim to the generation service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::Story => "9:16",
            Self::Wide => "16:9",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
            Self::Story => "Story",
            Self::Wide => "Wide",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    /// Accepts either the ratio value (`16:9`) or its label (`wide`).
    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == input || r.label().eq_ignore_ascii_case(input))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
                format!(
                    "Unknown aspect ratio '{}'. Expected one of: {}",
                    input,
                    known.join(", ")
                )
            })
    }
}

/// One entry of the generation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: Uuid,
    pub url: String,
    pub prompt: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub aspect_ratio: AspectRatio,
}

impl GeneratedImage {
    pub fn new(url: String, prompt: &str, aspect_ratio: AspectRatio, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            prompt: prompt.trim().to_string(),
            timestamp,
            aspect_ratio,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Current selection for the next generation. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSettings {
    pub aspect_ratio: AspectRatio,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Checked at generation time so the app can start without it.
    pub gemini_api_key: Option<String>,
    pub image_model: String,
    pub gemini_base_url: String,
    pub history_path: PathBuf,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            gemini_api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")),
            image_model: non_empty("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            history_path: non_empty("LUMINA_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_history_path),
        }
    }
}

pub fn default_history_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("lumina").join(HISTORY_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME))
}
