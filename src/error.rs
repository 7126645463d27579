//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("API key is missing. Set GEMINI_API_KEY (or API_KEY) in the environment or .env file.")]
    MissingCredential,

    #[error("Image generation failed: {0}")]
    Transport(String),

    #[error("No image was generated. Please try a different prompt.")]
    EmptyResult,

    #[error("Generated content did not contain an image.")]
    NoImageData,

    #[error("Quota exhausted or the API key does not have access to this model tier: {0}")]
    QuotaExceeded(String),

    #[error("Failed to decode image payload: {0}")]
    Decode(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("No image with id {0} in history")]
    NotFound(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
