//! AI service integration for image generation
//!
//! Wraps Gemini's `generateContent` image output behind a small service
//! trait so the application shell can run against a mock in tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiImageClient;
pub use mock::MockImageGenerationClient;

use crate::models::AspectRatio;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate one image and return it as a `data:` URI.
    ///
    /// Makes a single attempt; retrying is left to the caller.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String>;
}
