use super::mime::to_data_uri;
use super::ImageGenerationService;
use crate::models::AspectRatio;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// 1x1 PNG
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xC8,
    0xF6, 0x7D, 0x00, 0x00, 0x02, 0xBF, 0x01, 0x99, 0xC2, 0x40, 0xAB, 0x94, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Scripted image generator. Queued outcomes are consumed in order; once
/// the queue is empty every call returns a tiny PNG data URI.
#[derive(Clone)]
pub struct MockImageGenerationClient {
    outcomes: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<(String, AspectRatio)>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, data_uri: String) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(data_uri));
        self
    }

    pub fn with_error(self, error: Error) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<(String, AspectRatio)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn default_data_uri() -> String {
        to_data_uri("image/png", TINY_PNG)
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), aspect_ratio));

        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Self::default_data_uri()))
    }
}
