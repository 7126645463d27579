use super::types::ErrorEnvelope;
use crate::models::DEFAULT_GEMINI_BASE_URL;
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Lightweight Gemini REST client for `generateContent`.
///
/// The API key is optional at construction and checked on every call, so a
/// missing credential surfaces as [`Error::MissingCredential`] without any
/// request leaving the process.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    api_key: Option<String>,
    model: String,
    pub(crate) base_url: String,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash-image`);
    /// a `models/` prefix is stripped.
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::new_with_client(api_key, model, Client::new())
    }

    pub fn new_with_client(api_key: Option<String>, model: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingCredential)
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> Result<Resp> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                Error::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(classify_api_error(status, &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Transport(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls Gemini's `generateContent` endpoint.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        self.post_to_url(url, request).await
    }
}

/// Map a non-success response to either a quota error or a transport error.
pub(crate) fn classify_api_error(status: StatusCode, body: &str) -> Error {
    let (code, status_name, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = if envelope.error.message.is_empty() {
                format!("Gemini API error (status {})", status)
            } else {
                envelope.error.message
            };
            (envelope.error.code, envelope.error.status, message)
        }
        Err(_) if body.trim().is_empty() => {
            (None, None, format!("Gemini API error (status {})", status))
        }
        Err(_) => (None, None, body.trim().to_string()),
    };

    if is_quota_signal(status, code, status_name.as_deref(), &message) {
        Error::QuotaExceeded(message)
    } else {
        Error::Transport(message)
    }
}

// The envelope code can disagree with the HTTP status behind some proxies.
fn is_quota_signal(
    status: StatusCode,
    code: Option<u16>,
    status_name: Option<&str>,
    message: &str,
) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS
        || code == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    {
        return true;
    }
    if status_name.is_some_and(|s| s.eq_ignore_ascii_case("RESOURCE_EXHAUSTED")) {
        return true;
    }
    let message = message.to_ascii_lowercase();
    message.contains("resource_exhausted") || message.contains("quota")
}
