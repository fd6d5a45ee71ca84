//! The edit backend seam.
//!
//! Everything upstream of the dispatcher talks to one narrow contract:
//! give a model a piece of text, an instruction, and a temperature, get
//! edited text back. [`EditBackend`] is that contract; [`HttpBackend`]
//! is the production implementation speaking JSON over HTTP.
//!
//! Keeping the seam this small is what makes the dispatcher testable:
//! tests script a backend in a few lines and exercise every fallback
//! path without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One edit request, addressed to a specific model.
#[derive(Debug, Clone, Serialize)]
pub struct EditRequest {
    /// Backend model identifier.
    pub model: String,
    /// What to do to the text.
    pub instruction: String,
    /// The text to edit.
    pub text: String,
    /// Sampling temperature for this call.
    pub temperature: f32,
}

/// A text-editing backend.
///
/// Implementations perform one edit call and surface any failure as
/// [`Error::ModelCall`]. Content validation (rejecting empty output)
/// lives in the dispatcher so every implementation gets it for free.
#[async_trait]
pub trait EditBackend: Send + Sync {
    /// Edit `req.text` according to `req.instruction` using `req.model`.
    ///
    /// # Errors
    ///
    /// [`Error::ModelCall`] on transport failure, a non-success status,
    /// or a backend-reported error.
    async fn edit(&self, req: &EditRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct EditCallResponse {
    #[serde(rename = "editedText")]
    edited_text: Option<String>,
    error: Option<String>,
}

/// HTTP implementation of [`EditBackend`].
///
/// Speaks the edit-service wire contract: `POST {endpoint}` with
/// `{ "model", "instruction", "text", "temperature" }`, answered by
/// `{ "editedText": ... }` on success or `{ "error": ... }` on failure.
/// Per-call timeouts live here, on the `reqwest` client — the
/// dispatcher's retry logic deliberately has none of its own.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Create a backend for the given endpoint with a per-call timeout.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed
    /// (matching `reqwest::Client::new`).
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("HTTP client construction");
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Attach a bearer token sent with every call.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn call_error(&self, req: &EditRequest, reason: impl Into<String>) -> Error {
        Error::ModelCall {
            model: req.model.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl EditBackend for HttpBackend {
    async fn edit(&self, req: &EditRequest) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(req);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.call_error(req, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.call_error(req, format!("backend returned status {status}")));
        }

        let body: EditCallResponse = response
            .json()
            .await
            .map_err(|e| self.call_error(req, format!("malformed response: {e}")))?;

        if let Some(error) = body.error {
            return Err(self.call_error(req, error));
        }
        body.edited_text
            .ok_or_else(|| self.call_error(req, "response carried neither editedText nor error"))
    }
}
