//! HTTP client for the Gemini generative-language REST API.
//!
//! Remote failures are classified here, once, into [`BackendError`] so the
//! generator never has to inspect error text.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BASE_URL_ENV_VAR;
use crate::error::BackendError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on catalog pages fetched during model discovery.
const MAX_CATALOG_PAGES: usize = 10;

/// Generation method a model must support to be usable.
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, joined across its parts.
    ///
    /// `None` when there is no candidate, no parts, or any part is not text.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        if parts.is_empty() {
            return None;
        }
        parts
            .iter()
            .map(|p| p.text.as_deref())
            .collect::<Option<Vec<_>>>()
            .map(|texts| texts.concat())
    }

    /// Text of the first part of the first candidate, if any.
    pub fn first_fragment(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .clone()
    }
}

/// One entry of the model catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelDescriptor {
    /// Model id usable in a generate call, or `None` if it cannot generate content.
    pub fn generation_id(&self) -> Option<&str> {
        if !self
            .supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT_METHOD)
        {
            return None;
        }
        Some(self.name.strip_prefix("models/").unwrap_or(&self.name))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Remote text-generation service.
///
/// This abstraction allows mocking the HTTP API in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run one generation call against `model`.
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BackendError>;

    /// Fetch the model catalog.
    async fn list_models(&self, api_key: &str) -> Result<Vec<ModelDescriptor>, BackendError>;
}

/// reqwest-backed implementation of [`ModelBackend`].
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client for `GITPILOT_GEMINI_BASE_URL`, or the public endpoint.
    pub fn from_env() -> Self {
        let base = std::env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BackendError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn list_models(&self, api_key: &str) -> Result<Vec<ModelDescriptor>, BackendError> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_CATALOG_PAGES {
            let mut query = vec![("pageSize", "100".to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .header("x-goog-api-key", api_key)
                .query(&query)
                .send()
                .await
                .map_err(|e| BackendError::Network(e.without_url().to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| BackendError::Network(e.without_url().to_string()))?;

            if !status.is_success() {
                return Err(classify_error(status, &body));
            }

            let page: ModelList = serde_json::from_str(&body)
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Model catalog returned {} entries", models.len());
        Ok(models)
    }
}

/// Map an HTTP error response to a [`BackendError`].
fn classify_error(status: StatusCode, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|p| p.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let api_status = parsed.as_ref().and_then(|p| p.error.status.as_deref());
    let key_invalid = parsed.as_ref().is_some_and(|p| {
        p.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    if key_invalid
        || matches!(api_status, Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED"))
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return BackendError::Unauthenticated(message);
    }

    if api_status == Some("NOT_FOUND") || status == StatusCode::NOT_FOUND {
        return BackendError::ModelNotFound(message);
    }

    // A model that exists but cannot serve generateContent is as good as absent.
    if status == StatusCode::BAD_REQUEST && message.contains("is not supported for") {
        return BackendError::ModelNotFound(message);
    }

    BackendError::Api {
        status: status.as_u16(),
        message,
    }
}
