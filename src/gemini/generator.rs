//! Commit message generation with multi-model fallback.
//!
//! Candidates are tried in priority order, each bounded by its own timeout.
//! When the whole list fails, the service's model catalog is consulted and
//! every newly discovered model gets the same treatment.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config;
use crate::error::{BackendError, CredentialSource, GenerationError};
use crate::gemini::client::{GeminiClient, GenerateContentRequest, GenerateContentResponse, ModelBackend};
use crate::gemini::credential::{Credential, resolve_credential};
use crate::gemini::prompt::{build_prompt, build_request, truncate_diff};

/// Built-in candidates, fast and cheap variants first.
pub const CANDIDATE_MODELS: [&str; 6] = [
    "gemini-2.0-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.5-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-2.5-pro",
];

const NORMAL_FINISH: [&str; 2] = ["STOP", "MAX_TOKENS"];
const SAFETY_FINISH: [&str; 4] = ["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];
const RECITATION_FINISH: &str = "RECITATION";

/// Knobs for a generator, usually read from the environment.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub candidates: Vec<String>,
    pub attempt_timeout: Duration,
    pub discover_models: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_MODELS.iter().map(|m| m.to_string()).collect(),
            attempt_timeout: Duration::from_secs(config::DEFAULT_AI_TIMEOUT_SECS),
            discover_models: true,
        }
    }
}

impl GenerationSettings {
    /// Settings from `GITPILOT_AI_TIMEOUT` and `GITPILOT_GEMINI_MODEL`.
    pub fn from_env() -> Self {
        Self {
            candidates: candidate_models(config::preferred_model()),
            attempt_timeout: config::ai_timeout(),
            discover_models: true,
        }
    }
}

/// Built-in candidates with `preferred` moved to the front.
pub fn candidate_models(preferred: Option<String>) -> Vec<String> {
    let mut models: Vec<String> = CANDIDATE_MODELS.iter().map(|m| m.to_string()).collect();
    if let Some(preferred) = preferred {
        models.retain(|m| *m != preferred);
        models.insert(0, preferred);
    }
    models
}

/// Everything needed for one generation attempt sequence.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub diff_text: String,
    pub truncated: bool,
    pub candidates: Vec<String>,
    pub attempt_timeout: Duration,
    pub body: GenerateContentRequest,
}

impl GenerationRequest {
    pub fn new(diff: &str, settings: &GenerationSettings) -> Self {
        let (diff_text, truncated) = truncate_diff(diff);
        let body = build_request(build_prompt(&diff_text));
        Self {
            diff_text,
            truncated,
            candidates: settings.candidates.clone(),
            attempt_timeout: settings.attempt_timeout,
            body,
        }
    }
}

/// Why a single model attempt produced no response.
#[derive(Debug)]
enum AttemptFailure {
    Backend(BackendError),
    TimedOut { model: String, secs: u64 },
    Cancelled,
}

/// Generates commit messages from staged diffs.
pub struct MessageGenerator<B: ModelBackend> {
    backend: B,
    credential: Option<Credential>,
    settings: GenerationSettings,
}

impl MessageGenerator<GeminiClient> {
    /// Generator for the live API, configured from the environment.
    pub fn from_env() -> Self {
        Self::new(
            GeminiClient::from_env(),
            resolve_credential(),
            GenerationSettings::from_env(),
        )
    }
}

impl<B: ModelBackend> MessageGenerator<B> {
    pub fn new(backend: B, credential: Option<Credential>, settings: GenerationSettings) -> Self {
        Self {
            backend,
            credential,
            settings,
        }
    }

    /// Produce a single-line commit message for `diff`.
    pub async fn generate(
        &self,
        diff: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(GenerationError::MissingCredential)?;

        if credential.is_shared() {
            warn!("Using the shared, rate-limited API key; set GEMINI_API_KEY to use your own");
        }

        let request = GenerationRequest::new(diff, &self.settings);
        if request.truncated {
            info!(
                "Diff truncated from {} to {} chars",
                diff.chars().count(),
                request.diff_text.chars().count()
            );
        }
        let mut tried: Vec<String> = Vec::new();
        let mut last_failure: Option<AttemptFailure> = None;

        for model in &request.candidates {
            match self.attempt(credential, model, &request, cancel).await {
                Ok(response) => return interpret_response(model, &response),
                Err(AttemptFailure::Cancelled) => return Err(GenerationError::Cancelled),
                Err(failure) => {
                    tried.push(model.clone());
                    last_failure = Some(failure);
                }
            }
        }

        if self.settings.discover_models {
            match self.discover(credential, &request, cancel).await {
                Ok(discovered) => {
                    let fresh: Vec<String> = discovered
                        .into_iter()
                        .filter(|m| !tried.contains(m))
                        .collect();
                    info!("Discovered {} untried models", fresh.len());

                    for model in &fresh {
                        match self.attempt(credential, model, &request, cancel).await {
                            Ok(response) => return interpret_response(model, &response),
                            Err(AttemptFailure::Cancelled) => {
                                return Err(GenerationError::Cancelled);
                            }
                            Err(failure) => {
                                tried.push(model.clone());
                                last_failure = Some(failure);
                            }
                        }
                    }
                }
                Err(AttemptFailure::Cancelled) => return Err(GenerationError::Cancelled),
                Err(failure) => {
                    warn!("Model discovery failed: {}", describe(&failure));
                    if matches!(
                        failure,
                        AttemptFailure::Backend(BackendError::Unauthenticated(_))
                    ) {
                        last_failure = Some(failure);
                    }
                }
            }
        }

        Err(classify_exhaustion(last_failure, tried, credential.source()))
    }

    /// One bounded call against `model`.
    async fn attempt(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerateContentResponse, AttemptFailure> {
        info!(
            model,
            prompt_len = request.diff_text.len(),
            credential = credential.source().as_str(),
            "Requesting commit message"
        );

        let call = self
            .backend
            .generate_content(credential.key(), model, &request.body);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AttemptFailure::Cancelled),
            outcome = tokio::time::timeout(request.attempt_timeout, call) => outcome,
        };

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(BackendError::ModelNotFound(detail))) => {
                debug!("Model {} unavailable: {}", model, detail);
                Err(AttemptFailure::Backend(BackendError::ModelNotFound(detail)))
            }
            Ok(Err(err)) => {
                warn!("Model {} failed: {}", model, err);
                Err(AttemptFailure::Backend(err))
            }
            Err(_) => {
                let secs = request.attempt_timeout.as_secs();
                warn!("Model {} timed out after {}s", model, secs);
                Err(AttemptFailure::TimedOut {
                    model: model.to_string(),
                    secs,
                })
            }
        }
    }

    /// Model ids from the catalog that can generate content.
    async fn discover(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, AttemptFailure> {
        let call = self.backend.list_models(credential.key());
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AttemptFailure::Cancelled),
            outcome = tokio::time::timeout(request.attempt_timeout, call) => outcome,
        };

        match outcome {
            Ok(Ok(models)) => Ok(models
                .iter()
                .filter_map(|m| m.generation_id().map(String::from))
                .collect()),
            Ok(Err(err)) => Err(AttemptFailure::Backend(err)),
            Err(_) => Err(AttemptFailure::TimedOut {
                model: "model catalog".to_string(),
                secs: request.attempt_timeout.as_secs(),
            }),
        }
    }
}

fn describe(failure: &AttemptFailure) -> String {
    match failure {
        AttemptFailure::Backend(err) => err.to_string(),
        AttemptFailure::TimedOut { model, secs } => format!("{model} timed out after {secs}s"),
        AttemptFailure::Cancelled => "cancelled".to_string(),
    }
}

/// Turn the last failure seen into the run's outcome.
fn classify_exhaustion(
    last_failure: Option<AttemptFailure>,
    tried: Vec<String>,
    origin: CredentialSource,
) -> GenerationError {
    match last_failure {
        Some(AttemptFailure::Backend(BackendError::Unauthenticated(detail))) => {
            GenerationError::CredentialRejected { origin, detail }
        }
        Some(AttemptFailure::TimedOut { model, secs }) => GenerationError::Timeout { model, secs },
        Some(AttemptFailure::Cancelled) => GenerationError::Cancelled,
        other => GenerationError::AllCandidatesExhausted {
            tried,
            last_error: other
                .as_ref()
                .map(describe)
                .unwrap_or_else(|| "no models available".to_string()),
        },
    }
}

/// Check the finish condition, then extract and sanitize the text.
fn interpret_response(
    model: &str,
    response: &GenerateContentResponse,
) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.first() else {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GenerationError::SafetyBlocked { reason });
        }
        return Err(GenerationError::MalformedResponse {
            model: model.to_string(),
            detail: "response contained no candidates".to_string(),
        });
    };

    match candidate.finish_reason.as_deref() {
        Some(reason) if NORMAL_FINISH.contains(&reason) => {}
        Some(reason) if SAFETY_FINISH.contains(&reason) => {
            return Err(GenerationError::SafetyBlocked {
                reason: reason.to_string(),
            });
        }
        Some(RECITATION_FINISH) => return Err(GenerationError::RecitationBlocked),
        other => {
            return Err(GenerationError::MalformedResponse {
                model: model.to_string(),
                detail: format!("unexpected finish reason: {}", other.unwrap_or("none")),
            });
        }
    }

    let text = response
        .text()
        .or_else(|| response.first_fragment())
        .ok_or_else(|| GenerationError::MalformedResponse {
            model: model.to_string(),
            detail: "response contained no text".to_string(),
        })?;

    let message = sanitize_message(&text).ok_or_else(|| GenerationError::MalformedResponse {
        model: model.to_string(),
        detail: "response text was empty".to_string(),
    })?;

    info!(model, "Generated commit message: {}", message);
    Ok(message)
}

/// First line of `raw`, with one enclosing pair of matching quotes removed.
///
/// Returns `None` if nothing is left.
pub fn sanitize_message(raw: &str) -> Option<String> {
    let first = raw.trim().lines().next()?.trim();

    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            first
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(first)
        .trim();

    (!unquoted.is_empty()).then(|| unquoted.to_string())
}
