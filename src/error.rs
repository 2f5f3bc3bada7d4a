//! Error types for gitpilot modules using thiserror.

use std::fmt;

use thiserror::Error;

/// Setup instructions shown whenever no usable API key is available.
pub const CREDENTIAL_HELP: &str = "To set it up, use one of these methods:\n\n\
     Option 1: Export it in your terminal:\n   \
     export GEMINI_API_KEY='your-api-key-here'\n\n\
     Option 2: Create a .env file in your project directory:\n   \
     echo 'GEMINI_API_KEY=your-api-key-here' > .env\n\n\
     Option 3: Add it to ~/.bashrc or ~/.zshrc for persistence:\n   \
     echo 'export GEMINI_API_KEY=\"your-api-key-here\"' >> ~/.bashrc\n\n\
     Get your API key from: https://aistudio.google.com/app/apikey";

/// Errors from git subprocess execution.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git command failed: {command}\n{output}")]
    CommandFailed { command: String, output: String },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git executable not found in PATH")]
    NotInstalled,
}

/// Errors from the generative-language HTTP boundary, classified once at the source.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Model not found or unsupported: {0}")]
    ModelNotFound(String),

    #[error("API key rejected: {0}")]
    Unauthenticated(String),

    #[error("API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

/// Where the API key in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// The operator's own key (`GEMINI_API_KEY`).
    Operator,
    /// The bundled, rate-limited shared key.
    Shared,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Operator => "operator",
            CredentialSource::Shared => "shared",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a failed generation, used by callers that only need the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingCredential,
    Timeout,
    AllCandidatesExhausted,
    SafetyBlocked,
    RecitationBlocked,
    MalformedResponse,
    Cancelled,
}

/// Errors from commit message generation.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY not found\n\n{}", CREDENTIAL_HELP)]
    MissingCredential,

    #[error(
        "API Key Error: the {origin} API key is invalid or expired ({detail})\n\n{}",
        CREDENTIAL_HELP
    )]
    CredentialRejected {
        origin: CredentialSource,
        detail: String,
    },

    #[error("Every model attempt timed out (last: {model} after {secs}s)")]
    Timeout { model: String, secs: u64 },

    #[error(
        "Could not find an available Gemini model.\n\nTried models: {}\nLast error: {last_error}",
        .tried.join(", ")
    )]
    AllCandidatesExhausted {
        tried: Vec<String>,
        last_error: String,
    },

    #[error("Response blocked by the safety filter ({reason})")]
    SafetyBlocked { reason: String },

    #[error("Response blocked for recitation of copyrighted material")]
    RecitationBlocked,

    #[error("Malformed response from {model}: {detail}")]
    MalformedResponse { model: String, detail: String },

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::MissingCredential | GenerationError::CredentialRejected { .. } => {
                FailureKind::MissingCredential
            }
            GenerationError::Timeout { .. } => FailureKind::Timeout,
            GenerationError::AllCandidatesExhausted { .. } => FailureKind::AllCandidatesExhausted,
            GenerationError::SafetyBlocked { .. } => FailureKind::SafetyBlocked,
            GenerationError::RecitationBlocked => FailureKind::RecitationBlocked,
            GenerationError::MalformedResponse { .. } => FailureKind::MalformedResponse,
            GenerationError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// One-line description suitable for a step summary.
    pub fn summary(&self) -> String {
        match self {
            GenerationError::MissingCredential => "No API key configured".to_string(),
            GenerationError::CredentialRejected { origin, .. } => {
                format!("The {origin} API key was rejected")
            }
            GenerationError::Timeout { secs, .. } => format!("Timed out after {secs}s"),
            GenerationError::AllCandidatesExhausted { tried, .. } => {
                format!("No model responded ({} tried)", tried.len())
            }
            GenerationError::SafetyBlocked { reason } => format!("Blocked by safety filter ({reason})"),
            GenerationError::RecitationBlocked => "Blocked for recitation".to_string(),
            GenerationError::MalformedResponse { model, .. } => {
                format!("Malformed response from {model}")
            }
            GenerationError::Cancelled => "Cancelled".to_string(),
        }
    }
}

/// Errors from the external editor integration.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Editor '{0}' not found in PATH")]
    NotFound(String),

    #[error("Failed to prepare temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to launch editor '{editor}': {source}")]
    Launch {
        editor: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Editor '{editor}' exited with {}", .code.map_or("a signal".to_string(), |c| format!("code {c}")))]
    NonZeroExit { editor: String, code: Option<i32> },
}

/// Errors from the interaction boundary.
#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("Interrupted by user")]
    Interrupted,

    #[error("Terminal I/O failed: {0}")]
    Io(#[source] std::io::Error),
}

/// Fatal workflow failures. Every variant maps to exit code 1.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Failed to initialize git repository: {0}")]
    RepositoryInit(String),

    #[error("Failed to stage changes: {0}")]
    Staging(#[source] GitError),

    #[error("Failed to commit: {0}")]
    Commit(#[source] GitError),

    #[error("No commit message provided")]
    NoMessage,

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Operation cancelled by user")]
    Interrupted,

    #[error("Prompt failed: {0}")]
    Prompt(#[source] InteractionError),
}

impl From<InteractionError> for WorkflowError {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::Interrupted => WorkflowError::Interrupted,
            other => WorkflowError::Prompt(other),
        }
    }
}
