//! Commit message generation backed by the Gemini API.

pub mod client;
pub mod credential;
pub mod generator;
pub mod prompt;

pub use client::{GeminiClient, ModelBackend, ModelDescriptor};
pub use credential::{Credential, load_dotenv, resolve_credential};
pub use generator::{
    CANDIDATE_MODELS, GenerationRequest, GenerationSettings, MessageGenerator, candidate_models,
    sanitize_message,
};
pub use prompt::{MAX_DIFF_LENGTH, build_prompt, truncate_diff};
