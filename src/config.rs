//! Run configuration resolved once at startup, plus environment tunables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::ui::Theme;

/// Default per-attempt timeout for a model call.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Environment variable to override the per-attempt timeout (seconds).
pub const AI_TIMEOUT_ENV_VAR: &str = "GITPILOT_AI_TIMEOUT";

/// Environment variable naming a model to try before the built-in list.
pub const PREFERRED_MODEL_ENV_VAR: &str = "GITPILOT_GEMINI_MODEL";

/// Environment variable to override the API base URL.
pub const BASE_URL_ENV_VAR: &str = "GITPILOT_GEMINI_BASE_URL";

/// What to do when the push step fails after a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushPolicy {
    /// Report the failure as a skipped step; the run still succeeds.
    #[default]
    Lenient,
    /// Report the failure and end the run with a nonzero exit code.
    Strict,
}

/// Flags for a single run. Owned by the workflow for its whole lifetime.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub dry_run: bool,
    pub skip_ai: bool,
    pub auto_accept: bool,
    pub branch: Option<String>,
    pub quiet: bool,
    pub theme: Theme,
    pub log_file: Option<PathBuf>,
    pub push_policy: PushPolicy,
}

/// Per-attempt timeout for model calls.
///
/// Reads `GITPILOT_AI_TIMEOUT` if set, otherwise 30 seconds. Invalid or zero
/// values log a warning and fall back to the default.
pub fn ai_timeout() -> Duration {
    match env::var(AI_TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    AI_TIMEOUT_ENV_VAR, v, DEFAULT_AI_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
    }
}

/// Model id the operator wants tried first, if any.
pub fn preferred_model() -> Option<String> {
    env::var(PREFERRED_MODEL_ENV_VAR)
        .ok()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
