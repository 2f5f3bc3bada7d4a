//! API key resolution.
//!
//! Order:
//! 1. `GEMINI_API_KEY` (the operator's own key, also read from `.env`)
//! 2. `GITPILOT_SHARED_GEMINI_KEY` at runtime
//! 3. `GITPILOT_SHARED_GEMINI_KEY` captured at build time

use std::env;
use std::fmt;

use crate::error::CredentialSource;

/// Operator-owned key.
pub const OPERATOR_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Shared, rate-limited fallback key.
pub const SHARED_KEY_ENV_VAR: &str = "GITPILOT_SHARED_GEMINI_KEY";

const BUNDLED_SHARED_KEY: Option<&str> = option_env!("GITPILOT_SHARED_GEMINI_KEY");

/// A resolved API key and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    source: CredentialSource,
}

impl Credential {
    pub fn new(key: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn is_shared(&self) -> bool {
        self.source == CredentialSource::Shared
    }
}

// The key never reaches logs or panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the key to use, preferring the operator's own.
pub fn resolve_credential() -> Option<Credential> {
    if let Some(key) = non_empty_var(OPERATOR_KEY_ENV_VAR) {
        return Some(Credential::new(key, CredentialSource::Operator));
    }

    non_empty_var(SHARED_KEY_ENV_VAR)
        .or_else(|| {
            BUNDLED_SHARED_KEY
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
        })
        .map(|key| Credential::new(key, CredentialSource::Shared))
}

/// Load a `.env` file from the working directory, if present.
///
/// Existing environment variables are never overridden.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_key_wins_over_shared() {
        temp_env::with_vars(
            [
                (OPERATOR_KEY_ENV_VAR, Some("mine")),
                (SHARED_KEY_ENV_VAR, Some("shared")),
            ],
            || {
                let cred = resolve_credential().unwrap();
                assert_eq!(cred.key(), "mine");
                assert_eq!(cred.source(), CredentialSource::Operator);
            },
        );
    }

    #[test]
    fn test_shared_key_used_when_operator_missing() {
        temp_env::with_vars(
            [
                (OPERATOR_KEY_ENV_VAR, None),
                (SHARED_KEY_ENV_VAR, Some("shared")),
            ],
            || {
                let cred = resolve_credential().unwrap();
                assert_eq!(cred.key(), "shared");
                assert!(cred.is_shared());
            },
        );
    }

    #[test]
    fn test_blank_operator_key_is_ignored() {
        temp_env::with_vars(
            [
                (OPERATOR_KEY_ENV_VAR, Some("   ")),
                (SHARED_KEY_ENV_VAR, Some("shared")),
            ],
            || {
                assert!(resolve_credential().unwrap().is_shared());
            },
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let cred = Credential::new("super-secret", CredentialSource::Operator);
        let shown = format!("{:?}", cred);
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("Operator"));
    }
}
