//! External editor integration for commit messages.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use tracing::debug;

use crate::error::EditorError;

/// Editor used when `EDITOR` is unset.
pub const DEFAULT_EDITOR: &str = "nano";

/// Environment variable naming the editor command.
pub const EDITOR_ENV_VAR: &str = "EDITOR";

/// The editor command line: `EDITOR` split on whitespace, or `nano`.
pub fn editor_command() -> Vec<String> {
    let configured = env::var(EDITOR_ENV_VAR).unwrap_or_default();
    let parts: Vec<String> = configured.split_whitespace().map(String::from).collect();
    if parts.is_empty() {
        vec![DEFAULT_EDITOR.to_string()]
    } else {
        parts
    }
}

/// Open `content` in the operator's editor and return the edited text, trimmed.
///
/// The temporary file is removed when this returns, on success or failure.
pub fn edit_in_editor(content: &str) -> Result<String, EditorError> {
    let command = editor_command();
    let (program, args) = command
        .split_first()
        .ok_or_else(|| EditorError::NotFound(String::new()))?;

    if which::which(program).is_err() {
        return Err(EditorError::NotFound(program.clone()));
    }

    let mut file = tempfile::Builder::new()
        .prefix("gitpilot-commit-")
        .suffix(".txt")
        .tempfile()
        .map_err(EditorError::TempFile)?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(EditorError::TempFile)?;

    debug!("Launching editor {} on {}", program, file.path().display());

    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .map_err(|source| EditorError::Launch {
            editor: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(EditorError::NonZeroExit {
            editor: program.clone(),
            code: status.code(),
        });
    }

    let edited = fs::read_to_string(file.path()).map_err(EditorError::TempFile)?;
    Ok(edited.trim().to_string())
}
