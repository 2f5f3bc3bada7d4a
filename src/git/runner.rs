//! Subprocess execution for git commands.
//!
//! Every VCS operation funnels through [`CommandRunner::run`], which captures
//! stdout and stderr together and reports the exit status. There is no retry
//! and no timeout at this layer; git commands are local and expected to be fast.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::GitError;

/// Maximum characters of argv/output written to the debug log per invocation.
const LOG_PREVIEW_CHARS: usize = 200;

/// Result of a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Combined stdout and stderr, trimmed.
    pub output: String,
    pub success: bool,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }
}

/// Path of the `git` executable on `PATH`.
pub fn ensure_git_available() -> Result<PathBuf, GitError> {
    locate_git(env::var_os("PATH"))
}

fn locate_git(search_path: Option<OsString>) -> Result<PathBuf, GitError> {
    let cwd = env::current_dir().map_err(|_| GitError::NotInstalled)?;
    which::which_in("git", search_path, cwd).map_err(|_| GitError::NotInstalled)
}

/// Executes an external command and captures its output.
///
/// When `check_failure` is true a nonzero exit becomes
/// [`GitError::CommandFailed`]; when false the call only fails if the program
/// could not be started, and the caller inspects [`CommandResult::success`].
pub trait CommandRunner {
    fn run(&self, argv: &[&str], check_failure: bool) -> Result<CommandResult, GitError>;
}

/// Runs commands as real child processes, optionally inside a fixed directory.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cwd: Option<PathBuf>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command with `dir` as its working directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            cwd: Some(dir.as_ref().to_path_buf()),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[&str], check_failure: bool) -> Result<CommandResult, GitError> {
        let command_line = argv.join(" ");
        let (program, args) = argv.split_first().ok_or_else(|| GitError::CommandFailed {
            command: String::new(),
            output: "empty command".to_string(),
        })?;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| GitError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let combined = merge_output(&output.stdout, &output.stderr);
        debug!(
            command = %preview(&command_line),
            success = output.status.success(),
            output = %preview(&combined),
            "git command finished"
        );

        if !output.status.success() && check_failure {
            return Err(GitError::CommandFailed {
                command: command_line,
                output: combined,
            });
        }

        Ok(CommandResult {
            output: combined,
            success: output.status.success(),
        })
    }
}

/// Join stdout and stderr into one trimmed string.
fn merge_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let (stdout, stderr) = (stdout.trim(), stderr.trim());

    match (stdout.is_empty(), stderr.is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

/// Truncate text for log output without splitting a UTF-8 character.
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() <= LOG_PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}
