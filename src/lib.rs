//! gitpilot - stage, describe, commit and push changes with AI-generated commit messages.
//!
//! # Overview
//!
//! gitpilot stages the working tree, sends the staged diff to the Gemini API
//! to draft a commit message, lets the operator review or edit it, commits,
//! and pushes. When generation fails the operator types the message instead.

pub mod config;
pub mod error;
pub mod gemini;
pub mod git;
pub mod logging;
pub mod ui;
pub mod workflow;

// Re-export commonly used types
pub use config::{PushPolicy, RunConfig};
pub use error::{
    BackendError, EditorError, FailureKind, GenerationError, GitError, InteractionError,
    WorkflowError,
};
pub use gemini::{GeminiClient, MessageGenerator};
pub use git::{CommandRunner, GitRepo, SystemRunner};
pub use ui::{Interaction, PreviewChoice, TerminalUi, Theme};
pub use workflow::{MessageSource, StepStatus, Workflow, WorkflowOutcome, WorkflowStep};
