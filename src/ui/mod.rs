//! Operator interaction: step announcements, prompts, preview and summary.
//!
//! The workflow only talks to the [`Interaction`] trait, so tests can drive
//! a run with scripted answers instead of a terminal.

pub mod editor;
pub mod terminal;
pub mod theme;

pub use editor::{DEFAULT_EDITOR, edit_in_editor, editor_command};
pub use terminal::TerminalUi;
pub use theme::{Palette, Theme};

use crate::error::{EditorError, InteractionError};
use crate::workflow::{StepStatus, WorkflowStep};

/// What the operator wants to do with a proposed commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewChoice {
    Accept,
    EditInline,
    EditExternal,
    Manual,
    Cancel,
}

impl PreviewChoice {
    /// Choices in the order they are offered.
    pub const ALL: [PreviewChoice; 5] = [
        PreviewChoice::Accept,
        PreviewChoice::EditInline,
        PreviewChoice::EditExternal,
        PreviewChoice::Manual,
        PreviewChoice::Cancel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PreviewChoice::Accept => "Accept and continue",
            PreviewChoice::EditInline => "Edit message inline",
            PreviewChoice::EditExternal => "Edit in editor ($EDITOR)",
            PreviewChoice::Manual => "Enter manual message",
            PreviewChoice::Cancel => "Cancel",
        }
    }

    pub fn from_index(index: usize) -> Option<PreviewChoice> {
        Self::ALL.get(index).copied()
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

/// Presentation and input surface used by the workflow.
pub trait Interaction {
    /// Show that a step reached `status`.
    fn announce_step(&self, name: &str, status: StepStatus);

    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Work labelled `label` has started; paired with [`Interaction::end_progress`].
    fn begin_progress(&self, label: &str);
    fn end_progress(&self, label: &str);

    /// Pick one of `options`; returns its index.
    fn choose(&self, prompt: &str, options: &[&str], default: usize)
    -> Result<usize, InteractionError>;

    /// Free-text answer. An empty answer is allowed.
    fn ask_text(&self, prompt: &str, default: Option<&str>) -> Result<String, InteractionError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, InteractionError>;

    /// Show a proposed commit message with the change summary.
    fn show_commit_preview(&self, message: &str, diff_summary: &str);

    /// Render the ordered step log.
    fn show_summary(&self, steps: &[WorkflowStep]);

    /// Edit `content` in an external editor.
    fn edit_external(&self, content: &str) -> Result<String, EditorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_order_matches_labels() {
        assert_eq!(PreviewChoice::from_index(0), Some(PreviewChoice::Accept));
        assert_eq!(PreviewChoice::from_index(4), Some(PreviewChoice::Cancel));
        assert_eq!(PreviewChoice::from_index(5), None);
        assert_eq!(PreviewChoice::labels()[2], "Edit in editor ($EDITOR)");
    }
}
