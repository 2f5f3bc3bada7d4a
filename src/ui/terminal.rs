//! Themed terminal implementation of [`Interaction`] on top of dialoguer.

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::error::{EditorError, InteractionError};
use crate::ui::editor::edit_in_editor;
use crate::ui::theme::{Palette, Theme};
use crate::ui::Interaction;
use crate::workflow::{StepStatus, WorkflowStep};

/// Interactive terminal front end.
///
/// Under quiet mode only warnings, errors and prompts are shown.
pub struct TerminalUi {
    palette: Palette,
    prompt_theme: ColorfulTheme,
    quiet: bool,
}

impl TerminalUi {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        Self {
            palette: theme.palette(),
            prompt_theme: ColorfulTheme::default(),
            quiet,
        }
    }

    pub fn banner(&self) {
        if !self.quiet {
            println!("{}\n", self.palette.accent.apply_to("Gitpilot"));
        }
    }
}

fn prompt_error(err: dialoguer::Error) -> InteractionError {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => {
            InteractionError::Interrupted
        }
        dialoguer::Error::IO(e) => InteractionError::Io(e),
    }
}

impl Interaction for TerminalUi {
    fn announce_step(&self, name: &str, status: StepStatus) {
        if self.quiet {
            return;
        }
        println!(
            "{} {}",
            status.marker(),
            self.palette.for_status(status).apply_to(name)
        );
    }

    fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.palette.info.apply_to(format!("[INFO] {message}")));
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.palette.success.apply_to(format!("[OK] {message}")));
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", self.palette.warning.apply_to(format!("[WARN] {message}")));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.palette.error.apply_to(format!("[FAIL] {message}")));
    }

    fn begin_progress(&self, label: &str) {
        if !self.quiet {
            println!("{}", self.palette.info.apply_to(format!("[...] {label}")));
        }
    }

    fn end_progress(&self, _label: &str) {}

    fn choose(
        &self,
        prompt: &str,
        options: &[&str],
        default: usize,
    ) -> Result<usize, InteractionError> {
        Select::with_theme(&self.prompt_theme)
            .with_prompt(prompt)
            .items(options)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn ask_text(&self, prompt: &str, default: Option<&str>) -> Result<String, InteractionError> {
        let mut input = Input::<String>::with_theme(&self.prompt_theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(initial) = default {
            input = input.with_initial_text(initial);
        }
        input
            .interact_text()
            .map(|answer| answer.trim().to_string())
            .map_err(prompt_error)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, InteractionError> {
        Confirm::with_theme(&self.prompt_theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn show_commit_preview(&self, message: &str, diff_summary: &str) {
        println!();
        println!("{}", self.palette.accent.apply_to("AI-Generated Commit Message").bold());
        println!();
        println!("  {}", self.palette.accent.apply_to(message));
        if !diff_summary.is_empty() {
            println!();
            println!("  {}", self.palette.info.apply_to(format!("Changes: {diff_summary}")));
        }
        println!();
    }

    fn show_summary(&self, steps: &[WorkflowStep]) {
        if self.quiet || steps.is_empty() {
            return;
        }

        let name_width = steps.iter().map(|s| s.name.len()).max().unwrap_or(4).max(4);

        println!();
        println!("{}", self.palette.primary.apply_to("Workflow Summary:"));
        println!(
            "  {}",
            self.palette
                .accent
                .apply_to(format!("{:<name_width$}  {:<8}  Details", "Step", "Status"))
        );
        for step in steps {
            let status = format!("{:<8}", step.status.as_str().to_uppercase());
            println!(
                "  {}  {}  {}",
                self.palette
                    .secondary
                    .apply_to(format!("{:<name_width$}", step.name)),
                self.palette.for_status(step.status).apply_to(status),
                step.details
            );
        }
    }

    fn edit_external(&self, content: &str) -> Result<String, EditorError> {
        edit_in_editor(content)
    }
}
