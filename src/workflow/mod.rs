//! Commit workflow: repo check, branch switch, stage, analyze, generate,
//! preview, commit, push and summary.
//!
//! Phases run strictly in that order. Only repository setup, staging,
//! commit and an unresolved commit message are fatal; every other failure is
//! reported as a step and the run moves on.

pub mod step;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{PushPolicy, RunConfig};
use crate::error::{GenerationError, WorkflowError};
use crate::gemini::{MessageGenerator, ModelBackend};
use crate::git::{CommandRunner, GitRepo, normalize_remote_url};
use crate::ui::{Interaction, PreviewChoice};

pub use step::{StepStatus, WorkflowStep, names};

/// Anything that can turn a staged diff into a commit message.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn generate(
        &self,
        diff: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
impl<B: ModelBackend> MessageSource for MessageGenerator<B> {
    async fn generate(
        &self,
        diff: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        MessageGenerator::generate(self, diff, cancel).await
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed,
    /// Nothing was staged; no message was generated and nothing committed.
    NoChanges,
    /// The operator cancelled at the preview.
    Cancelled,
}

/// Orchestrates one run.
pub struct Workflow<R: CommandRunner, S: MessageSource, U: Interaction> {
    config: RunConfig,
    repo: GitRepo<R>,
    source: S,
    ui: U,
    cancel: CancellationToken,
    steps: Vec<WorkflowStep>,
    /// Branch to push, once known to be checked out.
    push_branch: Option<String>,
}

impl<R: CommandRunner, S: MessageSource, U: Interaction> Workflow<R, S, U> {
    pub fn new(
        config: RunConfig,
        repo: GitRepo<R>,
        source: S,
        ui: U,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            repo,
            source,
            ui,
            cancel,
            steps: Vec::new(),
            push_branch: None,
        }
    }

    /// Steps recorded so far, in order.
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn run(&mut self) -> Result<WorkflowOutcome, WorkflowError> {
        if self.config.dry_run {
            self.ui.warn("Dry run mode: no changes will be made");
        }

        self.ensure_repository()?;

        if let Some(branch) = self.config.branch.clone() {
            self.switch_branch(&branch);
        }

        self.stage()?;

        let diff = self.analyze();
        if diff.trim().is_empty() {
            self.ui.info("No changes to commit");
            return Ok(WorkflowOutcome::NoChanges);
        }

        let message = self.obtain_message(&diff).await?;

        let Some(message) = self.preview(message)? else {
            self.ui.warn("Operation cancelled");
            return Ok(WorkflowOutcome::Cancelled);
        };

        self.commit(&message)?;
        let pushed = self.push();

        if !self.config.quiet {
            self.ui.show_summary(&self.steps);
        }

        pushed?;
        self.ui.success("Workflow completed successfully!");
        Ok(WorkflowOutcome::Completed)
    }

    fn record(&mut self, name: &str, status: StepStatus, details: impl Into<String>) {
        let step = WorkflowStep::new(name, status, details);
        debug!(step = %step.name, status = %step.status, "{}", step.details);
        self.ui.announce_step(&step.name, step.status);
        self.steps.push(step);
    }

    fn ensure_repository(&mut self) -> Result<(), WorkflowError> {
        self.ui.announce_step(names::REPO_CHECK, StepStatus::Running);
        if self.repo.is_repository() {
            self.record(names::REPO_CHECK, StepStatus::Success, "Repository found");
            return Ok(());
        }

        self.record(names::REPO_CHECK, StepStatus::Skipped, "Not a git repository");
        self.ui.warn("Not a git repository. Let's set one up.");

        let answer = self
            .ui
            .ask_text("Remote repository URL (leave empty to skip)", None)?;
        let url = normalize_remote_url(&answer);

        if self.config.dry_run {
            self.record(
                names::REPO_SETUP,
                StepStatus::Skipped,
                "Dry run: repository not initialized",
            );
            return Ok(());
        }

        let outcome = match self.repo.init_repository(url.as_deref()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(names::REPO_SETUP, StepStatus::Error, e.to_string());
                return Err(WorkflowError::RepositoryInit(e.to_string()));
            }
        };

        let mut details = outcome.message;
        let conflicting = match (outcome.existing_remote, url) {
            (Some(existing), Some(wanted)) if existing != wanted => Some((existing, wanted)),
            _ => None,
        };
        if let Some((existing, wanted)) = conflicting {
            let replace = self.ui.confirm(
                &format!("Remote 'origin' already points to {existing}. Replace it with {wanted}?"),
                false,
            )?;
            if replace {
                if let Err(e) = self.repo.set_remote_url(&wanted) {
                    self.record(names::REPO_SETUP, StepStatus::Error, e.to_string());
                    return Err(WorkflowError::RepositoryInit(e.to_string()));
                }
                details = format!("Remote origin updated: {wanted}");
            }
        }

        self.record(names::REPO_SETUP, StepStatus::Success, details);
        Ok(())
    }

    /// Non-fatal: on failure the run continues on the current branch.
    fn switch_branch(&mut self, branch: &str) {
        let current = self.repo.current_branch();
        if current.as_deref() == Some(branch) {
            debug!("Already on branch {}", branch);
            self.push_branch = Some(branch.to_string());
            return;
        }

        if self.config.dry_run {
            self.record(
                names::BRANCH_SWITCH,
                StepStatus::Skipped,
                format!("Dry run: would switch to {branch}"),
            );
            return;
        }

        if self.repo.checkout_branch(branch, true) {
            self.push_branch = Some(branch.to_string());
            self.record(
                names::BRANCH_SWITCH,
                StepStatus::Success,
                format!("Switched to {branch}"),
            );
        } else {
            let staying = current.unwrap_or_else(|| "the current branch".to_string());
            self.ui
                .warn(&format!("Could not switch to {branch}; staying on {staying}"));
            self.record(
                names::BRANCH_SWITCH,
                StepStatus::Error,
                format!("Could not switch to {branch}"),
            );
        }
    }

    fn stage(&mut self) -> Result<(), WorkflowError> {
        self.ui.announce_step(names::STAGE, StepStatus::Running);
        if self.config.dry_run {
            self.record(names::STAGE, StepStatus::Success, "Dry run: simulated");
            return Ok(());
        }

        match self.repo.stage_all() {
            Ok(()) => {
                self.record(names::STAGE, StepStatus::Success, "All changes staged");
                Ok(())
            }
            Err(e) => {
                self.record(names::STAGE, StepStatus::Error, e.to_string());
                Err(WorkflowError::Staging(e))
            }
        }
    }

    /// Staged diff; under dry run this is whatever an earlier real `git add` staged.
    fn analyze(&mut self) -> String {
        let diff = self.repo.diff_staged();
        if diff.trim().is_empty() {
            self.record(names::ANALYZE, StepStatus::Skipped, "No changes to commit");
        } else {
            self.record(
                names::ANALYZE,
                StepStatus::Success,
                format!("Diff length: {} chars", diff.chars().count()),
            );
        }
        diff
    }

    async fn obtain_message(&mut self, diff: &str) -> Result<String, WorkflowError> {
        if self.config.skip_ai {
            self.record(names::GENERATE, StepStatus::Skipped, "AI generation skipped");
            return self.manual_message();
        }

        let label = "Generating commit message with AI...";
        self.ui.begin_progress(label);
        let result = self.source.generate(diff, &self.cancel).await;
        self.ui.end_progress(label);

        match result {
            Ok(message) => {
                info!("Commit message generated");
                self.record(names::GENERATE, StepStatus::Success, message.clone());
                Ok(message)
            }
            Err(GenerationError::Cancelled) => {
                self.record(names::GENERATE, StepStatus::Error, "Cancelled");
                Err(WorkflowError::Interrupted)
            }
            Err(e) => {
                info!(kind = ?e.kind(), "Generation failed: {}", e);
                self.ui.error(&e.to_string());
                self.record(names::GENERATE, StepStatus::Error, e.summary());
                self.ui.warn("Falling back to manual commit message");
                self.manual_message()
            }
        }
    }

    fn manual_message(&mut self) -> Result<String, WorkflowError> {
        let message = self.ui.ask_text("Enter commit message", None)?;
        let message = message.trim();
        if message.is_empty() {
            self.ui.error("No commit message provided");
            return Err(WorkflowError::NoMessage);
        }
        Ok(message.to_string())
    }

    /// Let the operator accept or change `message`. `None` means cancelled.
    fn preview(&mut self, message: String) -> Result<Option<String>, WorkflowError> {
        if self.config.auto_accept || self.config.dry_run || self.config.quiet {
            return Ok(Some(message));
        }

        let summary = self.repo.diff_summary();
        let labels = PreviewChoice::labels();
        let mut current = message;

        loop {
            self.ui.show_commit_preview(&current, &summary);
            let index = self.ui.choose("What would you like to do?", &labels, 0)?;

            match PreviewChoice::from_index(index).unwrap_or(PreviewChoice::Cancel) {
                PreviewChoice::Accept => return Ok(Some(current)),
                PreviewChoice::EditInline => {
                    if let Some(edited) = self.edit_inline(&current)? {
                        return Ok(Some(edited));
                    }
                }
                PreviewChoice::EditExternal => match self.ui.edit_external(&current) {
                    Ok(edited) if edited.trim().is_empty() => {
                        self.ui
                            .warn("Editor returned an empty message; keeping the previous one");
                    }
                    Ok(edited) => return Ok(Some(edited.trim().to_string())),
                    Err(e) => {
                        self.ui.error(&format!("Failed to open editor: {e}"));
                        self.ui.warn("Falling back to inline editing...");
                        if let Some(edited) = self.edit_inline(&current)? {
                            return Ok(Some(edited));
                        }
                    }
                },
                PreviewChoice::Manual => {
                    let manual = self.ui.ask_text("Enter commit message", None)?;
                    if manual.trim().is_empty() {
                        self.ui.warn("Commit message cannot be empty");
                    } else {
                        return Ok(Some(manual.trim().to_string()));
                    }
                }
                PreviewChoice::Cancel => return Ok(None),
            }
        }
    }

    fn edit_inline(&mut self, current: &str) -> Result<Option<String>, WorkflowError> {
        let edited = self.ui.ask_text("Edit commit message", Some(current))?;
        if edited.trim().is_empty() {
            self.ui.warn("Commit message cannot be empty");
            return Ok(None);
        }
        Ok(Some(edited.trim().to_string()))
    }

    fn commit(&mut self, message: &str) -> Result<(), WorkflowError> {
        self.ui.announce_step(names::COMMIT, StepStatus::Running);
        if self.config.dry_run {
            info!("Dry run: would commit with message: {}", message);
            self.record(
                names::COMMIT,
                StepStatus::Success,
                format!("Dry run: would commit '{message}'"),
            );
            return Ok(());
        }

        match self.repo.commit(message) {
            Ok(()) => {
                self.record(names::COMMIT, StepStatus::Success, message);
                Ok(())
            }
            Err(e) => {
                self.record(names::COMMIT, StepStatus::Error, e.to_string());
                Err(WorkflowError::Commit(e))
            }
        }
    }

    /// Under the lenient policy a failed push never fails the run.
    fn push(&mut self) -> Result<(), WorkflowError> {
        if self.config.dry_run {
            self.record(names::PUSH, StepStatus::Skipped, "Dry run: push skipped");
            return Ok(());
        }

        let label = "Pushing to remote...";
        self.ui.begin_progress(label);
        let outcome = self.repo.push(self.push_branch.as_deref(), false);
        self.ui.end_progress(label);

        if outcome.pushed {
            self.ui.success(&outcome.message);
            self.record(names::PUSH, StepStatus::Success, outcome.message);
            return Ok(());
        }

        self.ui.warn(&format!("Push skipped: {}", outcome.message));
        self.record(names::PUSH, StepStatus::Skipped, outcome.message.clone());
        match self.config.push_policy {
            PushPolicy::Lenient => Ok(()),
            PushPolicy::Strict => Err(WorkflowError::Push(outcome.message)),
        }
    }
}
