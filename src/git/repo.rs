//! Repository lifecycle operations built on [`CommandRunner`].
//!
//! Read-only probes (`is_repository`, `current_branch`, `diff_staged`) never
//! fail: they degrade to `false`/`None`/empty. Mutating operations whose
//! failure blocks progress (`init_repository`, `stage_all`, `commit`) return
//! `Err`. Push failures are reported through [`PushOutcome`] and never abort.

use tracing::{debug, info, warn};

use crate::error::GitError;
use crate::git::runner::CommandRunner;

/// Name of the remote used for pushing and for remote setup on init.
pub const DEFAULT_REMOTE: &str = "origin";

/// Result of `init_repository`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub message: String,
    /// Set when `origin` was already configured; the existing URL is kept.
    pub existing_remote: Option<String>,
}

/// Result of `push`. A failed push is a reported condition, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub pushed: bool,
    pub message: String,
}

impl PushOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            pushed: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            pushed: false,
            message: message.into(),
        }
    }
}

/// VCS adapter over the `git` command line.
pub struct GitRepo<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitRepo<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Whether the working directory is inside a git repository.
    pub fn is_repository(&self) -> bool {
        self.probe(&["git", "rev-parse", "--git-dir"]).is_some()
    }

    /// Initialize a repository, adding `remote_url` as `origin` unless one exists.
    pub fn init_repository(&self, remote_url: Option<&str>) -> Result<InitOutcome, GitError> {
        self.runner.run(&["git", "init"], true)?;
        info!("Initialized git repository");

        let Some(url) = remote_url else {
            return Ok(InitOutcome {
                message: "Git repository initialized (no remote)".to_string(),
                existing_remote: None,
            });
        };

        if let Some(existing) = self.remote_url() {
            return Ok(InitOutcome {
                message: format!("Remote '{DEFAULT_REMOTE}' already exists: {existing}"),
                existing_remote: Some(existing),
            });
        }

        self.runner
            .run(&["git", "remote", "add", DEFAULT_REMOTE, url], true)?;
        info!(remote = url, "Added remote {}", DEFAULT_REMOTE);

        Ok(InitOutcome {
            message: format!("Remote {DEFAULT_REMOTE} added: {url}"),
            existing_remote: None,
        })
    }

    /// URL of `origin`, if configured.
    pub fn remote_url(&self) -> Option<String> {
        self.probe(&["git", "remote", "get-url", DEFAULT_REMOTE])
    }

    /// Point an existing `origin` at a new URL.
    pub fn set_remote_url(&self, url: &str) -> Result<(), GitError> {
        self.runner
            .run(&["git", "remote", "set-url", DEFAULT_REMOTE, url], true)?;
        Ok(())
    }

    /// Stage every change in the working tree, including deletions.
    pub fn stage_all(&self) -> Result<(), GitError> {
        self.runner.run(&["git", "add", "-A"], true)?;
        Ok(())
    }

    /// Unified diff of staged changes. Empty when nothing is staged.
    pub fn diff_staged(&self) -> String {
        match self
            .runner
            .run(&["git", "diff", "--cached", "--no-color"], false)
        {
            Ok(result) if result.success => result.output,
            Ok(result) => {
                debug!("git diff --cached failed: {}", result.output);
                String::new()
            }
            Err(e) => {
                warn!("Could not read staged diff: {e}");
                String::new()
            }
        }
    }

    /// Human-readable count of staged paths.
    pub fn diff_summary(&self) -> String {
        match self.probe(&["git", "diff", "--cached", "--name-status"]) {
            Some(output) if !output.is_empty() => {
                let count = output.lines().filter(|l| !l.trim().is_empty()).count();
                format!("{count} file(s) changed")
            }
            _ => "No changes".to_string(),
        }
    }

    /// Commit staged changes with `message`.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.runner.run(&["git", "commit", "-m", message], true)?;
        Ok(())
    }

    /// Push to `origin`, retrying once with `-u` when the plain push fails.
    ///
    /// Under `dry_run` no subprocess is invoked.
    pub fn push(&self, branch: Option<&str>, dry_run: bool) -> PushOutcome {
        if dry_run {
            info!("Dry run: would push to remote");
            return PushOutcome::success("Dry run: push simulated");
        }

        if self.remote_url().is_none() {
            info!("No remote configured, skipping push");
            return PushOutcome::failure("No remote repository configured");
        }

        let branch = branch.map(str::to_string).or_else(|| self.current_branch());

        let last_output = match self.runner.run(&["git", "push"], false) {
            Ok(result) if result.success => {
                return PushOutcome::success("Changes pushed successfully");
            }
            Ok(result) => result.output,
            Err(e) => e.to_string(),
        };
        debug!("Plain push failed: {last_output}");

        let Some(branch) = branch else {
            return PushOutcome::failure(format!("Could not push changes: {last_output}"));
        };

        match self
            .runner
            .run(&["git", "push", "-u", DEFAULT_REMOTE, branch.as_str()], false)
        {
            Ok(result) if result.success => PushOutcome::success(format!(
                "Changes pushed successfully (set upstream to {DEFAULT_REMOTE}/{branch})"
            )),
            Ok(result) => {
                warn!("Push with upstream failed: {}", result.output);
                PushOutcome::failure(format!("Could not push changes: {}", result.output))
            }
            Err(e) => PushOutcome::failure(format!("Could not push changes: {e}")),
        }
    }

    /// Name of the checked-out branch; `None` on detached HEAD or outside a repo.
    pub fn current_branch(&self) -> Option<String> {
        self.probe(&["git", "symbolic-ref", "--quiet", "--short", "HEAD"])
    }

    /// Switch to `name`, creating it first when missing and `create_if_missing` is set.
    ///
    /// Names git would not accept as a branch, or that would parse as an
    /// option, are refused without running checkout.
    pub fn checkout_branch(&self, name: &str, create_if_missing: bool) -> bool {
        if name.starts_with('-')
            || !self.probe_success(&["git", "check-ref-format", "--branch", name])
        {
            warn!(branch = name, "Invalid branch name");
            return false;
        }

        let reference = format!("refs/heads/{name}");
        let exists =
            self.probe_success(&["git", "rev-parse", "--verify", "--quiet", reference.as_str()]);

        let argv: Vec<&str> = if !exists && create_if_missing {
            vec!["git", "checkout", "-b", name]
        } else {
            vec!["git", "checkout", name]
        };

        match self.runner.run(&argv, false) {
            Ok(result) if result.success => true,
            Ok(result) => {
                warn!(branch = name, "Checkout failed: {}", result.output);
                false
            }
            Err(e) => {
                warn!(branch = name, "Checkout failed: {e}");
                false
            }
        }
    }

    /// Run a read-only command; `Some(output)` only on success.
    fn probe(&self, argv: &[&str]) -> Option<String> {
        match self.runner.run(argv, false) {
            Ok(result) if result.success => Some(result.output),
            _ => None,
        }
    }

    fn probe_success(&self, argv: &[&str]) -> bool {
        self.probe(argv).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::git::runner::CommandResult;

    /// Replays scripted results in order and records every argv it receives.
    struct ScriptedRunner {
        responses: RefCell<VecDeque<CommandResult>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(responses: Vec<CommandResult>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, argv: &[&str], check_failure: bool) -> Result<CommandResult, GitError> {
            self.calls.borrow_mut().push(argv.join(" "));
            let result = self
                .responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| CommandResult::failed("unscripted"));
            if check_failure && !result.success {
                return Err(GitError::CommandFailed {
                    command: argv.join(" "),
                    output: result.output,
                });
            }
            Ok(result)
        }
    }

    #[test]
    fn test_push_dry_run_invokes_nothing() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![]));
        let outcome = repo.push(Some("main"), true);
        assert!(outcome.pushed);
        assert_eq!(outcome.message, "Dry run: push simulated");
        assert!(repo.runner().calls().is_empty());
    }

    #[test]
    fn test_push_without_remote_fails_softly() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![CommandResult::failed(
            "error: No such remote 'origin'",
        )]));
        let outcome = repo.push(None, false);
        assert!(!outcome.pushed);
        assert_eq!(outcome.message, "No remote repository configured");
        assert_eq!(repo.runner().calls(), vec!["git remote get-url origin"]);
    }

    #[test]
    fn test_push_plain_success_does_not_retry() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("git@example.com:me/repo.git"),
            CommandResult::ok(""),
        ]));
        let outcome = repo.push(Some("main"), false);
        assert!(outcome.pushed);
        assert_eq!(
            repo.runner().calls(),
            vec!["git remote get-url origin", "git push"]
        );
    }

    #[test]
    fn test_push_retries_once_with_upstream() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("git@example.com:me/repo.git"),
            CommandResult::failed("fatal: The current branch main has no upstream branch."),
            CommandResult::ok("branch 'main' set up to track 'origin/main'."),
        ]));
        let outcome = repo.push(Some("main"), false);
        assert!(outcome.pushed);
        assert!(outcome.message.contains("origin/main"));
        assert_eq!(
            repo.runner().calls(),
            vec![
                "git remote get-url origin",
                "git push",
                "git push -u origin main"
            ]
        );
    }

    #[test]
    fn test_push_never_attempts_a_third_time() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("https://example.com/repo.git"),
            CommandResult::failed("rejected"),
            CommandResult::failed("fatal: Authentication failed"),
            CommandResult::ok("should never be consumed"),
        ]));
        let outcome = repo.push(Some("main"), false);
        assert!(!outcome.pushed);
        assert!(outcome.message.contains("Authentication failed"));
        let pushes = repo
            .runner()
            .calls()
            .iter()
            .filter(|c| c.starts_with("git push"))
            .count();
        assert_eq!(pushes, 2);
    }

    #[test]
    fn test_push_resolves_current_branch_when_unspecified() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("https://example.com/repo.git"),
            CommandResult::ok("feature/x"),
            CommandResult::failed("no upstream"),
            CommandResult::ok(""),
        ]));
        let outcome = repo.push(None, false);
        assert!(outcome.pushed);
        assert_eq!(
            repo.runner().calls(),
            vec![
                "git remote get-url origin",
                "git symbolic-ref --quiet --short HEAD",
                "git push",
                "git push -u origin feature/x"
            ]
        );
    }

    #[test]
    fn test_push_without_resolvable_branch_skips_retry() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("https://example.com/repo.git"),
            CommandResult::failed("fatal: ref HEAD is not a symbolic ref"),
            CommandResult::failed("fatal: You are not currently on a branch."),
        ]));
        let outcome = repo.push(None, false);
        assert!(!outcome.pushed);
        assert!(outcome.message.contains("not currently on a branch"));
        assert_eq!(repo.runner().calls().len(), 3);
    }

    #[test]
    fn test_init_keeps_existing_remote() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("Reinitialized existing Git repository"),
            CommandResult::ok("https://example.com/old.git"),
        ]));
        let outcome = repo
            .init_repository(Some("https://example.com/new.git"))
            .unwrap();
        assert_eq!(
            outcome.existing_remote.as_deref(),
            Some("https://example.com/old.git")
        );
        assert!(!repo
            .runner()
            .calls()
            .iter()
            .any(|c| c.starts_with("git remote add")));
    }

    #[test]
    fn test_init_failure_propagates() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![CommandResult::failed(
            "permission denied",
        )]));
        let result = repo.init_repository(None);
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }

    #[test]
    fn test_diff_summary_counts_paths() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![CommandResult::ok(
            "M\tsrc/lib.rs\nA\tsrc/new.rs\nD\told.rs",
        )]));
        assert_eq!(repo.diff_summary(), "3 file(s) changed");
    }

    #[test]
    fn test_diff_staged_degrades_to_empty() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![CommandResult::failed(
            "fatal: not a git repository",
        )]));
        assert_eq!(repo.diff_staged(), "");
    }

    #[test]
    fn test_checkout_existing_branch_does_not_create() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("dev"),
            CommandResult::ok("abc123"),
            CommandResult::ok("Switched to branch 'dev'"),
        ]));
        assert!(repo.checkout_branch("dev", true));
        assert_eq!(repo.runner().calls()[2], "git checkout dev");
    }

    #[test]
    fn test_checkout_missing_branch_creates_it() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![
            CommandResult::ok("dev"),
            CommandResult::failed(""),
            CommandResult::ok("Switched to a new branch 'dev'"),
        ]));
        assert!(repo.checkout_branch("dev", true));
        assert_eq!(repo.runner().calls()[2], "git checkout -b dev");
    }

    #[test]
    fn test_checkout_refuses_option_like_name() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![]));
        assert!(!repo.checkout_branch("--orphan", true));
        assert!(repo.runner().calls().is_empty());
    }

    #[test]
    fn test_checkout_refuses_invalid_ref_name() {
        let repo = GitRepo::new(ScriptedRunner::new(vec![CommandResult::failed(
            "fatal: 'bad..name' is not a valid branch name",
        )]));
        assert!(!repo.checkout_branch("bad..name", true));
        assert_eq!(
            repo.runner().calls(),
            vec!["git check-ref-format --branch bad..name"]
        );
    }
}
