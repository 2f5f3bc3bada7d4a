//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};
use tokio_util::sync::CancellationToken;

use gitpilot::error::{EditorError, GenerationError, GitError, InteractionError};
use gitpilot::git::{CommandResult, CommandRunner, SystemRunner};
use gitpilot::ui::Interaction;
use gitpilot::workflow::{MessageSource, StepStatus, WorkflowStep};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory, on branch `main`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        repo.set_head("refs/heads/main").expect("Failed to set HEAD");

        let mut config = repo.config().expect("Failed to open repo config");
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        config.set_bool("commit.gpgsign", false).unwrap();

        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Runner that executes git inside this repository.
    pub fn runner(&self) -> SystemRunner {
        SystemRunner::in_dir(self.dir.path())
    }

    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Commit `name` with `content` directly through git2. Returns the commit OID.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        self.write_file(name, content);

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Number of commits reachable from HEAD (0 for an unborn branch).
    pub fn commit_count(&self) -> usize {
        let Ok(mut walk) = self.repo.revwalk() else {
            return 0;
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }

    pub fn head_message(&self) -> Option<String> {
        let commit = self.repo.head().ok()?.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim().to_string())
    }

    pub fn head_branch(&self) -> Option<String> {
        self.repo.head().ok()?.shorthand().map(String::from)
    }

    /// Attach a fresh bare repository as `origin`. Keep the returned dir alive.
    pub fn add_bare_remote(&self) -> tempfile::TempDir {
        let remote_dir = tempfile::tempdir().expect("Failed to create remote dir");
        Repository::init_bare(remote_dir.path()).expect("Failed to init bare repo");
        self.repo
            .remote("origin", remote_dir.path().to_str().expect("Invalid remote path"))
            .expect("Failed to add origin remote");
        remote_dir
    }
}

/// Real git, except the repository probe fails, as it does for a repo git
/// refuses to recognize (e.g. one owned by another user).
pub struct UnrecognizedRepoRunner(pub SystemRunner);

impl CommandRunner for UnrecognizedRepoRunner {
    fn run(&self, argv: &[&str], check_failure: bool) -> Result<CommandResult, GitError> {
        if argv == ["git", "rev-parse", "--git-dir"] {
            return Ok(CommandResult::failed("fatal: not a git repository"));
        }
        self.0.run(argv, check_failure)
    }
}

/// URL of `origin` read straight from the repository config.
pub fn origin_url(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(String::from)
}

/// Something the scripted UI was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Step(String, StepStatus),
    Info(String),
    Success(String),
    Warn(String),
    Error(String),
    Preview(String),
    Summary(Vec<WorkflowStep>),
}

/// Interaction that answers prompts from queues and records what it showed.
#[derive(Default)]
pub struct ScriptedUi {
    texts: RefCell<VecDeque<Result<String, InteractionError>>>,
    choices: RefCell<VecDeque<usize>>,
    confirms: RefCell<VecDeque<bool>>,
    edits: RefCell<VecDeque<Result<String, EditorError>>>,
    pub events: RefCell<Vec<UiEvent>>,
    pub prompts: RefCell<Vec<String>>,
}

impl ScriptedUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, answer: &str) -> Self {
        self.texts.borrow_mut().push_back(Ok(answer.to_string()));
        self
    }

    pub fn with_interrupted_text(self) -> Self {
        self.texts
            .borrow_mut()
            .push_back(Err(InteractionError::Interrupted));
        self
    }

    pub fn with_choice(self, index: usize) -> Self {
        self.choices.borrow_mut().push_back(index);
        self
    }

    pub fn with_confirm(self, answer: bool) -> Self {
        self.confirms.borrow_mut().push_back(answer);
        self
    }

    pub fn with_edit(self, result: Result<String, EditorError>) -> Self {
        self.edits.borrow_mut().push_back(result);
        self
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn previews(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, UiEvent::Preview(_)))
            .count()
    }

    pub fn summary(&self) -> Option<Vec<WorkflowStep>> {
        self.events().into_iter().find_map(|e| match e {
            UiEvent::Summary(steps) => Some(steps),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Warn(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Interaction for ScriptedUi {
    fn announce_step(&self, name: &str, status: StepStatus) {
        self.push(UiEvent::Step(name.to_string(), status));
    }

    fn info(&self, message: &str) {
        self.push(UiEvent::Info(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(UiEvent::Success(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(UiEvent::Warn(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(UiEvent::Error(message.to_string()));
    }

    fn begin_progress(&self, _label: &str) {}

    fn end_progress(&self, _label: &str) {}

    fn choose(
        &self,
        prompt: &str,
        _options: &[&str],
        _default: usize,
    ) -> Result<usize, InteractionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self
            .choices
            .borrow_mut()
            .pop_front()
            .expect("unscripted choice"))
    }

    fn ask_text(&self, prompt: &str, _default: Option<&str>) -> Result<String, InteractionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.texts
            .borrow_mut()
            .pop_front()
            .expect("unscripted text prompt")
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool, InteractionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self
            .confirms
            .borrow_mut()
            .pop_front()
            .expect("unscripted confirm"))
    }

    fn show_commit_preview(&self, message: &str, _diff_summary: &str) {
        self.push(UiEvent::Preview(message.to_string()));
    }

    fn show_summary(&self, steps: &[WorkflowStep]) {
        self.push(UiEvent::Summary(steps.to_vec()));
    }

    fn edit_external(&self, _content: &str) -> Result<String, EditorError> {
        self.edits
            .borrow_mut()
            .pop_front()
            .expect("unscripted editor call")
    }
}

type Reply = Box<dyn Fn() -> Result<String, GenerationError> + Send + Sync>;

/// Message source with a canned reply that counts its calls.
pub struct StubSource {
    reply: Reply,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn message(message: &str) -> Self {
        let message = message.to_string();
        Self {
            reply: Box::new(move || Ok(message.clone())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(make: impl Fn() -> GenerationError + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(move || Err(make())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSource for StubSource {
    async fn generate(
        &self,
        _diff: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)()
    }
}

/// Status of the first step named `name`.
pub fn step_status(steps: &[WorkflowStep], name: &str) -> Option<StepStatus> {
    steps.iter().find(|s| s.name == name).map(|s| s.status)
}
