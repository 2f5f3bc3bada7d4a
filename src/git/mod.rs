//! Git integration: subprocess runner, repository adapter, remote helpers.

pub mod remote;
pub mod repo;
pub mod runner;

pub use remote::normalize_remote_url;
pub use repo::{DEFAULT_REMOTE, GitRepo, InitOutcome, PushOutcome};
pub use runner::{CommandResult, CommandRunner, SystemRunner, ensure_git_available};
