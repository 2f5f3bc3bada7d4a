//! gitpilot - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use gitpilot::config::{PushPolicy, RunConfig};
use gitpilot::error::WorkflowError;
use gitpilot::gemini::{MessageGenerator, load_dotenv};
use gitpilot::git::{GitRepo, SystemRunner, ensure_git_available};
use gitpilot::logging;
use gitpilot::ui::{Interaction, TerminalUi, Theme};
use gitpilot::workflow::{Workflow, WorkflowOutcome};

/// Stage, describe, commit and push your changes with an AI-written commit message.
#[derive(Parser, Debug)]
#[command(name = "gitpilot")]
#[command(about = "Stage, commit and push with AI-generated commit messages")]
#[command(version)]
struct Cli {
    /// Accept the generated message without review
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Show what would happen without staging, committing or pushing
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Skip AI generation and type the commit message
    #[arg(short = 's', long)]
    skip_ai: bool,

    /// Switch to (or create) this branch before committing
    #[arg(short = 'b', long)]
    branch: Option<String>,

    /// Minimal output; implies accepting the generated message
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Also write a debug log to this file
    #[arg(short = 'l', long = "log")]
    log: Option<PathBuf>,

    /// UI theme
    #[arg(short = 't', long, value_enum, default_value_t = Theme::Hacker)]
    theme: Theme,

    /// Fail the run when the push fails
    #[arg(long)]
    strict_push: bool,
}

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        RunConfig {
            dry_run: cli.dry_run,
            skip_ai: cli.skip_ai,
            auto_accept: cli.yes,
            branch: cli.branch.filter(|b| !b.trim().is_empty()),
            quiet: cli.quiet,
            theme: cli.theme,
            log_file: cli.log,
            push_policy: if cli.strict_push {
                PushPolicy::Strict
            } else {
                PushPolicy::Lenient
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = RunConfig::from(Cli::parse());

    if let Err(e) = logging::init(config.log_file.as_deref(), config.quiet) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    load_dotenv();

    let ui = TerminalUi::new(config.theme, config.quiet);

    if let Err(e) = ensure_git_available() {
        ui.error(&e.to_string());
        return ExitCode::FAILURE;
    }

    // Prompts block the runtime thread, so the interrupt is handled on its own task.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt_theme = config.theme;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
            TerminalUi::new(interrupt_theme, false).warn("Operation cancelled by user");
            std::process::exit(1);
        }
    });

    ui.banner();
    tracing::info!(?config, "Starting gitpilot");

    let repo = GitRepo::new(SystemRunner::new());
    let generator = MessageGenerator::from_env();
    let mut workflow = Workflow::new(config, repo, generator, ui, cancel);

    match workflow.run().await {
        Ok(WorkflowOutcome::Completed | WorkflowOutcome::NoChanges | WorkflowOutcome::Cancelled) => {
            ExitCode::SUCCESS
        }
        Err(WorkflowError::Interrupted) => {
            workflow.ui().warn("Operation cancelled by user");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Workflow failed: {}", e);
            workflow.ui().error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
