//! Color palettes for terminal output.

use clap::ValueEnum;
use dialoguer::console::Style;

use crate::workflow::StepStatus;

/// UI theme selected with `--theme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Theme {
    #[default]
    Hacker,
    Minimal,
    Developer,
}

/// Styles for each role in the output.
#[derive(Debug, Clone)]
pub struct Palette {
    pub primary: Style,
    pub secondary: Style,
    pub accent: Style,
    pub error: Style,
    pub success: Style,
    pub warning: Style,
    pub info: Style,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Hacker => Palette {
                primary: Style::new().green().bright(),
                secondary: Style::new().cyan(),
                accent: Style::new().yellow().bright(),
                error: Style::new().red().bright(),
                success: Style::new().green().bright(),
                warning: Style::new().yellow().bright(),
                info: Style::new().cyan(),
            },
            Theme::Minimal => Palette {
                primary: Style::new().white(),
                secondary: Style::new().white().bright(),
                accent: Style::new().blue(),
                error: Style::new().red(),
                success: Style::new().green(),
                warning: Style::new().yellow(),
                info: Style::new().blue().bright(),
            },
            Theme::Developer => Palette {
                primary: Style::new().cyan().bright(),
                secondary: Style::new().white(),
                accent: Style::new().magenta().bright(),
                error: Style::new().red().bright(),
                success: Style::new().green().bright(),
                warning: Style::new().yellow().bright(),
                info: Style::new().blue().bright(),
            },
        }
    }
}

impl Palette {
    /// Style used for a step status.
    pub fn for_status(&self, status: StepStatus) -> &Style {
        match status {
            StepStatus::Success => &self.success,
            StepStatus::Error => &self.error,
            StepStatus::Skipped => &self.warning,
            StepStatus::Running | StepStatus::Pending => &self.info,
        }
    }
}
