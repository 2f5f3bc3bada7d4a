//! Step records collected during a run and rendered in the summary.

use std::fmt;

/// Lifecycle state of a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Error => "error",
            StepStatus::Skipped => "skipped",
        }
    }

    /// Terminal marker, e.g. `[OK]`.
    pub fn marker(&self) -> &'static str {
        match self {
            StepStatus::Pending => "[...]",
            StepStatus::Running => "[*]",
            StepStatus::Success => "[OK]",
            StepStatus::Error => "[FAIL]",
            StepStatus::Skipped => "[SKIP]",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed phase of a run. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    pub name: String,
    pub status: StepStatus,
    pub details: String,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, status: StepStatus, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            details: details.into(),
        }
    }
}

/// Step names as shown to the operator.
pub mod names {
    pub const REPO_CHECK: &str = "Git Repo Check";
    pub const REPO_SETUP: &str = "Git Repo Setup";
    pub const BRANCH_SWITCH: &str = "Branch Switch";
    pub const STAGE: &str = "Stage Changes";
    pub const ANALYZE: &str = "Analyze Changes";
    pub const GENERATE: &str = "Generate Message";
    pub const COMMIT: &str = "Commit";
    pub const PUSH: &str = "Push";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(StepStatus::Success.marker(), "[OK]");
        assert_eq!(StepStatus::Error.marker(), "[FAIL]");
        assert_eq!(StepStatus::Skipped.marker(), "[SKIP]");
        assert_eq!(StepStatus::Skipped.to_string(), "skipped");
    }
}
