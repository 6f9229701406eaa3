use std::path::PathBuf;
use std::time::Duration;

use reclaim_core::Technique;

use crate::error::UninstallError;

pub(crate) const DEFAULT_RM_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    // When set, `quit` polls until the application is gone or this much time has passed.
    pub quit_wait: Option<Duration>,
    pub quit_poll_interval: Duration,
    pub rm_batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            quit_wait: None,
            quit_poll_interval: Duration::from_millis(500),
            rm_batch_size: DEFAULT_RM_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallContext {
    pub staged_path: PathBuf,
    pub home_dir: PathBuf,
    pub options: EngineOptions,
}

impl UninstallContext {
    pub fn new(staged_path: impl Into<PathBuf>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            staged_path: staged_path.into(),
            home_dir: home_dir.into(),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug)]
pub enum DirectiveStatus {
    Applied,
    Absent,
    Partial(Vec<UninstallError>),
    Failed(UninstallError),
    Skipped,
}

impl DirectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Absent => "absent",
            Self::Partial(_) => "partial",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Partial(_) | Self::Failed(_) | Self::Skipped)
    }
}

#[derive(Debug)]
pub struct DirectiveOutcome {
    pub technique: Technique,
    pub target: String,
    pub status: DirectiveStatus,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct TechniqueReport {
    pub technique: Technique,
    pub outcomes: Vec<DirectiveOutcome>,
}

impl TechniqueReport {
    pub fn aborted(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome.status, DirectiveStatus::Failed(_)))
    }
}

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub token: String,
    pub techniques: Vec<TechniqueReport>,
}

impl UninstallReport {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            techniques: Vec::new(),
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &DirectiveOutcome> {
        self.techniques
            .iter()
            .flat_map(|technique| technique.outcomes.iter())
    }

    pub fn problems(&self) -> impl Iterator<Item = &DirectiveOutcome> {
        self.outcomes().filter(|outcome| outcome.status.is_problem())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.outcomes()
            .flat_map(|outcome| outcome.warnings.iter().map(String::as_str))
    }

    pub fn is_clean(&self) -> bool {
        self.problems().next().is_none()
    }
}
