mod command;
mod dry_run;
mod error;
mod fs_utils;
mod host;
mod kext;
mod launchctl;
mod osascript;
mod pkgutil;
mod privilege;
mod process;
mod script;
mod types;
mod uninstall;

pub use command::{CommandOutput, Effect, Invocation, Privilege, SystemCommand};
pub use dry_run::DryRunExecutor;
pub use error::{ExecutionError, UninstallError};
pub use host::HostExecutor;
pub use privilege::{probe, ProbeOutcome};
pub use types::{
    DirectiveOutcome, DirectiveStatus, EngineOptions, TechniqueReport, UninstallContext,
    UninstallReport,
};
pub use uninstall::{uninstall, uninstall_with_progress, ArtifactPhases, UninstallArtifact};
