use tracing::info;

use crate::command::{run_checked, CommandOutput, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::privilege::{probe, ProbeOutcome};
use crate::types::DirectiveStatus;

pub(crate) const LAUNCHCTL_PATH: &str = "/bin/launchctl";

pub(crate) fn remove_launchctl_service<E>(
    executor: &mut E,
    label: &str,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let outcome = probe(
        executor,
        |privilege| Invocation::query([LAUNCHCTL_PATH, "list", label]).with_privilege(privilege),
        recognize_service_status,
    )?;

    let ProbeOutcome::Found { privilege, .. } = outcome else {
        info!(label, "launchd service not loaded");
        return Ok(DirectiveStatus::Absent);
    };

    info!(label, privilege = privilege.as_str(), "removing launchd service");
    run_checked(
        executor,
        Invocation::mutation([LAUNCHCTL_PATH, "remove", label]).with_privilege(privilege),
    )?;
    Ok(DirectiveStatus::Applied)
}

fn recognize_service_status(output: &CommandOutput) -> Option<()> {
    output.stdout.trim_start().starts_with('{').then_some(())
}
