use tracing::debug;

use crate::command::{run_logged, CommandOutput, Invocation, Privilege, SystemCommand};
use crate::error::ExecutionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<T> {
    Found { privilege: Privilege, value: T },
    Inconclusive,
}

// Runs the probe built by `build` unprivileged, then elevated, and returns
// the first privilege level whose output `recognize` accepts. Non-zero exits
// count as unrecognized.
pub fn probe<E, T, B, R>(
    executor: &mut E,
    build: B,
    recognize: R,
) -> Result<ProbeOutcome<T>, ExecutionError>
where
    E: SystemCommand + ?Sized,
    B: Fn(Privilege) -> Invocation,
    R: Fn(&CommandOutput) -> Option<T>,
{
    for privilege in Privilege::PROBE_ORDER {
        let invocation = build(privilege);
        let output = run_logged(executor, &invocation)?;
        if !output.success() {
            debug!(command = %invocation, status = ?output.status, "probe exited unsuccessfully");
            continue;
        }
        if let Some(value) = recognize(&output) {
            return Ok(ProbeOutcome::Found { privilege, value });
        }
        debug!(command = %invocation, "probe output not recognized");
    }
    Ok(ProbeOutcome::Inconclusive)
}
