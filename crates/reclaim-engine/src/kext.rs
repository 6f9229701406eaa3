use tracing::{info, warn};

use crate::command::{run_checked, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::fs_utils::RM_PATH;
use crate::types::DirectiveStatus;

pub(crate) const KEXTSTAT_PATH: &str = "/usr/sbin/kextstat";
pub(crate) const KEXTUNLOAD_PATH: &str = "/sbin/kextunload";
pub(crate) const KEXTFIND_PATH: &str = "/usr/sbin/kextfind";

pub(crate) fn remove_kext<E>(
    executor: &mut E,
    kext_id: &str,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let status = run_checked(
        executor,
        Invocation::query([KEXTSTAT_PATH, "-l", "-b", kext_id]).elevated(),
    )?;
    let loaded = !status.stdout.trim().is_empty();

    if loaded {
        info!(kext_id, "unloading kernel extension");
        let unload = run_checked(
            executor,
            Invocation::mutation([KEXTUNLOAD_PATH, "-b", kext_id]).elevated(),
        );
        if let Err(err) = unload {
            warn!(kext_id, error = %err, "kernel extension unload failed");
            warnings.push(format!("failed to unload {kext_id}: {err}"));
        }
    }

    let located = run_checked(
        executor,
        Invocation::query([KEXTFIND_PATH, "-b", kext_id]).elevated(),
    )?
    .lines();
    if located.is_empty() {
        return Ok(if loaded {
            DirectiveStatus::Applied
        } else {
            DirectiveStatus::Absent
        });
    }

    let mut failed_paths = Vec::new();
    for path in &located {
        info!(kext_id, path = %path, "removing kernel extension bundle");
        let removal = run_checked(
            executor,
            Invocation::mutation([RM_PATH, "-rf", path.as_str()]).elevated(),
        );
        if let Err(err) = removal {
            warn!(kext_id, path = %path, error = %err, "kernel extension removal failed");
            failed_paths.push(path.clone());
        }
    }

    if failed_paths.is_empty() {
        Ok(DirectiveStatus::Applied)
    } else {
        Ok(DirectiveStatus::Partial(vec![UninstallError::PartialRemoval {
            target: kext_id.to_string(),
            paths: failed_paths,
        }]))
    }
}
