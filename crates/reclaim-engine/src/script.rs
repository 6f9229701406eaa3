use std::path::{Path, PathBuf};

use reclaim_core::ScriptDirective;
use tracing::{info, warn};

use crate::command::{run_checked, run_logged, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::types::DirectiveStatus;

pub(crate) const CHMOD_PATH: &str = "/bin/chmod";

pub(crate) fn resolve_script_path(staged_path: &Path, executable: &str) -> PathBuf {
    let path = Path::new(executable);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        staged_path.join(path)
    }
}

pub(crate) fn run_uninstall_script<E>(
    executor: &mut E,
    staged_path: &Path,
    script: &ScriptDirective,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let path = resolve_script_path(staged_path, &script.executable);
    if !path.exists() {
        let err = UninstallError::ScriptMissing { path };
        if script.must_succeed {
            return Err(err);
        }
        warn!(error = %err, "skipping optional uninstall script");
        warnings.push(err.to_string());
        return Ok(DirectiveStatus::Absent);
    }

    let display_path = path.display().to_string();
    let chmod = run_checked(
        executor,
        Invocation::mutation([CHMOD_PATH, "--", "+x", display_path.as_str()]),
    );
    if let Err(err) = chmod {
        if script.must_succeed {
            return Err(err);
        }
        warn!(error = %err, "could not mark optional uninstall script executable");
        warnings.push(err.to_string());
    }

    info!(script = %display_path, "running uninstall script");
    let mut argv = vec![display_path.clone()];
    argv.extend(script.args.iter().cloned());
    let invocation = Invocation::mutation(argv).elevated();
    let output = run_logged(executor, &invocation)?;
    if !output.success() {
        let err = UninstallError::command_failed(&invocation, &output);
        if script.must_succeed {
            return Err(err);
        }
        warn!(error = %err, "optional uninstall script failed");
        warnings.push(err.to_string());
    }

    Ok(DirectiveStatus::Applied)
}
