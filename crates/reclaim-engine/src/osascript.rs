use tracing::info;

use crate::command::{run_checked, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::types::DirectiveStatus;

pub(crate) const OSASCRIPT_PATH: &str = "/usr/bin/osascript";

pub(crate) fn osascript_argv(script: String) -> [String; 3] {
    [OSASCRIPT_PATH.to_string(), "-e".to_string(), script]
}

pub(crate) fn count_processes_script(bundle_id: &str) -> String {
    format!(
        "tell application \"System Events\" to count processes whose bundle identifier is {}",
        applescript_string(bundle_id)
    )
}

pub(crate) fn quit_application_script(bundle_id: &str) -> String {
    format!(
        "tell application id {} to quit",
        applescript_string(bundle_id)
    )
}

pub(crate) fn unix_ids_script(bundle_id: &str) -> String {
    format!(
        "tell application \"System Events\" to get the unix id of every process whose bundle identifier is {}",
        applescript_string(bundle_id)
    )
}

pub(crate) fn delete_login_item_script(name: &str) -> String {
    format!(
        "tell application \"System Events\" to delete every login item whose name is {}",
        applescript_string(name)
    )
}

pub(crate) fn applescript_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

// Login items belong to the user session, so this never elevates.
pub(crate) fn remove_login_item<E>(
    executor: &mut E,
    name: &str,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    info!(name, "removing login item");
    run_checked(
        executor,
        Invocation::mutation(osascript_argv(delete_login_item_script(name))),
    )?;
    Ok(DirectiveStatus::Applied)
}
