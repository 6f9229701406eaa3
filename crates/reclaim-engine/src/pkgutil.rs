use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::{run_checked, Invocation, Privilege, SystemCommand};
use crate::error::UninstallError;
use crate::fs_utils::remove_files;
use crate::privilege::{probe, ProbeOutcome};
use crate::types::DirectiveStatus;

pub(crate) const PKGUTIL_PATH: &str = "/usr/sbin/pkgutil";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ReceiptInfo {
    pub(crate) install_location: String,
    pub(crate) volume: String,
}

impl ReceiptInfo {
    // `volume + install_location + relative`, joined as path segments.
    pub(crate) fn resolve(&self, relative: &str) -> PathBuf {
        let mut path = PathBuf::from(if self.volume.is_empty() {
            "/"
        } else {
            self.volume.as_str()
        });
        for segment in [self.install_location.as_str(), relative] {
            let trimmed = segment.trim_start_matches('/');
            if !trimmed.is_empty() {
                path.push(trimmed);
            }
        }
        path
    }
}

pub(crate) fn remove_receipts_matching<E>(
    executor: &mut E,
    pattern: &str,
    batch_size: usize,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let outcome = probe(
        executor,
        |privilege| {
            Invocation::query([PKGUTIL_PATH.to_string(), format!("--pkgs={pattern}")])
                .with_privilege(privilege)
        },
        |output| {
            let ids = output.lines();
            (!ids.is_empty()).then_some(ids)
        },
    )?;

    let ProbeOutcome::Found {
        privilege,
        value: package_ids,
    } = outcome
    else {
        info!(pattern, "no installer receipts match");
        return Ok(DirectiveStatus::Absent);
    };

    let mut failures = Vec::new();
    for package_id in &package_ids {
        if let Err(err) = remove_receipt(executor, package_id, privilege, batch_size) {
            warn!(package_id = %package_id, error = %err, "failed to remove installer receipt");
            failures.push(err);
        }
    }

    if failures.is_empty() {
        Ok(DirectiveStatus::Applied)
    } else {
        Ok(DirectiveStatus::Partial(failures))
    }
}

fn remove_receipt<E>(
    executor: &mut E,
    package_id: &str,
    privilege: Privilege,
    batch_size: usize,
) -> Result<(), UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let files = run_checked(
        executor,
        Invocation::query([PKGUTIL_PATH, "--only-files", "--files", package_id])
            .with_privilege(privilege),
    )?
    .lines();
    let dirs = run_checked(
        executor,
        Invocation::query([PKGUTIL_PATH, "--only-dirs", "--files", package_id])
            .with_privilege(privilege),
    )?
    .lines();
    // Directories may be shared with other packages; they are left for rmdir/delete.
    debug!(package_id, dirs = dirs.len(), "receipt owns directories");

    let plist = run_checked(
        executor,
        Invocation::query([PKGUTIL_PATH, "--pkg-info-plist", package_id]).with_privilege(privilege),
    )?;
    let info = parse_receipt_info(&plist.stdout);
    let owned_files = files
        .iter()
        .map(|relative| info.resolve(relative))
        .collect::<Vec<_>>();

    info!(package_id, files = owned_files.len(), "forgetting installer receipt");
    run_checked(
        executor,
        Invocation::mutation([PKGUTIL_PATH, "--forget", package_id]).elevated(),
    )?;

    if owned_files.is_empty() {
        return Ok(());
    }

    if let Err(err) = remove_files(executor, &owned_files, batch_size) {
        let remaining = remaining_paths(&owned_files);
        if remaining.is_empty() {
            warn!(
                package_id,
                error = %err,
                "file removal reported failure but no owned files remain"
            );
            return Ok(());
        }
        return Err(UninstallError::PartialRemoval {
            target: package_id.to_string(),
            paths: remaining,
        });
    }
    Ok(())
}

// Stats as the invoking user, so files under root-only directories are not
// reported as remaining even when the elevated rm left them behind.
fn remaining_paths(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter(|path| path_exists(path))
        .map(|path| path.display().to_string())
        .collect()
}

fn path_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

pub(crate) fn parse_receipt_info(plist: &str) -> ReceiptInfo {
    ReceiptInfo {
        install_location: plist_string_value(plist, "install-location").unwrap_or_default(),
        volume: plist_string_value(plist, "volume").unwrap_or_default(),
    }
}

fn plist_string_value(plist: &str, key: &str) -> Option<String> {
    let marker = format!("<key>{key}</key>");
    let start = plist.find(&marker)? + marker.len();
    let rest = plist[start..].trim_start();
    if rest.starts_with("<string/>") {
        return Some(String::new());
    }
    let rest = rest.strip_prefix("<string>")?;
    let end = rest.find("</string>")?;
    Some(unescape_xml(&rest[..end]))
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
