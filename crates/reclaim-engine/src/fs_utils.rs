use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::{run_checked, run_logged, Invocation, SystemCommand};
use crate::error::UninstallError;
use crate::types::DirectiveStatus;

pub(crate) const RM_PATH: &str = "/bin/rm";
pub(crate) const RMDIR_PATH: &str = "/bin/rmdir";
pub(crate) const DS_STORE: &str = ".DS_Store";

const UNDELETABLE_SYSTEM_PATHS: &[&str] = &[
    "/",
    "/Applications",
    "/Applications/Utilities",
    "/Library",
    "/Library/Application Support",
    "/Library/Caches",
    "/Library/Extensions",
    "/Library/Frameworks",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Library/Preferences",
    "/Library/PrivilegedHelperTools",
    "/Library/Receipts",
    "/System",
    "/Users",
    "/Volumes",
    "/bin",
    "/cores",
    "/etc",
    "/opt",
    "/private",
    "/private/etc",
    "/private/tmp",
    "/private/var",
    "/sbin",
    "/tmp",
    "/usr",
    "/usr/bin",
    "/usr/lib",
    "/usr/libexec",
    "/usr/local",
    "/usr/local/bin",
    "/usr/sbin",
    "/usr/share",
    "/var",
];

const UNDELETABLE_HOME_PATHS: &[&str] = &[
    "",
    "Applications",
    "Desktop",
    "Documents",
    "Downloads",
    "Library",
    "Library/Application Support",
    "Library/Caches",
    "Library/Containers",
    "Library/Group Containers",
    "Library/LaunchAgents",
    "Library/Logs",
    "Library/Preferences",
    "Movies",
    "Music",
    "Pictures",
    "Public",
];

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PreparedPaths {
    pub(crate) paths: Vec<PathBuf>,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn prepare_paths(raw_paths: &[String], home: &Path) -> PreparedPaths {
    let mut prepared = PreparedPaths::default();

    for raw in raw_paths {
        let expanded = expand_home(raw, home);
        if !expanded.is_absolute() {
            skip_path(&mut prepared, raw, "relative path");
            continue;
        }
        if expanded
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            skip_path(&mut prepared, raw, "path traversal");
            continue;
        }

        for candidate in expand_glob(&expanded, &mut prepared.warnings) {
            if is_undeletable(&candidate, home) {
                skip_path(&mut prepared, &candidate.display().to_string(), "undeletable path");
                continue;
            }
            prepared.paths.push(candidate);
        }
    }

    prepared
}

pub(crate) fn expand_home(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

fn expand_glob(path: &Path, warnings: &mut Vec<String>) -> Vec<PathBuf> {
    let pattern = path.display().to_string();
    if !pattern.contains(['*', '?', '[']) {
        return vec![path.to_path_buf()];
    }

    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(err) => {
            warnings.push(format!("skipping invalid glob pattern {pattern}: {err}"));
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(matched) => matches.push(matched),
            Err(err) => warnings.push(format!("skipping unreadable glob match: {err}")),
        }
    }
    if matches.is_empty() {
        debug!(pattern = %pattern, "glob matched nothing");
    }
    matches
}

fn is_undeletable(path: &Path, home: &Path) -> bool {
    UNDELETABLE_SYSTEM_PATHS
        .iter()
        .any(|system| path == Path::new(system))
        || UNDELETABLE_HOME_PATHS
            .iter()
            .any(|relative| path == expand_home(&format!("~/{relative}"), home))
}

fn skip_path(prepared: &mut PreparedPaths, path: &str, reason: &str) {
    warn!(path = %path, reason, "skipping removal");
    prepared
        .warnings
        .push(format!("skipped removal of {path}: {reason}"));
}

pub(crate) fn remove_recursive<E>(
    executor: &mut E,
    paths: &[PathBuf],
    batch_size: usize,
) -> Result<(), UninstallError>
where
    E: SystemCommand + ?Sized,
{
    remove_in_batches(executor, "-rf", paths, batch_size)
}

pub(crate) fn remove_files<E>(
    executor: &mut E,
    paths: &[PathBuf],
    batch_size: usize,
) -> Result<(), UninstallError>
where
    E: SystemCommand + ?Sized,
{
    remove_in_batches(executor, "-f", paths, batch_size)
}

fn remove_in_batches<E>(
    executor: &mut E,
    flags: &str,
    paths: &[PathBuf],
    batch_size: usize,
) -> Result<(), UninstallError>
where
    E: SystemCommand + ?Sized,
{
    for batch in paths.chunks(batch_size.max(1)) {
        let mut argv = vec![RM_PATH.to_string(), flags.to_string(), "--".to_string()];
        argv.extend(batch.iter().map(|path| path.display().to_string()));
        run_checked(executor, Invocation::mutation(argv).elevated())?;
    }
    Ok(())
}

pub(crate) fn delete_paths<E>(
    executor: &mut E,
    raw_paths: &[String],
    home: &Path,
    batch_size: usize,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let prepared = prepare_paths(raw_paths, home);
    warnings.extend(prepared.warnings);
    if prepared.paths.is_empty() {
        return Ok(DirectiveStatus::Absent);
    }

    // Stats as the invoking user: a path under a directory only root can
    // traverse reads as missing, so the outcome may say absent even though
    // the elevated rm removed it.
    let existed = prepared
        .paths
        .iter()
        .any(|path| path.symlink_metadata().is_ok());

    info!(count = prepared.paths.len(), "removing paths");
    remove_recursive(executor, &prepared.paths, batch_size)?;
    Ok(if existed {
        DirectiveStatus::Applied
    } else {
        DirectiveStatus::Absent
    })
}

pub(crate) fn remove_empty_directories<E>(
    executor: &mut E,
    raw_paths: &[String],
    home: &Path,
    warnings: &mut Vec<String>,
) -> Result<DirectiveStatus, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let prepared = prepare_paths(raw_paths, home);
    warnings.extend(prepared.warnings);

    let mut attempted = false;
    for dir in &prepared.paths {
        if !dir.is_dir() {
            debug!(path = %dir.display(), "directory not present");
            continue;
        }
        attempted = true;

        let metadata_file = dir.join(DS_STORE);
        run_checked(
            executor,
            Invocation::mutation([
                RM_PATH.to_string(),
                "-f".to_string(),
                "--".to_string(),
                metadata_file.display().to_string(),
            ])
            .elevated(),
        )?;

        let rmdir = Invocation::mutation([
            RMDIR_PATH.to_string(),
            "--".to_string(),
            dir.display().to_string(),
        ])
        .elevated();
        let output = run_logged(executor, &rmdir)?;
        if output.success() {
            info!(path = %dir.display(), "removed directory");
        } else {
            warn!(path = %dir.display(), "directory left in place, probably not empty");
            warnings.push(format!("directory not removed (not empty?): {}", dir.display()));
        }
    }

    Ok(if attempted {
        DirectiveStatus::Applied
    } else {
        DirectiveStatus::Absent
    })
}
