use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::command::{CommandOutput, Invocation};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to collect output of '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum UninstallError {
    #[error("command failed: {command} (exit status: {}){}", describe_status(.status), describe_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("could not remove {} path(s) owned by {target}: {}", .paths.len(), .paths.join(", "))]
    PartialRemoval { target: String, paths: Vec<String> },

    #[error("uninstall script does not exist: {}", .path.display())]
    ScriptMissing { path: PathBuf },
}

impl UninstallError {
    pub(crate) fn command_failed(invocation: &Invocation, output: &CommandOutput) -> Self {
        Self::CommandFailed {
            command: invocation.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {stderr}")
    }
}
