use std::fmt;

use tracing::debug;

use crate::error::{ExecutionError, UninstallError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    Unprivileged,
    Elevated,
}

impl Privilege {
    pub const PROBE_ORDER: [Privilege; 2] = [Self::Unprivileged, Self::Elevated];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unprivileged => "unprivileged",
            Self::Elevated => "elevated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub privilege: Privilege,
    pub effect: Effect,
}

impl Invocation {
    pub fn query<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            privilege: Privilege::Unprivileged,
            effect: Effect::Query,
        }
    }

    pub fn mutation<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: Effect::Mutation,
            ..Self::query(argv)
        }
    }

    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn elevated(self) -> Self {
        self.with_privilege(Privilege::Elevated)
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.privilege == Privilege::Elevated {
            f.write_str("sudo ")?;
        }
        f.write_str(&self.argv.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    // Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

impl Default for CommandOutput {
    fn default() -> Self {
        Self::with_stdout("")
    }
}

impl CommandOutput {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: Some(0),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            status: Some(status),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

pub trait SystemCommand {
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError>;
}

impl<F> SystemCommand for F
where
    F: FnMut(&Invocation) -> Result<CommandOutput, ExecutionError>,
{
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        self(invocation)
    }
}

pub(crate) fn run_checked<E>(
    executor: &mut E,
    invocation: Invocation,
) -> Result<CommandOutput, UninstallError>
where
    E: SystemCommand + ?Sized,
{
    let output = run_logged(executor, &invocation)?;
    if output.success() {
        return Ok(output);
    }
    Err(UninstallError::command_failed(&invocation, &output))
}

pub(crate) fn run_logged<E>(
    executor: &mut E,
    invocation: &Invocation,
) -> Result<CommandOutput, ExecutionError>
where
    E: SystemCommand + ?Sized,
{
    debug!(command = %invocation, effect = ?invocation.effect, "running command");
    let output = executor.run(invocation)?;
    debug!(command = %invocation, status = ?output.status, "command finished");
    Ok(output)
}
