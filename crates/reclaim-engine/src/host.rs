use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::{CommandOutput, Invocation, Privilege, SystemCommand};
use crate::error::ExecutionError;

const SUDO_PATH: &str = "/usr/bin/sudo";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostExecutor {
    sudo_program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for HostExecutor {
    fn default() -> Self {
        Self {
            sudo_program: PathBuf::from(SUDO_PATH),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl HostExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sudo_program(mut self, sudo_program: impl Into<PathBuf>) -> Self {
        self.sudo_program = sudo_program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_command(&self, invocation: &Invocation) -> Command {
        let mut command = match invocation.privilege {
            Privilege::Unprivileged => {
                let mut command = Command::new(invocation.program());
                command.args(invocation.args());
                command
            }
            Privilege::Elevated => {
                let mut command = Command::new(&self.sudo_program);
                command.arg("-E").arg("--").args(&invocation.argv);
                command
            }
        };
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl SystemCommand for HostExecutor {
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        let program = invocation.program().to_string();
        let mut child = self
            .build_command(invocation)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = wait_with_timeout(&mut child, self.timeout, &program)?;
        let stdout = join_reader(stdout_reader, &program)?;
        let stderr = join_reader(stderr_reader, &program)?;

        Ok(CommandOutput {
            stdout,
            stderr,
            status: status.code(),
        })
    }
}

fn spawn_reader<R>(mut stream: R) -> thread::JoinHandle<std::io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn join_reader(
    reader: Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    program: &str,
) -> Result<String, ExecutionError> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("output reader panicked")))
        .map_err(|source| ExecutionError::Io {
            program: program.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    program: &str,
) -> Result<ExitStatus, ExecutionError> {
    let io_error = |source| ExecutionError::Io {
        program: program.to_string(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait().map_err(io_error);
    };

    let started_at = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(io_error)? {
            return Ok(status);
        }
        if started_at.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecutionError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}
