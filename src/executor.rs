use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::CommandError;

/// A program plus its argument vector. Arguments are handed to the OS as-is,
/// never re-parsed by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Index of the credentials argument, hidden when displayed.
    secret: Option<usize>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends the argument that must not show up in logs.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret = Some(self.args.len());
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret == Some(i) {
                write!(f, " ***")?;
            } else {
                write!(f, " {:?}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of a finished process. A non-zero `exit_code` is an ordinary result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for ExecutionResult {
    /// `<code>: <stdout>\r\n<stderr>`, with the separator only present when
    /// stdout is non-empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.stdout.is_empty() { "" } else { "\r\n" };
        write!(
            f,
            "{}: {}{}{}",
            self.exit_code, self.stdout, separator, self.stderr
        )
    }
}

/// Runs a command line to completion.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<ExecutionResult, CommandError>;
}

/// Spawns real child processes, bounded by a timeout.
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Runner for ProcessExecutor {
    async fn run(&self, command: &CommandLine) -> Result<ExecutionResult, CommandError> {
        info!("Executing: {}", command);

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        // Dropping the child on timeout kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Wait {
                program: command.program.clone(),
                source,
            })?,
            Err(_) => {
                error!(
                    timeout = ?self.timeout,
                    "Command timed out, killing: {}", command
                );
                return Err(CommandError::Timeout {
                    program: command.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let result = ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            command.program,
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}
