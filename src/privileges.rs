use nix::unistd::Uid;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Command not found: {program} ({source})")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// A single external command that needs superuser rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedCommand {
    program: String,
    args: Vec<OsString>,
}

impl PrivilegedCommand {
    pub fn new(program: impl Into<String>) -> Self {
        PrivilegedCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for PrivilegedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs commands with elevated rights, blocking until each one finishes.
pub trait PrivilegedExecutor {
    fn run(&self, command: &PrivilegedCommand) -> Result<(), ExecError>;
}

pub fn is_root() -> bool {
    Uid::effective().is_root()
}

/// Prefixes commands with the configured elevation helper (`sudo` by default).
/// Runs them directly when the helper is disabled or we already are root.
pub struct SudoExecutor {
    elevate: Option<String>,
}

impl SudoExecutor {
    pub fn new(elevate: Option<String>) -> Self {
        SudoExecutor { elevate }
    }

    pub fn from_config(config: &Config) -> Self {
        let elevate = if is_root() {
            None
        } else {
            config.elevate_command().map(str::to_string)
        };
        Self::new(elevate)
    }

    fn resolve(program: &str) -> Result<PathBuf, ExecError> {
        which::which(program).map_err(|source| ExecError::NotFound {
            program: program.to_string(),
            source,
        })
    }

    fn build(&self, command: &PrivilegedCommand) -> Result<Command, ExecError> {
        let program = Self::resolve(command.program())?;

        let mut cmd = match &self.elevate {
            Some(helper) => {
                let mut cmd = Command::new(Self::resolve(helper)?);
                cmd.arg(program);
                cmd
            }
            None => Command::new(program),
        };
        cmd.args(command.get_args());
        Ok(cmd)
    }
}

impl PrivilegedExecutor for SudoExecutor {
    fn run(&self, command: &PrivilegedCommand) -> Result<(), ExecError> {
        debug!("Running privileged command: {}", command);

        let output = self
            .build(command)?
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(ExecError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            warn!("stderr from `{}`: {}", command, stderr);
        }

        Ok(())
    }
}
