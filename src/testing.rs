//! Test doubles for the privileged executor and the confirmation prompt.

use std::cell::{Cell, RefCell};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};

use crate::privileges::{ExecError, PrivilegedCommand, PrivilegedExecutor};
use crate::prompt::{Confirm, PromptError};

/// Applies the handful of commands the operations issue directly to the local
/// filesystem and records every command it sees.
#[derive(Default)]
pub struct FsExecutor {
    calls: RefCell<Vec<String>>,
    fail_on: Vec<String>,
}

impl FsExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any command whose rendered form contains `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn apply(&self, program: &str, args: &[PathBuf]) -> io::Result<()> {
        match (program, args) {
            ("mkdir", [flag, dir]) if flag.as_os_str() == "-p" => fs::create_dir_all(dir),
            ("mv", [src, dest]) => fs::rename(src, dest).or_else(|_| {
                fs::copy(src, dest)?;
                fs::remove_file(src)
            }),
            ("chmod", [mode, path]) if mode.as_os_str() == "+x" => {
                let mut perms = fs::metadata(path)?.permissions();
                perms.set_mode(perms.mode() | 0o111);
                fs::set_permissions(path, perms)
            }
            ("ln", [flag, target, link]) if flag.as_os_str() == "-sf" => {
                if fs::symlink_metadata(link).is_ok() {
                    fs::remove_file(link)?;
                }
                symlink(target, link)
            }
            ("rm", [flag, path]) if flag.as_os_str() == "-rf" => match fs::remove_dir_all(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
            ("rm", [flag, path]) if flag.as_os_str() == "-f" => match fs::remove_file(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
            ("curl", [.., flag, dest, _url]) if flag.as_os_str() == "-o" => {
                fs::write(dest, b"\x89PNG fake icon")
            }
            ("update-desktop-database", [_]) => Ok(()),
            _ => Err(io::Error::other(format!(
                "unsupported command in test executor: {} {:?}",
                program, args
            ))),
        }
    }
}

impl PrivilegedExecutor for FsExecutor {
    fn run(&self, command: &PrivilegedCommand) -> Result<(), ExecError> {
        let rendered = command.to_string();
        self.calls.borrow_mut().push(rendered.clone());

        if self.fail_on.iter().any(|needle| rendered.contains(needle)) {
            return Err(ExecError::Failed {
                command: rendered,
                code: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }

        let args: Vec<PathBuf> = command
            .get_args()
            .iter()
            .map(|a: &OsString| PathBuf::from(a))
            .collect();

        self.apply(command.program(), &args)
            .map_err(|e| ExecError::Failed {
                command: rendered,
                code: Some(1),
                stderr: e.to_string(),
            })
    }
}

/// Answers confirmation prompts with a fixed reply and counts how often it was asked.
pub struct ScriptedConfirm {
    answer: String,
    asked: Cell<usize>,
}

impl ScriptedConfirm {
    pub fn answering(answer: &str) -> Self {
        ScriptedConfirm {
            answer: answer.to_string(),
            asked: Cell::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.get()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool, PromptError> {
        self.asked.set(self.asked.get() + 1);
        Ok(crate::prompt::is_affirmative(&self.answer))
    }
}

pub fn output_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

pub fn assert_exists(path: &Path) {
    assert!(
        fs::symlink_metadata(path).is_ok(),
        "expected {} to exist",
        path.display()
    );
}

pub fn assert_missing(path: &Path) {
    assert!(
        fs::symlink_metadata(path).is_err(),
        "expected {} to be absent",
        path.display()
    );
}
