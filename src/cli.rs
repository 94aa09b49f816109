//! Command-line parsing.
//!
//! Positional arguments follow the `install-appimage [command] [target]` shape:
//! a known command word picks the operation, anything else is taken as the path
//! of a bundle to install.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use thiserror::Error;

use crate::install::InstallRequest;
use crate::list::ListOptions;
use crate::uninstall::UninstallRequest;

const EXAMPLES: &str = "\
Examples:
  install-appimage install /path/to/app.AppImage --icon https://example.com/icon.png
  install-appimage ls --details
  install-appimage remove app-name
  install-appimage --uninstall 'redis*'";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Please provide the path to the AppImage file.")]
    MissingAppImagePath,

    #[error("Please provide an AppImage name or pattern to uninstall.")]
    MissingPattern,
}

#[derive(Debug, Parser)]
#[command(
    name = "install-appimage",
    version,
    about = "Install, list and remove AppImage applications",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// install <path> | ls | list | remove <pattern> | uninstall <pattern> | <path>
    #[arg(value_name = "COMMAND")]
    pub positionals: Vec<String>,

    /// Icon URL to download for the installed AppImage
    #[arg(long, value_name = "URL")]
    pub icon: Option<String>,

    /// Extra command-line parameters added to the launcher's Exec line
    #[arg(long, value_name = "PARAMS", allow_hyphen_values = true)]
    pub params: Option<String>,

    /// Show desktop entry details when listing
    #[arg(long)]
    pub details: bool,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,

    /// List installed AppImages
    #[arg(long, visible_alias = "ls")]
    pub list: bool,

    /// Uninstall AppImages matching a name or wildcard pattern
    #[arg(long, visible_alias = "remove", value_name = "PATTERN")]
    pub uninstall: Option<String>,

    /// Do not ask for confirmation before uninstalling
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug)]
pub enum Command {
    Help,
    Install(InstallRequest),
    List(ListOptions),
    Uninstall {
        request: UninstallRequest,
        assume_yes: bool,
    },
}

impl Cli {
    pub fn print_help() -> std::io::Result<()> {
        Self::command().print_help()
    }

    pub fn into_command(self) -> Result<Command, UsageError> {
        let mut positionals = self.positionals.into_iter();
        let list = ListOptions {
            details: self.details,
            json: self.json,
        };

        let command = match positionals.next().as_deref() {
            Some("help") => Command::Help,
            Some("install") => {
                let source = positionals.next().ok_or(UsageError::MissingAppImagePath)?;
                Command::Install(InstallRequest {
                    source: PathBuf::from(source),
                    icon_url: self.icon,
                    params: self.params,
                })
            }
            Some("ls") | Some("list") => Command::List(list),
            Some("remove") | Some("uninstall") => {
                let pattern = non_blank(self.uninstall)
                    .or_else(|| non_blank(positionals.next()))
                    .ok_or(UsageError::MissingPattern)?;
                Command::Uninstall {
                    request: UninstallRequest { pattern },
                    assume_yes: self.yes,
                }
            }
            Some(path) => Command::Install(InstallRequest {
                source: PathBuf::from(path),
                icon_url: self.icon,
                params: self.params,
            }),
            None => match self.uninstall {
                Some(pattern) => Command::Uninstall {
                    request: UninstallRequest {
                        pattern: non_blank(Some(pattern)).ok_or(UsageError::MissingPattern)?,
                    },
                    assume_yes: self.yes,
                },
                None if self.list => Command::List(list),
                None => Command::Help,
            },
        };

        Ok(command)
    }
}

/// An empty pattern would match every installed app.
fn non_blank(pattern: Option<String>) -> Option<String> {
    pattern.filter(|p| !p.trim().is_empty())
}
