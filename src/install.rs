use std::fs::Permissions;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::Commands;
use crate::desktop_entry::DesktopEntry;
use crate::layout::InstallLayout;
use crate::privileges::{ExecError, PrivilegedCommand, PrivilegedExecutor};

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("The file \"{0}\" does not exist.")]
    SourceNotFound(PathBuf),

    #[error("\"{0}\" is not a regular file.")]
    NotAFile(PathBuf),

    #[error("Cannot derive an application name from {0}")]
    InvalidName(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Command(#[from] ExecError),
}

#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub source: PathBuf,
    pub icon_url: Option<String>,
    pub params: Option<String>,
}

#[derive(Debug)]
pub struct InstalledReport {
    pub name: String,
    pub appimage_path: PathBuf,
    pub icon_path: Option<PathBuf>,
    pub desktop_entry: PathBuf,
    pub user_link: PathBuf,
}

/// Base filename with a trailing `.AppImage` (any case) removed; other files lose
/// their last extension.
pub fn app_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;

    let suffix = ".appimage";
    let name = if file_name.len() >= suffix.len()
        && file_name.is_char_boundary(file_name.len() - suffix.len())
        && file_name[file_name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        &file_name[..file_name.len() - suffix.len()]
    } else {
        path.file_stem()?.to_str()?
    };

    let name = name.trim();
    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}

pub struct Installer<'a, E: PrivilegedExecutor> {
    layout: &'a InstallLayout,
    executor: &'a E,
    commands: &'a Commands,
}

impl<'a, E: PrivilegedExecutor> Installer<'a, E> {
    pub fn new(layout: &'a InstallLayout, executor: &'a E, commands: &'a Commands) -> Self {
        Installer {
            layout,
            executor,
            commands,
        }
    }

    #[instrument(skip(self, request), fields(source = %request.source.display()))]
    pub fn install(&self, request: &InstallRequest) -> Result<InstalledReport, InstallError> {
        let source = std::path::absolute(&request.source)?;

        if !source.exists() {
            return Err(InstallError::SourceNotFound(source));
        }
        if !source.is_file() {
            return Err(InstallError::NotAFile(source));
        }

        let name = app_name(&source).ok_or_else(|| InstallError::InvalidName(source.clone()))?;
        debug!("Installing {:?} as {}", source, name);

        let app_dir = self.layout.app_dir(&name);
        self.mkdir(&self.layout.appimage_root)?;
        self.mkdir(&app_dir)?;

        let appimage_path = self.layout.appimage_path(&name);
        self.run(PrivilegedCommand::new("mv").arg(&source).arg(&appimage_path))?;
        self.run(PrivilegedCommand::new("chmod").arg("+x").arg(&appimage_path))?;
        info!("Placed bundle at {:?}", appimage_path);

        let icon_path = match &request.icon_url {
            Some(url) => self.fetch_icon(&name, url),
            None => None,
        };

        let entry = DesktopEntry::new(name.clone(), appimage_path.clone())
            .with_params(request.params.clone())
            .with_icon(icon_path.clone());

        let desktop_entry = self.write_desktop_entry(&name, &entry)?;

        self.mkdir(&self.layout.user_applications_dir)?;
        let user_link = self.layout.user_link_path(&name);
        self.run(
            PrivilegedCommand::new("ln")
                .arg("-sf")
                .arg(&desktop_entry)
                .arg(&user_link),
        )?;

        self.run(
            PrivilegedCommand::new(&self.commands.refresh_database).arg(&self.layout.applications_dir),
        )?;

        info!("Installed {}", name);
        Ok(InstalledReport {
            name,
            appimage_path,
            icon_path,
            desktop_entry,
            user_link,
        })
    }

    fn run(&self, command: PrivilegedCommand) -> Result<(), InstallError> {
        self.executor.run(&command)?;
        Ok(())
    }

    fn mkdir(&self, dir: &Path) -> Result<(), InstallError> {
        self.run(PrivilegedCommand::new("mkdir").arg("-p").arg(dir))
    }

    /// Downloads the icon next to the bundle. A failed download leaves the
    /// application without an icon rather than aborting the install.
    fn fetch_icon(&self, name: &str, url: &str) -> Option<PathBuf> {
        let icon_path = self.layout.icon_path(name);
        let download = PrivilegedCommand::new(&self.commands.download)
            .arg("-fsSL")
            .arg("-o")
            .arg(&icon_path)
            .arg(url);

        match self.executor.run(&download) {
            Ok(()) => {
                info!("Downloaded icon for {} from {}", name, url);
                Some(icon_path)
            }
            Err(e) => {
                warn!("Icon download failed for {}, continuing without icon: {}", name, e);
                let cleanup = PrivilegedCommand::new("rm").arg("-f").arg(&icon_path);
                if let Err(e) = self.executor.run(&cleanup) {
                    debug!("Could not remove partial icon {:?}: {}", icon_path, e);
                }
                None
            }
        }
    }

    /// Writes the entry to a temp file first so the final path never holds a
    /// partially written file.
    fn write_desktop_entry(&self, name: &str, entry: &DesktopEntry) -> Result<PathBuf, InstallError> {
        let mut temp = tempfile::Builder::new()
            .prefix(&format!("{}-", name))
            .suffix(".desktop")
            .tempfile()?;
        temp.write_all(entry.to_file_content().as_bytes())?;
        temp.flush()?;
        // Staged files start out 0600; the system entry must stay world-readable.
        temp.as_file().set_permissions(Permissions::from_mode(0o644))?;

        let temp_path = temp.into_temp_path();
        let desktop_entry = self.layout.desktop_entry_path(name);

        debug!("Moving desktop entry {:?} -> {:?}", temp_path, desktop_entry);
        self.run(PrivilegedCommand::new("mv").arg(temp_path.as_os_str()).arg(&desktop_entry))?;
        self.run(PrivilegedCommand::new("chmod").arg("+x").arg(&desktop_entry))?;

        Ok(desktop_entry)
    }
}

pub fn run_install<E: PrivilegedExecutor>(
    layout: &InstallLayout,
    executor: &E,
    commands: &Commands,
    request: &InstallRequest,
    out: &mut impl Write,
) -> Result<InstalledReport, InstallError> {
    let report = Installer::new(layout, executor, commands).install(request)?;

    writeln!(out, "✅ {} has been installed successfully!", report.name)?;
    writeln!(out, "Desktop entry created at: {}", report.desktop_entry.display())?;
    writeln!(out, "Symlink created at: {}", report.user_link.display())?;
    if request.icon_url.is_some() && report.icon_path.is_none() {
        writeln!(out, "⚠️  Icon could not be downloaded; installed without an icon.")?;
    }

    Ok(report)
}
