use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, ConfigError};

/// Where installed AppImages and their desktop entries live.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    pub appimage_root: PathBuf,
    pub applications_dir: PathBuf,
    pub user_applications_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(
        appimage_root: PathBuf,
        applications_dir: PathBuf,
        user_applications_dir: PathBuf,
    ) -> Self {
        InstallLayout {
            appimage_root,
            applications_dir,
            user_applications_dir,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.appimage_root(),
            config.applications_dir(),
            config.user_applications_dir()?,
        ))
    }

    pub fn app_dir(&self, name: &str) -> PathBuf {
        self.appimage_root.join(name)
    }

    pub fn appimage_path(&self, name: &str) -> PathBuf {
        self.app_dir(name).join(format!("{}.AppImage", name))
    }

    pub fn icon_path(&self, name: &str) -> PathBuf {
        self.app_dir(name).join(format!("{}.png", name))
    }

    pub fn desktop_entry_path(&self, name: &str) -> PathBuf {
        self.applications_dir.join(format!("{}.desktop", name))
    }

    pub fn user_link_path(&self, name: &str) -> PathBuf {
        self.user_applications_dir.join(format!("{}.desktop", name))
    }

    /// Names of installed AppImages: every directory directly under the root,
    /// sorted by name. A missing root means nothing is installed.
    pub fn installed_names(&self) -> Result<Vec<String>, walkdir::Error> {
        installed_names(&self.appimage_root)
    }
}

fn installed_names(root: &Path) -> Result<Vec<String>, walkdir::Error> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}
