use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "INSTALL_APPIMAGE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "/etc/install-appimage/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Cannot determine the home directory for the user applications directory")]
    HomeDirNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directories {
    #[serde(default = "default_appimage_root")]
    pub appimage_root: String,

    #[serde(default = "default_applications_dir")]
    pub applications: String,

    /// Falls back to `$HOME/.local/share/applications` when unset.
    #[serde(default)]
    pub user_applications: Option<String>,
}

impl Default for Directories {
    fn default() -> Self {
        Directories {
            appimage_root: default_appimage_root(),
            applications: default_applications_dir(),
            user_applications: None,
        }
    }
}

/// External programs the operations shell out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commands {
    /// Elevation helper prepended to every privileged command. Empty disables it.
    #[serde(default = "default_elevate")]
    pub elevate: String,

    #[serde(default = "default_download")]
    pub download: String,

    #[serde(default = "default_refresh_database")]
    pub refresh_database: String,
}

impl Default for Commands {
    fn default() -> Self {
        Commands {
            elevate: default_elevate(),
            download: default_download(),
            refresh_database: default_refresh_database(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_output: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_log_level(),
            json_output: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directories: Directories,

    #[serde(default)]
    pub commands: Commands,

    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn appimage_root(&self) -> PathBuf {
        PathBuf::from(&self.directories.appimage_root)
    }

    pub fn applications_dir(&self) -> PathBuf {
        PathBuf::from(&self.directories.applications)
    }

    pub fn user_applications_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.directories.user_applications {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => dirs::home_dir()
                .map(|home| home.join(".local/share/applications"))
                .ok_or(ConfigError::HomeDirNotFound),
        }
    }

    pub fn elevate_command(&self) -> Option<&str> {
        let elevate = self.commands.elevate.trim();
        (!elevate.is_empty()).then_some(elevate)
    }

    pub fn download_command(&self) -> &str {
        &self.commands.download
    }

    pub fn refresh_database_command(&self) -> &str {
        &self.commands.refresh_database
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn json_output(&self) -> bool {
        self.logging.json_output
    }

    /// Applies `INSTALL_APPIMAGE_*` and `RUST_LOG` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("INSTALL_APPIMAGE_ROOT") {
            self.directories.appimage_root = val;
        }
        if let Some(val) = lookup("INSTALL_APPIMAGE_APPLICATIONS_DIR") {
            self.directories.applications = val;
        }
        if let Some(val) = lookup("INSTALL_APPIMAGE_USER_APPLICATIONS_DIR") {
            self.directories.user_applications = Some(val);
        }
        if let Some(val) = lookup("INSTALL_APPIMAGE_ELEVATE") {
            self.commands.elevate = val;
        }
        if let Some(val) = lookup("INSTALL_APPIMAGE_DOWNLOADER") {
            self.commands.download = val;
        }
        if let Some(val) = lookup("INSTALL_APPIMAGE_REFRESH_DATABASE") {
            self.commands.refresh_database = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.level = val;
        }
    }
}

fn default_appimage_root() -> String {
    "/usr/share/AppImages".to_string()
}

fn default_applications_dir() -> String {
    "/usr/share/applications".to_string()
}

fn default_elevate() -> String {
    "sudo".to_string()
}

fn default_download() -> String {
    "curl".to_string()
}

fn default_refresh_database() -> String {
    "update-desktop-database".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}
