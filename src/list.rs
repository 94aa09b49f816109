use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::desktop_entry::read_launch_fields;
use crate::layout::InstallLayout;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Failed to read {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub details: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledApp {
    pub name: String,
    pub appimage_path: PathBuf,
    pub desktop_entry: PathBuf,
    pub exec: Option<String>,
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

impl InstalledApp {
    /// Reads back the generated desktop entry. An unreadable entry is recorded
    /// on the record instead of failing.
    pub fn inspect(layout: &InstallLayout, name: &str) -> Self {
        let desktop_entry = layout.desktop_entry_path(name);

        let (exec, icon, read_error) = match read_launch_fields(&desktop_entry) {
            Ok((exec, icon)) => (exec, icon, None),
            Err(e) => {
                warn!("Cannot read desktop entry {:?}: {}", desktop_entry, e);
                (None, None, Some(e.to_string()))
            }
        };

        InstalledApp {
            name: name.to_string(),
            appimage_path: layout.appimage_path(name),
            desktop_entry,
            exec,
            icon,
            read_error,
        }
    }

    fn write_details(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "  Desktop Entry: {}", self.desktop_entry.display())?;
        if let Some(err) = &self.read_error {
            writeln!(out, "  Error reading desktop file: {}", err)?;
        }
        writeln!(out, "  Exec: {}", self.exec.as_deref().unwrap_or(NOT_AVAILABLE))?;
        writeln!(out, "  Icon: {}", self.icon.as_deref().unwrap_or(NOT_AVAILABLE))?;
        writeln!(out, "  AppImage Path: {}", self.appimage_path.display())?;
        writeln!(out)
    }
}

pub fn run_list(
    layout: &InstallLayout,
    options: ListOptions,
    out: &mut impl Write,
) -> Result<Vec<String>, ListError> {
    let names = layout
        .installed_names()
        .map_err(|source| ListError::Walk {
            root: layout.appimage_root.clone(),
            source,
        })?;
    debug!("Found {} installed AppImages in {:?}", names.len(), layout.appimage_root);

    if options.json {
        let apps: Vec<InstalledApp> = names
            .iter()
            .map(|name| InstalledApp::inspect(layout, name))
            .collect();
        serde_json::to_writer_pretty(&mut *out, &apps)?;
        writeln!(out)?;
        return Ok(names);
    }

    if names.is_empty() {
        writeln!(out, "No AppImages installed.")?;
        return Ok(names);
    }

    writeln!(out, "Installed AppImages:")?;
    for name in &names {
        writeln!(out, "- {}", name)?;
        if options.details {
            InstalledApp::inspect(layout, name).write_details(out)?;
        }
    }

    Ok(names)
}
