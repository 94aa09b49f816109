use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Commands;
use crate::layout::InstallLayout;
use crate::pattern::{PatternError, WildcardPattern};
use crate::privileges::{ExecError, PrivilegedCommand, PrivilegedExecutor};
use crate::prompt::{Confirm, PromptError};

const CONFIRM_PROMPT: &str = "Are you sure you want to uninstall these AppImages? (y/n)";

#[derive(Debug, Error)]
pub enum UninstallError {
    #[error("Failed to read {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{0}")]
    Pattern(#[from] PatternError),

    #[error("{0}")]
    Prompt(#[from] PromptError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to uninstall: {}", .failed.join(", "))]
    Partial { failed: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct UninstallRequest {
    pub pattern: String,
}

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub matched: Vec<String>,
    pub removed: Vec<String>,
    pub cancelled: bool,
}

pub struct Uninstaller<'a, E: PrivilegedExecutor> {
    layout: &'a InstallLayout,
    executor: &'a E,
    commands: &'a Commands,
}

impl<'a, E: PrivilegedExecutor> Uninstaller<'a, E> {
    pub fn new(layout: &'a InstallLayout, executor: &'a E, commands: &'a Commands) -> Self {
        Uninstaller {
            layout,
            executor,
            commands,
        }
    }

    pub fn matching(&self, pattern: &WildcardPattern) -> Result<Vec<String>, UninstallError> {
        let names = self
            .layout
            .installed_names()
            .map_err(|source| UninstallError::Walk {
                root: self.layout.appimage_root.clone(),
                source,
            })?;
        Ok(pattern.filter(&names))
    }

    /// Removes the bundle directory, the system entry and the user link. Missing
    /// pieces are fine; the first command that fails stops this app only.
    #[instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<(), ExecError> {
        let steps = [
            PrivilegedCommand::new("rm").arg("-rf").arg(self.layout.app_dir(name)),
            PrivilegedCommand::new("rm")
                .arg("-f")
                .arg(self.layout.desktop_entry_path(name)),
            PrivilegedCommand::new("rm")
                .arg("-f")
                .arg(self.layout.user_link_path(name)),
        ];

        for step in &steps {
            self.executor.run(step)?;
        }

        info!("Removed {}", name);
        Ok(())
    }

    fn refresh_database(&self) -> Result<(), ExecError> {
        self.executor.run(
            &PrivilegedCommand::new(&self.commands.refresh_database)
                .arg(&self.layout.applications_dir),
        )
    }
}

pub fn run_uninstall<E: PrivilegedExecutor>(
    layout: &InstallLayout,
    executor: &E,
    commands: &Commands,
    confirm: &dyn Confirm,
    request: &UninstallRequest,
    out: &mut impl Write,
) -> Result<UninstallReport, UninstallError> {
    let pattern = WildcardPattern::new(&request.pattern)?;
    debug!("Matching installed AppImages against {:?}", pattern.as_str());
    let uninstaller = Uninstaller::new(layout, executor, commands);

    let mut report = UninstallReport {
        matched: uninstaller.matching(&pattern)?,
        ..Default::default()
    };

    if report.matched.is_empty() {
        writeln!(out, "No matching AppImages found.")?;
        return Ok(report);
    }

    writeln!(out, "Matching AppImages:")?;
    for name in &report.matched {
        writeln!(out, "- {}", name)?;
    }
    out.flush()?;

    if !confirm.confirm(CONFIRM_PROMPT)? {
        writeln!(out, "Uninstallation cancelled.")?;
        report.cancelled = true;
        return Ok(report);
    }

    let mut failed = Vec::new();
    for name in &report.matched {
        match uninstaller.remove(name) {
            Ok(()) => {
                writeln!(out, "Uninstalled {}", name)?;
                report.removed.push(name.clone());
            }
            Err(e) => {
                error!("Failed to uninstall {}: {}", name, e);
                writeln!(out, "⚠️  Failed to uninstall {}: {}", name, e)?;
                failed.push(name.clone());
            }
        }
    }

    if !report.removed.is_empty()
        && let Err(e) = uninstaller.refresh_database()
    {
        warn!("Desktop database refresh failed: {}", e);
        writeln!(out, "⚠️  Could not refresh the desktop database: {}", e)?;
    }

    if !failed.is_empty() {
        return Err(UninstallError::Partial { failed });
    }

    writeln!(out, "Uninstallation complete.")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop_entry::DesktopEntry;
    use crate::testing::{
        FsExecutor, ScriptedConfirm, assert_exists, assert_missing, output_string,
    };
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::path::Path;
    use tempfile::TempDir;

    fn layout_in(root: &Path) -> InstallLayout {
        let layout = InstallLayout::new(
            root.join("AppImages"),
            root.join("applications"),
            root.join("home/.local/share/applications"),
        );
        fs::create_dir_all(&layout.applications_dir).unwrap();
        fs::create_dir_all(&layout.user_applications_dir).unwrap();
        layout
    }

    fn install_fake(layout: &InstallLayout, name: &str) {
        fs::create_dir_all(layout.app_dir(name)).unwrap();
        fs::write(layout.appimage_path(name), b"fake").unwrap();
        let entry = DesktopEntry::new(name.to_string(), layout.appimage_path(name));
        fs::write(layout.desktop_entry_path(name), entry.to_file_content()).unwrap();
        symlink(layout.desktop_entry_path(name), layout.user_link_path(name)).unwrap();
    }

    fn uninstall(
        layout: &InstallLayout,
        executor: &FsExecutor,
        confirm: &ScriptedConfirm,
        pattern: &str,
    ) -> (Result<UninstallReport, UninstallError>, String) {
        let mut out = Vec::new();
        let request = UninstallRequest {
            pattern: pattern.to_string(),
        };
        let result = run_uninstall(
            layout,
            executor,
            &Commands::default(),
            confirm,
            &request,
            &mut out,
        );
        (result, output_string(&out))
    }

    fn assert_installed(layout: &InstallLayout, name: &str) {
        assert_exists(&layout.app_dir(name));
        assert_exists(&layout.desktop_entry_path(name));
        assert_exists(&layout.user_link_path(name));
    }

    fn assert_uninstalled(layout: &InstallLayout, name: &str) {
        assert_missing(&layout.app_dir(name));
        assert_missing(&layout.desktop_entry_path(name));
        assert_missing(&layout.user_link_path(name));
    }

    #[test]
    fn wildcard_removes_matching_apps_only() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        for name in ["foo", "foobar", "baz"] {
            install_fake(&layout, name);
        }
        let executor = FsExecutor::new();
        let confirm = ScriptedConfirm::answering("y");

        let (result, out) = uninstall(&layout, &executor, &confirm, "foo*");
        let report = result.unwrap();

        assert_eq!(report.matched, vec!["foo", "foobar"]);
        assert_eq!(report.removed, vec!["foo", "foobar"]);
        assert_uninstalled(&layout, "foo");
        assert_uninstalled(&layout, "foobar");
        assert_installed(&layout, "baz");

        assert!(out.contains("Matching AppImages:\n- foo\n- foobar\n"));
        assert!(out.contains("Uninstalled foo\n"));
        assert!(out.ends_with("Uninstallation complete.\n"));
        assert_eq!(confirm.times_asked(), 1);
        assert!(
            executor
                .calls()
                .last()
                .unwrap()
                .starts_with("update-desktop-database")
        );
    }

    #[test]
    fn exact_name_matches_single_app() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        for name in ["foo", "foobar", "baz"] {
            install_fake(&layout, name);
        }
        let executor = FsExecutor::new();
        let confirm = ScriptedConfirm::answering("YES");

        let report = uninstall(&layout, &executor, &confirm, "baz").0.unwrap();

        assert_eq!(report.removed, vec!["baz"]);
        assert_installed(&layout, "foo");
        assert_installed(&layout, "foobar");
    }

    #[test]
    fn declining_leaves_everything_in_place() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        install_fake(&layout, "foo");
        let executor = FsExecutor::new();
        let confirm = ScriptedConfirm::answering("n");

        let (result, out) = uninstall(&layout, &executor, &confirm, "foo");
        let report = result.unwrap();

        assert!(report.cancelled);
        assert!(report.removed.is_empty());
        assert!(out.ends_with("Uninstallation cancelled.\n"));
        assert_installed(&layout, "foo");
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn no_match_skips_prompt() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        install_fake(&layout, "foo");
        let executor = FsExecutor::new();
        let confirm = ScriptedConfirm::answering("y");

        let (result, out) = uninstall(&layout, &executor, &confirm, "nothing*here");

        assert!(result.unwrap().matched.is_empty());
        assert_eq!(out, "No matching AppImages found.\n");
        assert_eq!(confirm.times_asked(), 0);
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn missing_entry_and_link_are_tolerated() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        fs::create_dir_all(layout.app_dir("orphan")).unwrap();
        let executor = FsExecutor::new();
        let confirm = ScriptedConfirm::answering("y");

        let report = uninstall(&layout, &executor, &confirm, "orphan").0.unwrap();

        assert_eq!(report.removed, vec!["orphan"]);
        assert_uninstalled(&layout, "orphan");
    }

    #[test]
    fn failing_item_does_not_stop_the_batch() {
        let temp = TempDir::new().unwrap();
        let layout = layout_in(temp.path());
        for name in ["app-a", "app-b", "app-c"] {
            install_fake(&layout, name);
        }
        let executor = FsExecutor::new().failing_on("app-b.desktop");
        let confirm = ScriptedConfirm::answering("y");

        let (result, out) = uninstall(&layout, &executor, &confirm, "app-*");

        match result {
            Err(UninstallError::Partial { failed }) => assert_eq!(failed, vec!["app-b"]),
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert_uninstalled(&layout, "app-a");
        assert_uninstalled(&layout, "app-c");
        assert_exists(&layout.desktop_entry_path("app-b"));
        assert!(out.contains("Failed to uninstall app-b"));
        assert!(!out.contains("Uninstallation complete."));
    }
}
