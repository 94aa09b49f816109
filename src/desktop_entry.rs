use std::path::{Path, PathBuf};

/// The desktop entry written for an installed AppImage.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    pub name: String,
    pub exec_path: PathBuf,
    pub params: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub terminal: bool,
    pub categories: Vec<String>,
    pub comment: String,
}

impl DesktopEntry {
    pub fn new(name: String, exec_path: PathBuf) -> Self {
        DesktopEntry {
            name,
            exec_path,
            params: None,
            icon_path: None,
            terminal: false,
            categories: vec!["Utility".to_string()],
            comment: "AppImage application".to_string(),
        }
    }

    pub fn with_params(mut self, params: Option<String>) -> Self {
        self.params = params
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    pub fn with_icon(mut self, icon_path: Option<PathBuf>) -> Self {
        self.icon_path = icon_path;
        self
    }

    /// Quoted executable path, followed by the extra launch parameters if any.
    pub fn exec_line(&self) -> String {
        let exec = format!("\"{}\"", self.exec_path.display());
        match &self.params {
            Some(params) => format!("{} {}", exec, params),
            None => exec,
        }
    }

    pub fn to_file_content(&self) -> String {
        let mut content = String::from("[Desktop Entry]\n");
        content.push_str(&format!("Name={}\n", self.name));
        content.push_str(&format!("Exec={}\n", self.exec_line()));
        if let Some(icon) = &self.icon_path {
            content.push_str(&format!("Icon={}\n", icon.display()));
        }
        content.push_str("Type=Application\n");
        content.push_str(&format!("Categories={};\n", self.categories.join(";")));
        content.push_str(&format!(
            "Terminal={}\n",
            if self.terminal { "true" } else { "false" }
        ));
        content.push_str(&format!("Comment={}\n", self.comment));
        content
    }
}

/// Value of the first line starting with `key=`, everything after the first `=`.
/// Empty values count as absent.
pub fn find_field<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .find(|line| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.starts_with('='))
        })
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Exec` and `Icon` of an existing desktop entry file.
pub fn read_launch_fields(path: &Path) -> std::io::Result<(Option<String>, Option<String>)> {
    let content = std::fs::read_to_string(path)?;
    Ok((
        find_field(&content, "Exec").map(str::to_string),
        find_field(&content, "Icon").map(str::to_string),
    ))
}
