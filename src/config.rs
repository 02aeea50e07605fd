use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::host::Container;

/// Per-container settings read from its attributes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContainerConfig {
    pub toolbar_enabled: bool,
    /// Read by a host toolbar, not by the editor itself.
    pub allow_headings: bool,
    pub wrapper_classes: Vec<String>,
    /// Toolbar labels, passed through for the host.
    pub i18n: Map<String, Value>,
}

impl ContainerConfig {
    pub fn from_container(container: &Container) -> Self {
        let flag = |key: &str| container.attribute(key) == Some("true");
        let wrapper_classes = container
            .attribute("data-wrapper-classes")
            .unwrap_or_default()
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect();
        Self {
            toolbar_enabled: flag("data-toolbar-enabled"),
            allow_headings: flag("data-allow-headings"),
            wrapper_classes,
            i18n: parse_i18n(container.attribute("data-i18n").unwrap_or("{}")),
        }
    }
}

fn parse_i18n(data: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!(data, "i18n data is not an object");
            Map::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse i18n data");
            Map::new()
        }
    }
}

/// Command-line defaults that can be persisted between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub mappings: Option<PathBuf>,
    pub json: bool,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            mappings: other.mappings.clone().or_else(|| self.mappings.clone()),
            json: self.json || other.json,
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("refmark").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("refmark")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("refmark").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("refmark").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".refmarkrc")
}

/// Read flags from a config file. A missing file yields defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# refmark defaults (saved with --save)".to_string()];
    if let Some(mappings) = &flags.mappings {
        lines.push(format!("--mappings {}", mappings.display()));
    }
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
/// Returns an error if an existing config file cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--json" {
            flags.json = true;
        } else if token == "--perf" {
            flags.perf = true;
        } else if token == "--mappings" {
            if let Some(next) = tokens.get(i + 1) {
                flags.mappings = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--mappings=") {
            flags.mappings = Some(PathBuf::from(value));
        } else if token == "--debug-log" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debug_log = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debug-log=") {
            flags.debug_log = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TextField;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "refmark".to_string(),
            "render".to_string(),
            "--mappings".to_string(),
            "refs.json".to_string(),
            "--json".to_string(),
            "--debug-log=events.log".to_string(),
            "body.md".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.mappings, Some(PathBuf::from("refs.json")));
        assert!(flags.json);
        assert!(!flags.perf);
        assert_eq!(flags.debug_log, Some(PathBuf::from("events.log")));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            mappings: Some(PathBuf::from("file.json")),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            json: true,
            mappings: Some(PathBuf::from("cli.json")),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert!(merged.json);
        assert_eq!(merged.mappings, Some(PathBuf::from("cli.json")));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".refmarkrc");
        let flags = ConfigFlags {
            mappings: Some(PathBuf::from("refs.json")),
            json: true,
            perf: true,
            debug_log: Some(PathBuf::from("events.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let loaded = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(loaded, ConfigFlags::default());
    }

    #[test]
    fn test_container_config_reads_attributes() {
        let container = Container::new()
            .with_attribute("data-toolbar-enabled", "true")
            .with_attribute("data-allow-headings", "false")
            .with_attribute("data-wrapper-classes", "  wide  govuk-!-margin-0 ")
            .with_attribute("data-i18n", r#"{"toolbar_label": "Markdown formatting"}"#)
            .with_field(TextField::new("").as_target());
        let config = ContainerConfig::from_container(&container);
        assert!(config.toolbar_enabled);
        assert!(!config.allow_headings);
        assert_eq!(config.wrapper_classes, vec!["wide", "govuk-!-margin-0"]);
        assert_eq!(
            config.i18n.get("toolbar_label").and_then(Value::as_str),
            Some("Markdown formatting")
        );
    }

    #[test]
    fn test_container_config_tolerates_bad_i18n() {
        let container = Container::new().with_attribute("data-i18n", "{oops");
        let config = ContainerConfig::from_container(&container);
        assert!(config.i18n.is_empty());
        assert!(config.wrapper_classes.is_empty());
    }
}
