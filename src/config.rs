// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! User settings: a JSON file, environment overrides, and field-level edits.

use crate::markdown::RenderTokenOptions;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_NAME: &str = "code-chat-markdown";
const SETTINGS_FILE: &str = "settings.json";
const NO_APPLY_ENV: &str = "CODE_MD_NO_APPLY";
const NO_LINKS_ENV: &str = "CODE_MD_NO_LINKS";

pub const DEFAULT_MAX_SCAN_FILES: usize = 20_000;
pub const DEFAULT_RESOLVE_WAIT_MS: u64 = 1500;
const MAX_RESOLVE_WAIT_MS: u64 = 60_000;
const MIN_WIDTH: u16 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown setting `{0}`")]
    UnknownField(String),
    #[error("invalid value for `{field}`: {message}")]
    InvalidField { field: String, message: String },
    #[error("failed to read settings file {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("malformed settings file {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("failed to write settings file {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attach copy/apply controls to code blocks.
    pub apply_enabled: bool,
    /// Resolve inline code spans to workspace locations.
    pub link_detection_enabled: bool,
    /// Root for link resolution and tooltips; the current directory otherwise.
    pub workspace_root: Option<PathBuf>,
    pub max_scan_files: usize,
    /// How long the binary waits for pending links before printing.
    pub resolve_wait_ms: u64,
    /// Fixed output width; the terminal width otherwise.
    pub width: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            apply_enabled: true,
            link_detection_enabled: true,
            workspace_root: None,
            max_scan_files: DEFAULT_MAX_SCAN_FILES,
            resolve_wait_ms: DEFAULT_RESOLVE_WAIT_MS,
            width: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE))
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        let settings: Self = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write the whole file. Nothing is touched unless serialization succeeds.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
        };
        write().map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    fn apply_env_with(&mut self, var: impl Fn(&str) -> Option<String>) {
        let enabled = |name: &str| {
            var(name).is_some_and(|v| {
                matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            })
        };
        if enabled(NO_APPLY_ENV) {
            self.apply_enabled = false;
        }
        if enabled(NO_LINKS_ENV) {
            self.link_detection_enabled = false;
        }
    }

    /// Set one field from JSON. The value is validated first; on error the
    /// settings are left unchanged.
    pub fn set_field(&mut self, name: &str, value: serde_json::Value) -> Result<(), ConfigError> {
        let mut next = self.clone();
        match name {
            "apply_enabled" => next.apply_enabled = parse_field(name, value)?,
            "link_detection_enabled" => next.link_detection_enabled = parse_field(name, value)?,
            "workspace_root" => next.workspace_root = parse_field(name, value)?,
            "max_scan_files" => next.max_scan_files = parse_field(name, value)?,
            "resolve_wait_ms" => next.resolve_wait_ms = parse_field(name, value)?,
            "width" => next.width = parse_field(name, value)?,
            _ => return Err(ConfigError::UnknownField(name.to_owned())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.workspace_root
            && !root.is_absolute()
        {
            return Err(invalid("workspace_root", "must be an absolute path"));
        }
        if self.max_scan_files == 0 {
            return Err(invalid("max_scan_files", "must be greater than zero"));
        }
        if self.resolve_wait_ms > MAX_RESOLVE_WAIT_MS {
            return Err(invalid(
                "resolve_wait_ms",
                &format!("must be at most {MAX_RESOLVE_WAIT_MS}"),
            ));
        }
        if self.width.is_some_and(|w| w < MIN_WIDTH) {
            return Err(invalid("width", &format!("must be at least {MIN_WIDTH}")));
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderTokenOptions {
        RenderTokenOptions {
            is_apply_enabled: self.apply_enabled,
            is_link_detection_enabled: self.link_detection_enabled,
        }
    }

    pub fn resolve_wait(&self) -> Duration {
        Duration::from_millis(self.resolve_wait_ms)
    }
}

fn parse_field<T: DeserializeOwned>(
    name: &str,
    value: serde_json::Value,
) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| invalid(name, &e.to_string()))
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField { field: field.to_owned(), message: message.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "apply_enabled": false, "width": 80 }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert!(!settings.apply_enabled);
        assert!(settings.link_detection_enabled);
        assert_eq!(settings.width, Some(80));
        assert_eq!(settings.max_scan_files, DEFAULT_MAX_SCAN_FILES);
    }

    #[test]
    fn malformed_and_out_of_range_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
        std::fs::write(&path, r#"{ "width": 3 }"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let settings = Settings { resolve_wait_ms: 10, ..Settings::default() };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn set_field_commits_valid_values() {
        let mut settings = Settings::default();
        settings.set_field("link_detection_enabled", json!(false)).unwrap();
        settings.set_field("width", json!(120)).unwrap();
        settings.set_field("width", json!(null)).unwrap();
        assert!(!settings.link_detection_enabled);
        assert_eq!(settings.width, None);
    }

    #[test]
    fn set_field_rejects_bad_values_without_changing_anything() {
        let mut settings = Settings::default();
        let before = settings.clone();

        let err = settings.set_field("apply_enabled", json!("yes")).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidField { ref field, .. } if field == "apply_enabled")
        );
        let err = settings.set_field("max_scan_files", json!(0)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidField { ref field, .. } if field == "max_scan_files")
        );
        let err = settings.set_field("workspace_root", json!("relative/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
        assert!(matches!(
            settings.set_field("colour", json!(true)),
            Err(ConfigError::UnknownField(_))
        ));

        assert_eq!(settings, before);
    }

    #[test]
    fn env_flags_disable_features() {
        let mut settings = Settings::default();
        settings.apply_env_with(|name| (name == NO_LINKS_ENV).then(|| "Yes".to_owned()));
        assert!(settings.apply_enabled);
        assert!(!settings.link_detection_enabled);
        assert_eq!(settings.render_options(), RenderTokenOptions {
            is_apply_enabled: true,
            is_link_detection_enabled: false,
        });
    }
}
