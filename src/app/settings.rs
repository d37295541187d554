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

use crate::Cli;
use crate::config::{ConfigError, Settings};
use crate::error::AppError;

/// Settings for this run: file (or defaults), then environment, then `--set`
/// overrides, then flags. Saved back when `--save-config` is given.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let path = cli.config.clone().or_else(Settings::default_path);
    let mut settings = match &path {
        Some(path) => Settings::load(path).map_err(invalid)?,
        None => Settings::default(),
    };
    settings.apply_env();

    for assignment in &cli.set {
        let (name, value) = parse_assignment(assignment).map_err(invalid)?;
        settings.set_field(name, value).map_err(invalid)?;
    }

    if cli.save_config {
        let Some(path) = &path else {
            let message = "no config directory; pass --config".to_owned();
            return Err(AppError::InvalidSettings(message).into());
        };
        settings.save(path).map_err(invalid)?;
        tracing::info!(path = %path.display(), "saved settings");
    }

    if cli.no_apply {
        settings.apply_enabled = false;
    }
    if cli.no_links {
        settings.link_detection_enabled = false;
    }
    if let Some(root) = &cli.workspace {
        settings.workspace_root = Some(std::path::absolute(root)?);
    }
    if cli.width.is_some() {
        settings.width = cli.width;
    }
    settings.validate().map_err(invalid)?;
    Ok(settings)
}

/// `name=json`; a value that is not valid JSON is taken as a string.
fn parse_assignment(assignment: &str) -> Result<(&str, serde_json::Value), ConfigError> {
    let Some((name, raw)) = assignment.split_once('=') else {
        return Err(ConfigError::InvalidField {
            field: assignment.to_owned(),
            message: "expected KEY=VALUE".to_owned(),
        });
    };
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
    Ok((name.trim(), value))
}

fn invalid(err: ConfigError) -> anyhow::Error {
    anyhow::Error::new(AppError::InvalidSettings(err.to_string()))
}
