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

use crate::codespan::{CodespanLocationLink, SelectionRange};
use anyhow::Context as _;
use std::path::Path;
use std::process::Command;

const DEFAULT_EDITOR: &str = "code";

/// Editors that take `--goto path:line` instead of `+line path`.
const GOTO_EDITORS: &[&str] = &["code", "code-insiders", "codium", "cursor", "void"];

pub trait Navigator {
    /// Open `uri`, revealing `selection` when given.
    fn open(&mut self, uri: &Path, selection: Option<SelectionRange>) -> anyhow::Result<()>;
}

/// Follow a resolved code span link. Returns `false` when the link has no target.
pub fn open_link(
    link: &CodespanLocationLink,
    navigator: &mut dyn Navigator,
) -> anyhow::Result<bool> {
    let Some(uri) = link.uri.as_deref() else {
        return Ok(false);
    };
    navigator.open(uri, link.selection)?;
    Ok(true)
}

/// Launches `$VISUAL`, then `$EDITOR`, then `code`.
pub struct EditorNavigator {
    editor: String,
}

impl EditorNavigator {
    pub fn from_env() -> Self {
        let editor = std::env::var("VISUAL")
            .ok()
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_owned());
        Self { editor }
    }

    pub fn new(editor: impl Into<String>) -> Self {
        Self { editor: editor.into() }
    }
}

impl Navigator for EditorNavigator {
    fn open(&mut self, uri: &Path, selection: Option<SelectionRange>) -> anyhow::Result<()> {
        let (program, args) = editor_command(&self.editor, uri, selection);
        tracing::debug!(
            %program,
            ?args,
            end_line = selection.map(|range| range.end_line),
            "opening editor"
        );
        let status = Command::new(&program)
            .args(&args)
            .status()
            .with_context(|| format!("failed to launch editor `{program}`"))?;
        if !status.success() {
            anyhow::bail!("editor `{program}` exited with {status}");
        }
        Ok(())
    }
}

/// Program and arguments for opening `path` at `selection` in `editor`.
/// `editor` may carry its own flags (`"nvim -R"`).
///
/// Command-line editors only accept a line to jump to, so a selection opens
/// at its start line and its end line is not passed on.
fn editor_command(
    editor: &str,
    path: &Path,
    selection: Option<SelectionRange>,
) -> (String, Vec<String>) {
    let mut parts = editor.split_whitespace().map(str::to_owned);
    let program = parts.next().unwrap_or_else(|| DEFAULT_EDITOR.to_owned());
    let mut args: Vec<String> = parts.collect();
    let path = path.display().to_string();
    let name = Path::new(&program)
        .file_name()
        .map_or_else(|| program.clone(), |n| n.to_string_lossy().into_owned());

    match selection {
        Some(range) if GOTO_EDITORS.contains(&name.as_str()) => {
            args.push("--goto".to_owned());
            args.push(format!("{path}:{}", range.start_line));
        }
        Some(range) => {
            args.push(format!("+{}", range.start_line));
            args.push(path);
        }
        None => args.push(path),
    }
    (program, args)
}
