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

//! Copy/apply controls attached to fenced code blocks.

use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("code block {0} is still streaming; apply is available once it is closed")]
    NotClosed(String),
    #[error("code block {0} has no target file")]
    NoTarget(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where applied code goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyTarget {
    File(PathBuf),
    /// No file known; the editor that currently has focus.
    CurrentEditor,
}

/// Controls for one code block. Copy is always offered; apply only when
/// `can_apply` (the fence is closed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySurface {
    pub apply_box_id: String,
    pub code: String,
    pub language: String,
    pub target: ApplyTarget,
    pub can_apply: bool,
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ApplyError>;
}

/// Writes applied code somewhere an editor will pick it up.
pub trait ApplyEditor {
    fn apply(&mut self, surface: &ApplySurface) -> Result<(), ApplyError>;
}

pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ApplyError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ApplyError::Clipboard(e.to_string()))?;
        clipboard.set_text(text.to_owned()).map_err(|e| ApplyError::Clipboard(e.to_string()))
    }
}

/// Replaces the target file's contents with the code block.
pub struct FileApplier;

impl ApplyEditor for FileApplier {
    fn apply(&mut self, surface: &ApplySurface) -> Result<(), ApplyError> {
        let ApplyTarget::File(path) = &surface.target else {
            return Err(ApplyError::NoTarget(surface.apply_box_id.clone()));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut code = surface.code.clone();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        std::fs::write(path, code)?;
        tracing::info!(
            apply_box_id = %surface.apply_box_id,
            path = %path.display(),
            "applied code block"
        );
        Ok(())
    }
}

impl ApplySurface {
    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<(), ApplyError> {
        clipboard.set_text(&self.code)
    }

    pub fn apply(&self, editor: &mut dyn ApplyEditor) -> Result<(), ApplyError> {
        if !self.can_apply {
            return Err(ApplyError::NotClosed(self.apply_box_id.clone()));
        }
        editor.apply(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyStatus {
    #[default]
    Idle,
    Copied,
    Applied,
    Failed,
}

/// Per-box control state keyed by apply box id, so it survives re-renders of
/// the same content.
#[derive(Debug, Default)]
pub struct ApplyStates {
    states: HashMap<String, ApplyStatus>,
}

impl ApplyStates {
    pub fn get(&self, apply_box_id: &str) -> ApplyStatus {
        self.states.get(apply_box_id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, apply_box_id: &str, status: ApplyStatus) {
        self.states.insert(apply_box_id.to_owned(), status);
    }

    /// Copy through `clipboard` and record the outcome.
    pub fn copy(
        &mut self,
        surface: &ApplySurface,
        clipboard: &mut dyn Clipboard,
    ) -> Result<(), ApplyError> {
        let result = surface.copy(clipboard);
        let status = if result.is_ok() { ApplyStatus::Copied } else { ApplyStatus::Failed };
        self.set(&surface.apply_box_id, status);
        result
    }

    /// Apply through `editor` and record the outcome. A refused apply leaves
    /// the state untouched.
    pub fn apply(
        &mut self,
        surface: &ApplySurface,
        editor: &mut dyn ApplyEditor,
    ) -> Result<(), ApplyError> {
        match surface.apply(editor) {
            Err(err @ ApplyError::NotClosed(_)) => Err(err),
            Ok(()) => {
                self.set(&surface.apply_box_id, ApplyStatus::Applied);
                Ok(())
            }
            Err(err) => {
                self.set(&surface.apply_box_id, ApplyStatus::Failed);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard(Vec<String>);

    impl Clipboard for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ApplyError> {
            self.0.push(text.to_owned());
            Ok(())
        }
    }

    fn surface(can_apply: bool, target: ApplyTarget) -> ApplySurface {
        ApplySurface {
            apply_box_id: "t-0-1".to_owned(),
            code: "fn main() {}".to_owned(),
            language: "rust".to_owned(),
            target,
            can_apply,
        }
    }

    #[test]
    fn copy_is_always_available() {
        let mut clipboard = RecordingClipboard::default();
        let mut states = ApplyStates::default();
        states.copy(&surface(false, ApplyTarget::CurrentEditor), &mut clipboard).unwrap();
        assert_eq!(clipboard.0, vec!["fn main() {}".to_owned()]);
        assert_eq!(states.get("t-0-1"), ApplyStatus::Copied);
    }

    #[test]
    fn apply_refused_while_streaming() {
        let mut states = ApplyStates::default();
        let err = states
            .apply(&surface(false, ApplyTarget::File(PathBuf::from("/tmp/x.rs"))), &mut FileApplier)
            .unwrap_err();
        assert!(matches!(err, ApplyError::NotClosed(_)));
        assert_eq!(states.get("t-0-1"), ApplyStatus::Idle);
    }

    #[test]
    fn file_applier_writes_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/main.rs");
        let mut states = ApplyStates::default();
        states.apply(&surface(true, ApplyTarget::File(path.clone())), &mut FileApplier).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fn main() {}\n");
        assert_eq!(states.get("t-0-1"), ApplyStatus::Applied);
    }

    #[test]
    fn file_applier_needs_a_file_target() {
        let mut states = ApplyStates::default();
        let err =
            states.apply(&surface(true, ApplyTarget::CurrentEditor), &mut FileApplier).unwrap_err();
        assert!(matches!(err, ApplyError::NoTarget(_)));
        assert_eq!(states.get("t-0-1"), ApplyStatus::Failed);
    }
}
