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

use std::fmt;

/// Coordinates of one message inside a chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatMessageLocation {
    pub thread_id: String,
    pub message_idx: usize,
}

impl ChatMessageLocation {
    pub fn new(thread_id: impl Into<String>, message_idx: usize) -> Self {
        Self { thread_id: thread_id.into(), message_idx }
    }
}

/// Position of a token in the nested token tree, e.g. `3-1` for the second
/// inline token of the fourth top-level token. Derived only from indices, so
/// re-rendering identical content yields identical paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenPath(String);

impl TokenPath {
    /// Path of the `index`-th token under `parent`, or a top-level path when
    /// `parent` is `None`.
    pub fn child_of(parent: Option<&TokenPath>, index: usize) -> Self {
        match parent {
            Some(parent) if !parent.0.is_empty() => Self(format!("{}-{index}", parent.0)),
            _ => Self(index.to_string()),
        }
    }

    pub fn child(&self, index: usize) -> Self {
        Self::child_of(Some(self), index)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one code block's apply/copy state within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplyBoxLocation {
    pub thread_id: String,
    pub message_idx: usize,
    pub token_idx: TokenPath,
}

impl ApplyBoxLocation {
    pub fn new(location: &ChatMessageLocation, token_idx: TokenPath) -> Self {
        Self { thread_id: location.thread_id.clone(), message_idx: location.message_idx, token_idx }
    }

    /// Stable id: `{threadId}-{messageIdx}-{tokenIdx}`.
    pub fn apply_box_id(&self) -> String {
        format!("{}-{}-{}", self.thread_id, self.message_idx, self.token_idx)
    }
}
