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

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Invalid settings")]
    InvalidSettings(String),
    #[error("Input not readable")]
    InputUnreadable(String),
    #[error("Code block not found")]
    CodeBlockNotFound(String),
    #[error("Code span not resolved")]
    CodespanUnresolved(String),
    #[error("Apply failed")]
    ApplyFailed(String),
    #[error("Editor failed")]
    OpenFailed(String),
}

impl AppError {
    pub const INVALID_SETTINGS_EXIT_CODE: i32 = 20;
    pub const INPUT_UNREADABLE_EXIT_CODE: i32 = 21;
    pub const CODE_BLOCK_NOT_FOUND_EXIT_CODE: i32 = 22;
    pub const CODESPAN_UNRESOLVED_EXIT_CODE: i32 = 23;
    pub const APPLY_FAILED_EXIT_CODE: i32 = 24;
    pub const OPEN_FAILED_EXIT_CODE: i32 = 25;

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidSettings(_) => Self::INVALID_SETTINGS_EXIT_CODE,
            Self::InputUnreadable(_) => Self::INPUT_UNREADABLE_EXIT_CODE,
            Self::CodeBlockNotFound(_) => Self::CODE_BLOCK_NOT_FOUND_EXIT_CODE,
            Self::CodespanUnresolved(_) => Self::CODESPAN_UNRESOLVED_EXIT_CODE,
            Self::ApplyFailed(_) => Self::APPLY_FAILED_EXIT_CODE,
            Self::OpenFailed(_) => Self::OPEN_FAILED_EXIT_CODE,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSettings(detail) => format!("Invalid settings: {detail}"),
            Self::InputUnreadable(detail) => format!("Could not read input: {detail}"),
            Self::CodeBlockNotFound(block) => {
                format!("No code block `{block}`. Use a 1-based index or an apply box id.")
            }
            Self::CodespanUnresolved(text) => format!(
                "Code span `{text}` did not resolve to a location. \
Check --workspace or raise resolve_wait_ms."
            ),
            Self::ApplyFailed(detail) => format!("Copy/apply failed: {detail}"),
            Self::OpenFailed(detail) => {
                format!("Could not open the editor: {detail}. Set $VISUAL or $EDITOR.")
            }
        }
    }
}
