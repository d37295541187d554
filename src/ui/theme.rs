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

use crate::apply::ApplyStatus;
use ratatui::style::{Color, Modifier, Style};

// Accent
pub const RUST_ORANGE: Color = Color::Rgb(244, 118, 0);

// Chrome
pub const DIM: Color = Color::DarkGray;
pub const SEPARATOR_CHAR: &str = "─";
pub const HEADING_RULE_CHAR: &str = "═";
pub const QUOTE_BAR: &str = "│ ";

// Code blocks and spans
pub const CODE_FG: Color = Color::Rgb(220, 220, 170);
pub const CODE_BORDER: Color = Color::DarkGray;
pub const LINK: Color = Color::Rgb(86, 156, 214);
pub const LATEX: Color = Color::Magenta;

// Tables
pub const TABLE_STRIPE_BG: Color = Color::Rgb(40, 44, 52);

// Diagnostics
pub const WARN: Color = Color::Yellow;

// Apply status colors
pub const STATUS_OK: Color = Color::Green;
pub const STATUS_ERROR: Color = Color::Red;

pub const ICON_UNCHECKED: &str = "☐";
pub const ICON_CHECKED: &str = "☑";
pub const BULLET: &str = "•";

/// Heading style by depth. 1 and 2 are accented (and get a rule below);
/// 6 is dimmed.
pub fn heading_style(level: u8) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match level {
        1 => bold.fg(RUST_ORANGE),
        2 => bold.fg(Color::White),
        3 => bold.fg(Color::Cyan),
        4 | 5 => bold,
        _ => Style::default().fg(DIM).add_modifier(Modifier::BOLD),
    }
}

pub fn code_style() -> Style {
    Style::default().fg(CODE_FG)
}

/// Label and color shown next to a code block's apply controls.
pub fn apply_status_label(status: ApplyStatus) -> (&'static str, Color) {
    match status {
        ApplyStatus::Idle => ("", DIM),
        ApplyStatus::Copied => ("✓ copied", STATUS_OK),
        ApplyStatus::Applied => ("✓ applied", STATUS_OK),
        ApplyStatus::Failed => ("✗ failed", STATUS_ERROR),
    }
}
