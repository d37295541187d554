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

//! Prints styled lines to a plain (non-alternate-screen) terminal.

use crossterm::QueueableCommand;
use crossterm::style::{
    Attribute, Color as CtColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use std::io::{self, Write};

const FALLBACK_WIDTH: u16 = 100;

/// Width of the attached terminal, or a fixed default when not a tty.
pub fn terminal_width() -> u16 {
    crossterm::terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| cols).max(20)
}

/// Concatenated span contents of one line.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

pub fn write_lines(out: &mut impl Write, lines: &[Line<'_>], color: bool) -> io::Result<()> {
    for line in lines {
        if color {
            for span in &line.spans {
                let style = line.style.patch(span.style);
                queue_style(out, style)?;
                out.queue(Print(span.content.as_ref()))?;
                out.queue(SetAttribute(Attribute::Reset))?;
                out.queue(ResetColor)?;
            }
        } else {
            out.queue(Print(line_text(line)))?;
        }
        out.queue(Print("\n"))?;
    }
    out.flush()
}

fn queue_style(out: &mut impl Write, style: Style) -> io::Result<()> {
    if let Some(fg) = style.fg {
        out.queue(SetForegroundColor(to_crossterm(fg)))?;
    }
    if let Some(bg) = style.bg {
        out.queue(SetBackgroundColor(to_crossterm(bg)))?;
    }
    for (modifier, attribute) in [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ] {
        if style.add_modifier.contains(modifier) {
            out.queue(SetAttribute(attribute))?;
        }
    }
    Ok(())
}

fn to_crossterm(color: Color) -> CtColor {
    match color {
        Color::Reset => CtColor::Reset,
        Color::Black => CtColor::Black,
        Color::Red => CtColor::DarkRed,
        Color::Green => CtColor::DarkGreen,
        Color::Yellow => CtColor::DarkYellow,
        Color::Blue => CtColor::DarkBlue,
        Color::Magenta => CtColor::DarkMagenta,
        Color::Cyan => CtColor::DarkCyan,
        Color::Gray => CtColor::Grey,
        Color::DarkGray => CtColor::DarkGrey,
        Color::LightRed => CtColor::Red,
        Color::LightGreen => CtColor::Green,
        Color::LightYellow => CtColor::Yellow,
        Color::LightBlue => CtColor::Blue,
        Color::LightMagenta => CtColor::Magenta,
        Color::LightCyan => CtColor::Cyan,
        Color::White => CtColor::White,
        Color::Rgb(r, g, b) => CtColor::Rgb { r, g, b },
        Color::Indexed(i) => CtColor::AnsiValue(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::text::Span;

    fn sample() -> Vec<Line<'static>> {
        vec![
            Line::from(vec![
                Span::raw("plain "),
                Span::styled("bold", Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::default(),
        ]
    }

    #[test]
    fn plain_output_has_no_escapes() {
        let mut buf = Vec::new();
        write_lines(&mut buf, &sample(), false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "plain bold\n\n");
    }

    #[test]
    fn coloured_output_wraps_spans_in_sgr() {
        let mut buf = Vec::new();
        write_lines(&mut buf, &sample(), true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\u{1b}[1mbold"), "{text:?}");
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn colors_map_to_crossterm_palette() {
        assert_eq!(to_crossterm(Color::DarkGray), CtColor::DarkGrey);
        assert_eq!(to_crossterm(Color::Rgb(1, 2, 3)), CtColor::Rgb { r: 1, g: 2, b: 3 });
    }
}
