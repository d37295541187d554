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

use super::theme;
use crate::markdown::node::{TableCellView, TableView};
use crate::markdown::token::ColumnAlign;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Cell, Row, Table, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const COLUMN_SPACING: usize = 3;

/// Lay out a table at `width` columns. Cell text is inline markdown; column
/// alignment comes from the delimiter row, and data rows alternate background.
#[allow(clippy::cast_possible_truncation)]
pub fn render_table_lines(table: &TableView, width: u16) -> Vec<Line<'static>> {
    let cols =
        std::cmp::max(table.header.len(), table.rows.iter().map(Vec::len).max().unwrap_or(0));
    if cols == 0 || width == 0 {
        return Vec::new();
    }

    let widths = column_widths(table, cols, width as usize);
    let aligns: Vec<ColumnAlign> = (0..cols)
        .map(|i| {
            table
                .header
                .get(i)
                .or_else(|| table.rows.iter().find_map(|row| row.get(i)))
                .map_or(ColumnAlign::Left, |cell| cell.align)
        })
        .collect();

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let (header_cells, header_height) = row_cells(&table.header, &widths, &aligns, header_style);
    let header = Row::new(header_cells).height(header_height);

    let mut rows: Vec<Row<'static>> = Vec::with_capacity(table.rows.len());
    let mut rows_height = 0u16;
    for (idx, row) in table.rows.iter().enumerate() {
        let (cells, row_height) = row_cells(row, &widths, &aligns, Style::default());
        let mut row_widget = Row::new(cells).height(row_height);
        if idx % 2 == 1 {
            row_widget = row_widget.style(Style::default().bg(theme::TABLE_STRIPE_BG));
        }
        rows.push(row_widget);
        rows_height = rows_height.saturating_add(row_height);
    }

    let constraints: Vec<Constraint> =
        widths.iter().map(|w| Constraint::Length(*w as u16)).collect();
    let table_widget =
        Table::new(rows, constraints).header(header).column_spacing(COLUMN_SPACING as u16);

    let height = header_height.saturating_add(rows_height);
    let table_width = widths.iter().sum::<usize>() + COLUMN_SPACING * (cols - 1);
    let area = Rect::new(0, 0, width.min(table_width as u16), height);
    let mut buffer = Buffer::empty(area);
    table_widget.render(area, &mut buffer);

    buffer_to_lines(&buffer, area)
}

/// Natural column widths, shrunk widest-first until the table fits.
fn column_widths(table: &TableView, cols: usize, available: usize) -> Vec<usize> {
    let mut widths = vec![1usize; cols];
    for row in std::iter::once(&table.header).chain(&table.rows) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(UnicodeWidthStr::width(cell.text.as_str()));
        }
    }

    let total = |widths: &[usize]| {
        widths.iter().sum::<usize>() + COLUMN_SPACING.saturating_mul(cols.saturating_sub(1))
    };
    while total(&widths) > available {
        let Some((idx, _)) =
            widths.iter().enumerate().filter(|(_, w)| **w > 1).max_by_key(|(_, w)| **w)
        else {
            break;
        };
        widths[idx] -= 1;
    }
    widths
}

#[allow(clippy::cast_possible_truncation)]
fn row_cells(
    row: &[TableCellView],
    widths: &[usize],
    aligns: &[ColumnAlign],
    style: Style,
) -> (Vec<Cell<'static>>, u16) {
    let mut height = 1u16;
    let cells = widths
        .iter()
        .zip(aligns)
        .enumerate()
        .map(|(i, (width, align))| {
            let text = row.get(i).map_or("", |cell| cell.text.as_str());
            let lines = wrap_inline_markdown(text, *width, style);
            height = height.max(lines.len() as u16);
            Cell::from(Text::from(lines).alignment(alignment(*align)))
        })
        .collect();
    (cells, height)
}

fn alignment(align: ColumnAlign) -> Alignment {
    match align {
        ColumnAlign::Left => Alignment::Left,
        ColumnAlign::Center => Alignment::Center,
        ColumnAlign::Right => Alignment::Right,
    }
}

fn buffer_to_lines(buffer: &Buffer, area: Rect) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(area.height as usize);
    for y in 0..area.height {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut current_style: Option<Style> = None;
        let mut current_text = String::new();
        for x in 0..area.width {
            let cell = &buffer[(area.x + x, area.y + y)];
            let style = cell.style();
            if current_style.is_some_and(|s| s == style) {
                current_text.push_str(cell.symbol());
            } else {
                if !current_text.is_empty() {
                    spans.push(Span::styled(
                        std::mem::take(&mut current_text),
                        current_style.unwrap_or_default(),
                    ));
                }
                current_style = Some(style);
                current_text.push_str(cell.symbol());
            }
        }
        let trimmed_len = current_text.trim_end().len();
        current_text.truncate(trimmed_len);
        if !current_text.is_empty() {
            spans.push(Span::styled(current_text, current_style.unwrap_or_default()));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn wrap_inline_markdown(text: &str, width: usize, base_style: Style) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    if text.is_empty() {
        return vec![Line::from(Span::styled(String::new(), base_style))];
    }

    let chunks = parse_inline_chunks(text, base_style);
    wrap_chunks_to_lines(&chunks, width)
}

struct StyledChunk {
    text: String,
    style: Style,
}

fn parse_inline_chunks(text: &str, base_style: Style) -> Vec<StyledChunk> {
    let mut chunks: Vec<StyledChunk> = Vec::new();
    let mut current = String::new();
    let mut style_stack: Vec<Style> = vec![base_style];
    let mut current_style = base_style;

    let flush_current = |chunks: &mut Vec<StyledChunk>, current: &mut String, style: Style| {
        if !current.is_empty() {
            chunks.push(StyledChunk { text: std::mem::take(current), style });
        }
    };

    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => {
                flush_current(&mut chunks, &mut current, current_style);
                let next = match tag {
                    Tag::Strong => current_style.add_modifier(Modifier::BOLD),
                    Tag::Emphasis => current_style.add_modifier(Modifier::ITALIC),
                    Tag::Strikethrough => current_style.add_modifier(Modifier::CROSSED_OUT),
                    Tag::Link { .. } => {
                        current_style.fg(theme::LINK).add_modifier(Modifier::UNDERLINED)
                    }
                    _ => current_style,
                };
                style_stack.push(next);
                current_style = next;
            }
            Event::End(tag) => {
                flush_current(&mut chunks, &mut current, current_style);
                if matches!(
                    tag,
                    TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::Link
                ) {
                    style_stack.pop();
                    current_style = *style_stack.last().unwrap_or(&base_style);
                }
            }
            Event::Text(t) => current.push_str(&t),
            Event::Code(t) => {
                flush_current(&mut chunks, &mut current, current_style);
                chunks.push(StyledChunk {
                    text: t.into_string(),
                    style: current_style.patch(theme::code_style()),
                });
            }
            Event::SoftBreak => current.push(' '),
            Event::HardBreak => current.push('\n'),
            _ => {}
        }
    }
    flush_current(&mut chunks, &mut current, current_style);

    if chunks.is_empty() {
        chunks.push(StyledChunk { text: String::new(), style: base_style });
    }

    chunks
}

fn wrap_chunks_to_lines(chunks: &[StyledChunk], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut line_spans: Vec<Span<'static>> = Vec::new();
    let mut line_width = 0usize;
    let mut span_text = String::new();
    let mut span_style: Option<Style> = None;

    let flush_span = |line_spans: &mut Vec<Span<'static>>,
                      span_text: &mut String,
                      span_style: &mut Option<Style>| {
        if !span_text.is_empty() {
            let style = span_style.unwrap_or_default();
            line_spans.push(Span::styled(std::mem::take(span_text), style));
        }
    };

    let flush_line = |lines: &mut Vec<Line<'static>>,
                      line_spans: &mut Vec<Span<'static>>,
                      span_text: &mut String,
                      span_style: &mut Option<Style>,
                      line_width: &mut usize| {
        flush_span(line_spans, span_text, span_style);
        lines.push(Line::from(std::mem::take(line_spans)));
        *line_width = 0;
    };

    for chunk in chunks {
        let style = chunk.style;
        for ch in chunk.text.chars() {
            if ch == '\n' {
                flush_line(
                    &mut lines,
                    &mut line_spans,
                    &mut span_text,
                    &mut span_style,
                    &mut line_width,
                );
                span_style = None;
                continue;
            }

            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if line_width + w > width && line_width > 0 {
                flush_line(
                    &mut lines,
                    &mut line_spans,
                    &mut span_text,
                    &mut span_style,
                    &mut line_width,
                );
                span_style = None;
            }

            if span_style != Some(style) {
                flush_span(&mut line_spans, &mut span_text, &mut span_style);
                span_style = Some(style);
            }
            span_text.push(ch);
            line_width = line_width.saturating_add(w);
        }
    }

    flush_line(&mut lines, &mut line_spans, &mut span_text, &mut span_style, &mut line_width);
    lines
}
