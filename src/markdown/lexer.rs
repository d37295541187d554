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

//! Token source: folds the flat `pulldown-cmark` event stream into a token tree.
//!
//! Every token keeps the exact source slice it came from (`raw`), which the
//! renderer relies on to tell finished constructs from ones still streaming in
//! (a fence without its closing marker, a code span without its closing tick).

use super::token::{ColumnAlign, ListItem, TableCell, Token};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use std::ops::Range;

type Spanned<'a> = (Event<'a>, Range<usize>);

/// Lex `source` into top-level block tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let events: Vec<Spanned<'_>> = Parser::new_ext(source, options).into_offset_iter().collect();
    let mut lexer = Lexer { source, events, pos: 0 };
    lexer.blocks()
}

struct Lexer<'a> {
    source: &'a str,
    events: Vec<Spanned<'a>>,
    pos: usize,
}

#[derive(Default)]
struct PendingText {
    range: Option<Range<usize>>,
    text: String,
}

impl<'a> Lexer<'a> {
    fn slice(&self, range: &Range<usize>) -> String {
        self.source.get(range.clone()).unwrap_or_default().to_owned()
    }

    fn next_event(&mut self) -> Option<Spanned<'a>> {
        let next = self.events.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn blocks(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cursor = 0usize;
        while let Some((event, range)) = self.next_event() {
            if range.start > cursor {
                self.push_gap(cursor..range.start, &mut tokens);
            }
            cursor = cursor.max(range.end);
            tokens.push(self.block(event, &range));
        }
        if cursor < self.source.len() {
            self.push_gap(cursor..self.source.len(), &mut tokens);
        }
        tokens
    }

    /// Source between two top-level blocks: blank lines, or link reference
    /// definitions that the parser consumed without emitting events.
    fn push_gap(&self, range: Range<usize>, tokens: &mut Vec<Token>) {
        let raw = self.slice(&range);
        if raw.trim().is_empty() {
            tokens.push(Token::Space { raw });
            return;
        }
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            match parse_definition(line) {
                Some(def) => tokens.push(def),
                None => tokens.push(Token::Unknown { raw: line.to_owned(), kind: "text".into() }),
            }
        }
    }

    fn block(&mut self, event: Event<'a>, range: &Range<usize>) -> Token {
        let raw = self.slice(range);
        match event {
            Event::Start(Tag::Paragraph) => {
                let tokens = self.inlines();
                let text = raw.trim_end_matches('\n').to_owned();
                Token::Paragraph { raw, text, tokens }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let tokens = self.inlines();
                let text = inline_text(&tokens);
                Token::Heading { raw, depth: heading_depth(level), text, tokens }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    CodeBlockKind::Indented => None,
                };
                let body = self.collect_text();
                let text = body.strip_suffix('\n').unwrap_or(&body).to_owned();
                Token::Code { raw, text, lang }
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.skip_container();
                let text = blockquote_text(&raw);
                Token::Blockquote { raw, text }
            }
            Event::Start(Tag::List(start)) => {
                let column = self.column_of(range.start);
                let items = self.list_items(column);
                Token::List { raw, ordered: start.is_some(), start, items }
            }
            Event::Start(Tag::Table(aligns)) => self.table(raw, &aligns),
            Event::Start(Tag::HtmlBlock) => {
                self.skip_container();
                Token::Html { raw }
            }
            Event::Start(tag) => {
                let kind = tag_kind(&tag);
                self.skip_container();
                Token::Unknown { raw, kind }
            }
            Event::Rule => Token::Hr { raw },
            Event::Html(_) | Event::InlineHtml(_) => Token::Html { raw },
            other => Token::Unknown { raw, kind: debug_kind(&other) },
        }
    }

    /// Advance past the `End` matching an already consumed `Start`.
    fn skip_container(&mut self) {
        let mut depth = 1usize;
        while let Some((event, _)) = self.events.get(self.pos) {
            self.pos += 1;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Flatten the rest of the current container to its visible text.
    fn collect_text(&mut self) -> String {
        let mut out = String::new();
        let mut depth = 1usize;
        while let Some((event, _)) = self.events.get(self.pos) {
            self.pos += 1;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Text(t) | Event::Code(t) => out.push_str(t),
                Event::SoftBreak => out.push(' '),
                Event::HardBreak => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    fn column_of(&self, offset: usize) -> usize {
        let before = self.source.get(..offset).unwrap_or_default();
        before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1)
    }

    fn list_items(&mut self, column: usize) -> Vec<ListItem> {
        let mut items = Vec::new();
        while let Some((event, range)) = self.next_event() {
            match event {
                Event::Start(Tag::Item) => {
                    let checked = self.peek_task_marker();
                    self.skip_container();
                    let raw = self.slice(&range);
                    let item_column = self.column_of(range.start).max(column);
                    items.push(list_item(raw, item_column, checked));
                }
                Event::Start(_) => self.skip_container(),
                Event::End(_) => break,
                _ => {}
            }
        }
        items
    }

    /// The task marker is the first event of a tight item, or the first event
    /// inside the leading paragraph of a loose one.
    fn peek_task_marker(&self) -> Option<bool> {
        self.events.iter().skip(self.pos).take(2).find_map(|(event, _)| match event {
            Event::TaskListMarker(checked) => Some(*checked),
            _ => None,
        })
    }

    fn table(&mut self, raw: String, aligns: &[Alignment]) -> Token {
        let align = aligns
            .iter()
            .map(|a| match a {
                Alignment::None => None,
                Alignment::Left => Some(ColumnAlign::Left),
                Alignment::Center => Some(ColumnAlign::Center),
                Alignment::Right => Some(ColumnAlign::Right),
            })
            .collect();
        let mut header = Vec::new();
        let mut rows = Vec::new();
        while let Some((event, _)) = self.next_event() {
            match event {
                Event::Start(Tag::TableHead) => header = self.table_cells(),
                Event::Start(Tag::TableRow) => rows.push(self.table_cells()),
                Event::Start(_) => self.skip_container(),
                Event::End(_) => break,
                _ => {}
            }
        }
        Token::Table { raw, header, align, rows }
    }

    fn table_cells(&mut self) -> Vec<TableCell> {
        let mut cells = Vec::new();
        while let Some((event, range)) = self.next_event() {
            match event {
                Event::Start(Tag::TableCell) => {
                    self.skip_container();
                    let raw = self.slice(&range);
                    cells.push(TableCell::new(raw.trim().trim_matches('|').trim()));
                }
                Event::Start(_) => self.skip_container(),
                Event::End(_) => break,
                _ => {}
            }
        }
        cells
    }

    fn inlines(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        let mut pending = PendingText::default();
        while let Some((event, range)) = self.next_event() {
            match event {
                Event::End(_) => break,
                Event::Text(t) => {
                    let raw = self.slice(&range);
                    if raw.starts_with('\\') && raw.chars().count() == 2 {
                        self.flush_text(&mut pending, &mut out);
                        out.push(Token::Escape { raw, text: t.into_string() });
                    } else {
                        pending.extend(&range, &t);
                    }
                }
                Event::SoftBreak => pending.extend(&range, "\n"),
                Event::TaskListMarker(_) => {}
                other => {
                    self.flush_text(&mut pending, &mut out);
                    let token = self.inline(other, &range);
                    out.push(token);
                }
            }
        }
        self.flush_text(&mut pending, &mut out);
        out
    }

    fn flush_text(&self, pending: &mut PendingText, out: &mut Vec<Token>) {
        let Some(range) = pending.range.take() else {
            return;
        };
        let text = std::mem::take(&mut pending.text);
        out.push(Token::Text { raw: self.slice(&range), text });
    }

    fn inline(&mut self, event: Event<'a>, range: &Range<usize>) -> Token {
        let raw = self.slice(range);
        match event {
            Event::Code(t) => Token::Codespan { raw, text: t.into_string() },
            Event::HardBreak => Token::Br { raw },
            Event::InlineHtml(_) | Event::Html(_) => Token::Html { raw },
            Event::Start(Tag::Emphasis) => Token::Em { raw, text: self.collect_text() },
            Event::Start(Tag::Strong) => Token::Strong { raw, text: self.collect_text() },
            Event::Start(Tag::Strikethrough) => Token::Del { raw, text: self.collect_text() },
            Event::Start(Tag::Link { dest_url, title, .. }) => Token::Link {
                raw,
                href: dest_url.into_string(),
                title: non_empty(&title),
                text: self.collect_text(),
            },
            Event::Start(Tag::Image { dest_url, title, .. }) => Token::Image {
                raw,
                href: dest_url.into_string(),
                title: non_empty(&title),
                text: self.collect_text(),
            },
            Event::Start(tag) => {
                let kind = tag_kind(&tag);
                self.skip_container();
                Token::Unknown { raw, kind }
            }
            other => Token::Unknown { raw, kind: debug_kind(&other) },
        }
    }
}

impl PendingText {
    fn extend(&mut self, range: &Range<usize>, text: &str) {
        self.range = Some(match self.range.take() {
            Some(existing) => existing.start..range.end.max(existing.end),
            None => range.clone(),
        });
        self.text.push_str(text);
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

fn tag_kind(tag: &Tag<'_>) -> String {
    match tag {
        Tag::FootnoteDefinition(_) => "footnote".to_owned(),
        Tag::MetadataBlock(_) => "metadata".to_owned(),
        other => debug_kind(other),
    }
}

/// Lowercased variant name from a `Debug` rendering, e.g. `DefinitionList`.
fn debug_kind(value: &impl std::fmt::Debug) -> String {
    let rendered = format!("{value:?}");
    rendered
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Visible text of an inline token sequence.
pub(crate) fn inline_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Text { text, .. }
            | Token::Escape { text, .. }
            | Token::Strong { text, .. }
            | Token::Em { text, .. }
            | Token::Del { text, .. }
            | Token::Codespan { text, .. }
            | Token::Link { text, .. }
            | Token::Image { text, .. } => out.push_str(text),
            Token::Br { .. } => out.push('\n'),
            other => out.push_str(other.raw()),
        }
    }
    out
}

fn blockquote_text(raw: &str) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed.strip_prefix('>') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .collect();
    lines.join("\n").trim_end().to_owned()
}

fn list_item(raw: String, column: usize, checked: Option<bool>) -> ListItem {
    let mut text = item_body(&raw, column);
    if checked.is_some() {
        text = strip_task_marker(&text).to_owned();
    }
    ListItem { raw, text, task: checked.is_some(), checked }
}

/// Item content with the bullet removed and continuation lines dedented.
fn item_body(raw: &str, column: usize) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default();
    let first = first.trim_start();
    let marker = bullet_marker_len(first);
    let after_marker = first.get(marker..).unwrap_or_default();
    let (body, width) = if let Some(rest) = after_marker.strip_prefix('\t') {
        // A tab after the marker pads to the next tab stop.
        (rest, next_tab_stop(column + marker))
    } else {
        let spaces = after_marker.len() - after_marker.trim_start_matches(' ').len();
        // More than four spaces after the marker means indented code; keep all but one.
        let pad = if spaces > 4 { 1 } else { spaces };
        (after_marker.get(pad..).unwrap_or_default(), column + marker + pad.max(1))
    };

    let mut out = body.to_owned();
    for line in lines {
        out.push('\n');
        out.push_str(strip_indent(line, width));
    }
    out.trim_end().to_owned()
}

fn bullet_marker_len(line: &str) -> usize {
    if line.starts_with(['-', '*', '+']) {
        return 1;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        return digits + 1;
    }
    0
}

/// Drop up to `width` columns of leading indentation, tabs counted to the next stop.
fn strip_indent(line: &str, width: usize) -> &str {
    let mut col = 0;
    for (idx, ch) in line.char_indices() {
        if col >= width {
            return &line[idx..];
        }
        match ch {
            ' ' => col += 1,
            '\t' => col = next_tab_stop(col),
            _ => return &line[idx..],
        }
    }
    ""
}

const fn next_tab_stop(col: usize) -> usize {
    (col / 4 + 1) * 4
}

fn strip_task_marker(text: &str) -> &str {
    for marker in ["[ ]", "[x]", "[X]"] {
        if let Some(rest) = text.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    text
}

/// `[label]: href "title"`
fn parse_definition(line: &str) -> Option<Token> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let rest = trimmed.strip_prefix('[')?;
    let (label, rest) = rest.split_once("]:")?;
    if label.trim().is_empty() {
        return None;
    }
    let rest = rest.trim();
    let (href, title) = match rest.split_once(char::is_whitespace) {
        Some((href, title)) => (href, Some(title.trim())),
        None => (rest, None),
    };
    let href = href.trim_start_matches('<').trim_end_matches('>');
    if href.is_empty() {
        return None;
    }
    let title = title
        .map(|t| t.trim_matches(|c| matches!(c, '"' | '\'' | '(' | ')')).to_owned())
        .filter(|t| !t.is_empty());
    Some(Token::Def {
        raw: line.to_owned(),
        label: label.trim().to_owned(),
        href: href.to_owned(),
        title,
    })
}
