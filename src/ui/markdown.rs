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

use super::tables;
use super::theme;
use crate::apply::{ApplyStates, ApplyTarget};
use crate::markdown::node::{CodeBlock, ListView, Node};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Turns a rendered node tree into terminal lines.
pub struct LineRenderer<'a> {
    width: u16,
    apply_states: Option<&'a ApplyStates>,
}

impl<'a> LineRenderer<'a> {
    pub fn new(width: u16) -> Self {
        Self { width, apply_states: None }
    }

    #[must_use]
    pub fn with_apply_states(mut self, states: &'a ApplyStates) -> Self {
        self.apply_states = Some(states);
        self
    }

    /// Top-level blocks, separated by blank lines.
    pub fn render(&self, nodes: &[Node]) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        self.blocks(nodes, true, &mut out);
        while out.last().is_some_and(|line| line.spans.is_empty()) {
            out.pop();
        }
        out
    }

    fn blocks(&self, nodes: &[Node], spaced: bool, out: &mut Vec<Line<'static>>) {
        for node in nodes {
            let start = out.len();
            self.block(node, out);
            if spaced && out.len() > start {
                out.push(Line::default());
            }
        }
    }

    fn block(&self, node: &Node, out: &mut Vec<Line<'static>>) {
        match node {
            Node::Empty => {}
            Node::Raw(text) => {
                for line in text.trim_end_matches('\n').split('\n') {
                    out.push(Line::from(line.to_owned()));
                }
            }
            Node::CodeBlock(block) => self.code_block(block, out),
            Node::Heading { level, text } => {
                let style = theme::heading_style(*level);
                out.push(Line::from(Span::styled(text.clone(), style)));
                if *level <= 2 {
                    let rule = if *level == 1 {
                        theme::HEADING_RULE_CHAR
                    } else {
                        theme::SEPARATOR_CHAR
                    };
                    let len = UnicodeWidthStr::width(text.as_str()).max(1);
                    let rule_style = style.remove_modifier(Modifier::BOLD);
                    out.push(Line::from(Span::styled(rule.repeat(len), rule_style)));
                }
            }
            Node::Table(table) => out.extend(tables::render_table_lines(table, self.width)),
            Node::Rule => out.push(Line::from(Span::styled(
                theme::SEPARATOR_CHAR.repeat(usize::from(self.width).max(3)),
                Style::default().fg(theme::DIM),
            ))),
            Node::BlockQuote(text) => {
                for line in text.lines() {
                    out.push(Line::from(vec![
                        Span::styled(theme::QUOTE_BAR, Style::default().fg(theme::DIM)),
                        Span::styled(
                            line.to_owned(),
                            Style::default().add_modifier(Modifier::ITALIC),
                        ),
                    ]));
                }
            }
            Node::List(list) => self.list(list, out),
            Node::Paragraph { children, .. } => self.paragraph(children, out),
            inline => self.paragraph(std::slice::from_ref(inline), out),
        }
    }

    fn paragraph(&self, children: &[Node], out: &mut Vec<Line<'static>>) {
        let mut writer = InlineWriter::default();
        for child in children {
            if is_block(child) {
                writer.finish_into(out);
                self.block(child, out);
            } else {
                inline(child, &mut writer);
            }
        }
        writer.finish_into(out);
    }

    fn code_block(&self, block: &CodeBlock, out: &mut Vec<Line<'static>>) {
        let border = Style::default().fg(theme::CODE_BORDER);
        let dim = Style::default().fg(theme::DIM);
        let accent = Style::default().fg(theme::RUST_ORANGE);

        let mut header = vec![
            Span::styled("╭─ ", border),
            Span::styled(block.language.clone(), dim.add_modifier(Modifier::BOLD)),
        ];
        if let Some(controls) = &block.controls {
            header.push(Span::styled(format!("  [{}]", controls.apply_box_id), dim));
            header.push(Span::styled("  copy", accent));
            if controls.can_apply {
                header.push(Span::styled("  apply", accent));
            } else {
                header.push(Span::styled("  apply (streaming)", dim));
            }
            if let ApplyTarget::File(path) = &controls.target {
                header.push(Span::styled(format!(" → {}", path.display()), dim));
            }
            let status = self.apply_states.map(|states| states.get(&controls.apply_box_id));
            if let Some((label, color)) = status.map(theme::apply_status_label)
                && !label.is_empty()
            {
                header.push(Span::styled(format!("  {label}"), Style::default().fg(color)));
            }
        }
        out.push(Line::from(header));

        for line in block.code.trim_end_matches('\n').split('\n') {
            out.push(Line::from(vec![
                Span::styled("│ ", border),
                Span::styled(line.to_owned(), theme::code_style()),
            ]));
        }
        out.push(Line::from(Span::styled("╰─", border)));
    }

    fn list(&self, list: &ListView, out: &mut Vec<Line<'static>>) {
        let marker_style = Style::default().fg(theme::DIM);
        let mut number = list.start.unwrap_or(1);
        for item in &list.items {
            let marker =
                if list.ordered { format!("{number}. ") } else { format!("{} ", theme::BULLET) };
            number = number.saturating_add(1);
            let checkbox = match item.checked {
                Some(true) => format!("{} ", theme::ICON_CHECKED),
                Some(false) => format!("{} ", theme::ICON_UNCHECKED),
                None => String::new(),
            };
            let prefix = format!("{marker}{checkbox}");
            let indent = " ".repeat(UnicodeWidthStr::width(prefix.as_str()));

            let mut body = Vec::new();
            self.blocks(&item.children, false, &mut body);
            if body.is_empty() {
                body.push(Line::default());
            }
            for (idx, line) in body.into_iter().enumerate() {
                let lead = if idx == 0 {
                    Span::styled(prefix.clone(), marker_style)
                } else {
                    Span::raw(indent.clone())
                };
                let style = line.style;
                let mut spans = vec![lead];
                spans.extend(line.spans);
                out.push(Line::from(spans).style(style));
            }
        }
    }
}

fn is_block(node: &Node) -> bool {
    matches!(
        node,
        Node::CodeBlock(_)
            | Node::Heading { .. }
            | Node::Table(_)
            | Node::Rule
            | Node::BlockQuote(_)
            | Node::List(_)
            | Node::Paragraph { .. }
    )
}

fn inline(node: &Node, w: &mut InlineWriter) {
    let dim = Style::default().fg(theme::DIM);
    let link = Style::default().fg(theme::LINK).add_modifier(Modifier::UNDERLINED);
    match node {
        Node::Raw(text) => w.push(text, Style::default()),
        Node::Latex(math) => {
            w.push(math, Style::default().fg(theme::LATEX).add_modifier(Modifier::ITALIC));
        }
        Node::Link { href, title, text } => {
            w.push(text, link);
            if href != text {
                w.push(&format!(" ({href})"), dim);
            }
            if let Some(title) = title {
                w.push(&format!(" \"{title}\""), dim);
            }
        }
        Node::Image { src, alt, title } => {
            w.push(&format!("[image: {alt}]"), link);
            w.push(&format!(" ({src})"), dim);
            if let Some(title) = title {
                w.push(&format!(" \"{title}\""), dim);
            }
        }
        Node::Strong(text) => w.push(text, Style::default().add_modifier(Modifier::BOLD)),
        Node::Emphasis(text) => w.push(text, Style::default().add_modifier(Modifier::ITALIC)),
        Node::Strikethrough(text) => {
            w.push(text, Style::default().add_modifier(Modifier::CROSSED_OUT));
        }
        Node::Codespan(view) => {
            let style = if view.link.is_some() {
                theme::code_style().patch(link)
            } else {
                theme::code_style()
            };
            w.push(&view.text, style);
            if let Some(tooltip) = &view.tooltip {
                w.push(&format!(" ({tooltip})"), dim);
            }
        }
        Node::LineBreak => w.break_line(),
        Node::Unknown { kind } => {
            w.push(&format!("[unsupported markdown: {kind}]"), Style::default().fg(theme::WARN));
        }
        Node::Fallback { raw, .. } => w.push(raw, Style::default().fg(theme::WARN)),
        _ => {}
    }
}

/// Accumulates inline spans, splitting lines on embedded newlines.
#[derive(Default)]
struct InlineWriter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
}

impl InlineWriter {
    fn push(&mut self, text: &str, style: Style) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.span(first, style);
        }
        for part in parts {
            self.break_line();
            self.span(part, style);
        }
    }

    fn span(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.spans.push(Span::styled(text.to_owned(), style));
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn finish_into(&mut self, out: &mut Vec<Line<'static>>) {
        if !self.spans.is_empty() {
            self.break_line();
        }
        out.append(&mut self.lines);
    }
}
