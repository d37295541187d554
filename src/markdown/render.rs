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

use super::language::LanguageDetector;
use super::latex::{LatexSegment, paragraph_to_latex_segments};
use super::lexer;
use super::node::{
    CodeBlock, CodespanView, ListItemView, ListView, Node, TableCellView, TableView,
};
use super::path::{ApplyBoxLocation, ChatMessageLocation, TokenPath};
use super::token::{ColumnAlign, ListItem, TableCell, Token};
use super::uri::{basename, is_valid_uri, relative_label, separate_out_first_line};
use crate::apply::{ApplySurface, ApplyTarget};
use crate::codespan::CodespanLinks;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderTokenOptions {
    /// Attach copy/apply controls to code blocks of chat messages.
    pub is_apply_enabled: bool,
    /// Resolve inline code spans of chat messages to file/symbol links.
    pub is_link_detection_enabled: bool,
}

/// Ambient rendering context for one token.
#[derive(Debug, Clone, Default)]
pub struct TokenContext<'a> {
    /// Inside a paragraph-like wrapper; block-level spacing is suppressed.
    pub in_p_tag: bool,
    /// Fixed file for code blocks, overriding first-line detection.
    pub code_uri: Option<&'a Path>,
    pub location: Option<&'a ChatMessageLocation>,
    /// Path of this token, or for `render_markdown` the prefix of its tokens.
    pub token_idx: TokenPath,
    pub options: RenderTokenOptions,
}

/// Maps tokens to presentation nodes. Collaborators are passed in, not looked
/// up, so the renderer can run without the rest of the application.
pub struct ChatMarkdownRenderer<'a> {
    languages: &'a dyn LanguageDetector,
    links: Option<&'a CodespanLinks>,
    workspace_root: Option<&'a Path>,
}

impl<'a> ChatMarkdownRenderer<'a> {
    pub fn new(languages: &'a dyn LanguageDetector) -> Self {
        Self { languages, links: None, workspace_root: None }
    }

    #[must_use]
    pub fn with_links(mut self, links: &'a CodespanLinks) -> Self {
        self.links = Some(links);
        self
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: &'a Path) -> Self {
        self.workspace_root = Some(root);
        self
    }

    /// Lex `text` and render every top-level token. Token paths are
    /// `ctx.token_idx`-prefixed (plain indices when the prefix is empty).
    pub fn render_markdown(&self, text: &str, ctx: &TokenContext<'_>) -> Vec<Node> {
        // Bullet glyphs emitted mid-paragraph start a new paragraph.
        let source = text.replace("\n•", "\n\n•");
        let tokens = lexer::lex(&source);
        tokens
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let child = TokenContext {
                    token_idx: TokenPath::child_of(Some(&ctx.token_idx), index),
                    ..ctx.clone()
                };
                self.render_token(token, &child)
            })
            .collect()
    }

    /// Render one token. A panic while rendering is contained to this token,
    /// which is replaced by a fallback node showing its source.
    pub fn render_token(&self, token: &Token, ctx: &TokenContext<'_>) -> Node {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(token, ctx))) {
            Ok(node) => node,
            Err(_) => {
                tracing::warn!(
                    kind = token.kind(),
                    token_idx = %ctx.token_idx,
                    "token render panicked; falling back to source"
                );
                Node::Fallback { kind: token.kind().to_owned(), raw: token.raw().to_owned() }
            }
        }
    }

    fn dispatch(&self, token: &Token, ctx: &TokenContext<'_>) -> Node {
        if token.raw().trim().is_empty() {
            return Node::Empty;
        }
        match token {
            Token::Space { raw } => Node::Raw(raw.clone()),
            Token::Code { raw, text, lang } => self.code(raw, text, lang.as_deref(), ctx),
            Token::Heading { depth, text, .. } => {
                Node::Heading { level: (*depth).clamp(1, 6), text: text.clone() }
            }
            Token::Table { header, align, rows, .. } => {
                Node::Table(table_view(header, align, rows))
            }
            Token::Hr { .. } => Node::Rule,
            Token::Blockquote { text, .. } => Node::BlockQuote(text.clone()),
            Token::List { ordered, start, items, .. } => {
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.list_item(item, ctx.token_idx.child(index), ctx))
                    .collect();
                Node::List(ListView { ordered: *ordered, start: *start, items })
            }
            Token::ListItem(item) => Node::List(ListView {
                ordered: false,
                start: None,
                items: vec![self.list_item(item, ctx.token_idx.clone(), ctx)],
            }),
            Token::Paragraph { raw, tokens, .. } => self.paragraph(raw, tokens, ctx),
            Token::Text { raw, .. } | Token::Escape { raw, .. } | Token::Html { raw } => {
                Node::Raw(raw.clone())
            }
            Token::Def { .. } => Node::Empty,
            Token::Link { href, title, text, .. } => {
                Node::Link { href: href.clone(), title: title.clone(), text: text.clone() }
            }
            Token::Image { href, title, text, .. } => {
                Node::Image { src: href.clone(), alt: text.clone(), title: title.clone() }
            }
            Token::Strong { text, .. } => Node::Strong(text.clone()),
            Token::Em { text, .. } => Node::Emphasis(text.clone()),
            Token::Del { text, .. } => Node::Strikethrough(text.clone()),
            Token::Codespan { raw, text } => self.codespan(raw, text, ctx),
            Token::Br { .. } => Node::LineBreak,
            Token::Unknown { kind, .. } => Node::Unknown { kind: kind.clone() },
        }
    }

    fn code(&self, raw: &str, text: &str, lang: Option<&str>, ctx: &TokenContext<'_>) -> Node {
        let (first_line, remaining) = separate_out_first_line(text);
        let first_line_is_uri = ctx.code_uri.is_none() && is_valid_uri(first_line);
        let contents =
            if first_line_is_uri { remaining.unwrap_or_default().trim_start() } else { text };
        if contents.is_empty() {
            return Node::Empty;
        }

        let uri: Option<PathBuf> = match ctx.code_uri {
            Some(uri) => Some(uri.to_path_buf()),
            None => first_line_is_uri.then(|| PathBuf::from(first_line)),
        };
        let language = match lang.filter(|tag| !tag.is_empty()) {
            Some(tag) => self.languages.normalize_tag(tag),
            None => self.languages.detect(uri.as_deref(), contents),
        };

        if ctx.options.is_apply_enabled
            && let Some(location) = ctx.location
        {
            let apply_box_id =
                ApplyBoxLocation::new(location, ctx.token_idx.clone()).apply_box_id();
            let controls = ApplySurface {
                apply_box_id,
                code: contents.to_owned(),
                language: language.clone(),
                target: uri.map_or(ApplyTarget::CurrentEditor, ApplyTarget::File),
                can_apply: is_fence_closed(raw),
            };
            return Node::CodeBlock(CodeBlock {
                code: contents.trim_end().to_owned(),
                language,
                controls: Some(controls),
            });
        }

        Node::CodeBlock(CodeBlock { code: contents.to_owned(), language, controls: None })
    }

    fn paragraph(&self, raw: &str, tokens: &[Token], ctx: &TokenContext<'_>) -> Node {
        let segments = paragraph_to_latex_segments(raw.trim_end());
        let children = if segments.is_empty() {
            tokens
                .iter()
                .enumerate()
                .map(|(index, token)| {
                    let child = TokenContext {
                        in_p_tag: true,
                        token_idx: ctx.token_idx.child(index),
                        ..ctx.clone()
                    };
                    self.render_token(token, &child)
                })
                .collect()
        } else {
            segments
                .into_iter()
                .map(|segment| match segment {
                    LatexSegment::Text(text) => Node::Raw(text),
                    LatexSegment::Math(math) => Node::Latex(math),
                })
                .collect()
        };
        Node::Paragraph { inline: ctx.in_p_tag, children }
    }

    /// Item bodies go back through `render_markdown`, nested in a
    /// paragraph-like context, with paths prefixed by the item's own path.
    fn list_item(&self, item: &ListItem, path: TokenPath, ctx: &TokenContext<'_>) -> ListItemView {
        let nested = TokenContext { in_p_tag: true, token_idx: path, ..ctx.clone() };
        ListItemView { checked: item.checked, children: self.render_markdown(&item.text, &nested) }
    }

    fn codespan(&self, raw: &str, text: &str, ctx: &TokenContext<'_>) -> Node {
        let plain = || Node::Codespan(CodespanView::plain(text));
        if !ctx.options.is_link_detection_enabled {
            return plain();
        }
        let (Some(location), Some(links)) = (ctx.location, self.links) else {
            return plain();
        };
        // An unterminated span is still streaming in.
        if !raw.ends_with('`') {
            return plain();
        }
        let Some(link) = links.link_for(&location.thread_id, text) else {
            return plain();
        };

        let mut display = link.display_text.clone().unwrap_or_else(|| text.to_owned());
        let mut tooltip = None;
        if is_valid_uri(&display) {
            tooltip = Some(relative_label(&display, self.workspace_root));
            display = basename(&display).to_owned();
        }
        Node::Codespan(CodespanView { text: display, tooltip, link: Some(link) })
    }
}

/// A fence is closed once a line after the opening one consists of at least
/// as many fence characters as the opening run.
pub fn is_fence_closed(raw: &str) -> bool {
    let trimmed = raw.trim();
    let Some(marker) = trimmed.chars().next().filter(|c| matches!(c, '`' | '~')) else {
        return false;
    };
    let open = trimmed.chars().take_while(|&c| c == marker).count();
    if open < 3 {
        return false;
    }
    let Some((_, rest)) = trimmed.split_once('\n') else {
        return false;
    };
    let last = rest.lines().last().unwrap_or_default().trim();
    last.len() >= open && last.chars().all(|c| c == marker)
}

fn table_view(
    header: &[TableCell],
    align: &[Option<ColumnAlign>],
    rows: &[Vec<TableCell>],
) -> TableView {
    let align_at = |index: usize| align.get(index).copied().flatten().unwrap_or(ColumnAlign::Left);
    let cells = |cells: &[TableCell]| {
        cells
            .iter()
            .enumerate()
            .map(|(index, cell)| TableCellView { text: cell.raw.clone(), align: align_at(index) })
            .collect::<Vec<_>>()
    };
    TableView { header: cells(header), rows: rows.iter().map(|row| cells(row)).collect() }
}
