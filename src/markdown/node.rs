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

//! Presentation tree produced by the renderer and consumed by the view layer.

use super::token::ColumnAlign;
use crate::apply::ApplySurface;
use crate::codespan::CodespanLocationLink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Renders nothing (blank tokens, link reference definitions).
    Empty,
    /// Raw source passed through as a span.
    Raw(String),
    CodeBlock(CodeBlock),
    Heading {
        level: u8,
        text: String,
    },
    Table(TableView),
    Rule,
    BlockQuote(String),
    List(ListView),
    Paragraph {
        /// `true` when nested in a paragraph-like wrapper (list item, outer
        /// paragraph), where block-level spacing is suppressed.
        inline: bool,
        children: Vec<Node>,
    },
    /// Delimited math shown as literal source.
    Latex(String),
    Link {
        href: String,
        title: Option<String>,
        text: String,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    Strong(String),
    Emphasis(String),
    Strikethrough(String),
    Codespan(CodespanView),
    LineBreak,
    /// Visible marker for tokens the renderer has no rule for.
    Unknown {
        kind: String,
    },
    /// Substituted when rendering a token failed; shows the token source.
    Fallback {
        kind: String,
        raw: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Code as displayed.
    pub code: String,
    pub language: String,
    /// Apply/copy controls, present only when apply is enabled for a chat message.
    pub controls: Option<ApplySurface>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCellView {
    pub text: String,
    pub align: ColumnAlign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub header: Vec<TableCellView>,
    pub rows: Vec<Vec<TableCellView>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemView {
    pub checked: Option<bool>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub ordered: bool,
    pub start: Option<u64>,
    pub items: Vec<ListItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodespanView {
    pub text: String,
    /// Hover text; set for resolved links that point at a file path.
    pub tooltip: Option<String>,
    pub link: Option<CodespanLocationLink>,
}

impl CodespanView {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), tooltip: None, link: None }
    }
}

impl Node {
    /// Depth-first visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        match self {
            Self::Paragraph { children, .. } => {
                for child in children {
                    child.walk(visit);
                }
            }
            Self::List(list) => {
                for child in list.items.iter().flat_map(|item| &item.children) {
                    child.walk(visit);
                }
            }
            _ => {}
        }
    }
}

/// All code blocks in render order.
pub fn code_blocks(nodes: &[Node]) -> Vec<&CodeBlock> {
    let mut out = Vec::new();
    for node in nodes {
        node.walk(&mut |n| {
            if let Node::CodeBlock(block) = n {
                out.push(block);
            }
        });
    }
    out
}

/// All inline code spans in render order.
pub fn codespans(nodes: &[Node]) -> Vec<&CodespanView> {
    let mut out = Vec::new();
    for node in nodes {
        node.walk(&mut |n| {
            if let Node::Codespan(view) = n {
                out.push(view);
            }
        });
    }
    out
}
