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

//! Typed markdown tokens, produced fresh by the lexer on every render pass.

/// Column alignment declared by a table's separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Cell source with surrounding pipes and whitespace removed.
    pub raw: String,
}

impl TableCell {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub raw: String,
    /// Item body with the bullet, indentation and task marker removed.
    /// Re-lexed by the renderer, so nested blocks survive.
    pub text: String,
    pub task: bool,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Space {
        raw: String,
    },
    Code {
        raw: String,
        /// Block body without the fences and without the final newline.
        text: String,
        /// First word of the fence info string; `None` when empty.
        lang: Option<String>,
    },
    Heading {
        raw: String,
        depth: u8,
        text: String,
        tokens: Vec<Token>,
    },
    Table {
        raw: String,
        header: Vec<TableCell>,
        align: Vec<Option<ColumnAlign>>,
        rows: Vec<Vec<TableCell>>,
    },
    Hr {
        raw: String,
    },
    Blockquote {
        raw: String,
        text: String,
    },
    List {
        raw: String,
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    ListItem(ListItem),
    Paragraph {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    Text {
        raw: String,
        text: String,
    },
    Escape {
        raw: String,
        text: String,
    },
    Html {
        raw: String,
    },
    Def {
        raw: String,
        label: String,
        href: String,
        title: Option<String>,
    },
    Link {
        raw: String,
        href: String,
        title: Option<String>,
        text: String,
    },
    Image {
        raw: String,
        href: String,
        title: Option<String>,
        text: String,
    },
    Strong {
        raw: String,
        text: String,
    },
    Em {
        raw: String,
        text: String,
    },
    Codespan {
        raw: String,
        text: String,
    },
    Br {
        raw: String,
    },
    Del {
        raw: String,
        text: String,
    },
    /// Anything the grammar above has no variant for. `kind` names the construct.
    Unknown {
        raw: String,
        kind: String,
    },
}

impl Token {
    pub fn raw(&self) -> &str {
        match self {
            Self::Space { raw }
            | Self::Code { raw, .. }
            | Self::Heading { raw, .. }
            | Self::Table { raw, .. }
            | Self::Hr { raw }
            | Self::Blockquote { raw, .. }
            | Self::List { raw, .. }
            | Self::Paragraph { raw, .. }
            | Self::Text { raw, .. }
            | Self::Escape { raw, .. }
            | Self::Html { raw }
            | Self::Def { raw, .. }
            | Self::Link { raw, .. }
            | Self::Image { raw, .. }
            | Self::Strong { raw, .. }
            | Self::Em { raw, .. }
            | Self::Codespan { raw, .. }
            | Self::Br { raw }
            | Self::Del { raw, .. }
            | Self::Unknown { raw, .. } => raw,
            Self::ListItem(item) => &item.raw,
        }
    }

    /// Short kind name, used in logs and fallback markers.
    pub fn kind(&self) -> &str {
        match self {
            Self::Space { .. } => "space",
            Self::Code { .. } => "code",
            Self::Heading { .. } => "heading",
            Self::Table { .. } => "table",
            Self::Hr { .. } => "hr",
            Self::Blockquote { .. } => "blockquote",
            Self::List { .. } => "list",
            Self::ListItem(_) => "list_item",
            Self::Paragraph { .. } => "paragraph",
            Self::Text { .. } => "text",
            Self::Escape { .. } => "escape",
            Self::Html { .. } => "html",
            Self::Def { .. } => "def",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::Strong { .. } => "strong",
            Self::Em { .. } => "em",
            Self::Codespan { .. } => "codespan",
            Self::Br { .. } => "br",
            Self::Del { .. } => "del",
            Self::Unknown { kind, .. } => kind,
        }
    }
}
