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

//! Markdown of chat messages: tokens, the renderer that turns them into a
//! presentation tree, and the heuristics it shares with link resolution.

pub mod language;
pub mod latex;
pub mod lexer;
pub mod node;
pub mod path;
pub mod render;
pub mod token;
pub mod uri;

pub use language::{BuiltinLanguages, LanguageDetector};
pub use node::Node;
pub use path::{ApplyBoxLocation, ChatMessageLocation, TokenPath};
pub use render::{ChatMarkdownRenderer, RenderTokenOptions, TokenContext};
pub use token::Token;
