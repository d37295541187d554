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

pub mod app;
pub mod apply;
pub mod codespan;
pub mod config;
pub mod error;
pub mod markdown;
pub mod nav;
pub mod transcript;
pub mod ui;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "code-md", about = "Render chat transcript markdown in the terminal", version)]
pub struct Cli {
    /// Message files, one chat message each (stdin when empty or `-`)
    pub files: Vec<PathBuf>,

    /// Thread id for the transcript (defaults to a random UUID)
    #[arg(long)]
    pub thread: Option<String>,

    /// Copy a code block to the clipboard (1-based index or apply box id)
    #[arg(long, value_name = "BLOCK")]
    pub copy: Option<String>,

    /// Apply a code block to its target file (1-based index or apply box id)
    #[arg(long, value_name = "BLOCK")]
    pub apply: Option<String>,

    /// Open the resolved location of an inline code span in the editor
    #[arg(long, value_name = "TEXT")]
    pub open: Option<String>,

    /// Print without colors or styles
    #[arg(long)]
    pub plain: bool,

    /// Output width (defaults to the terminal width)
    #[arg(long)]
    pub width: Option<u16>,

    /// Disable copy/apply controls on code blocks
    #[arg(long)]
    pub no_apply: bool,

    /// Disable code span link detection
    #[arg(long)]
    pub no_links: bool,

    /// Workspace root for link resolution (defaults to the current directory)
    #[arg(long, short = 'C')]
    pub workspace: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override one setting for this run, e.g. `--set resolve_wait_ms=500`
    #[arg(long = "set", value_name = "KEY=JSON")]
    pub set: Vec<String>,

    /// Write the settings (including `--set` overrides) back to the settings file
    #[arg(long)]
    pub save_config: bool,

    /// Write tracing diagnostics to a file (disabled unless explicitly set)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Tracing filter directives (example: `info,code_chat_markdown=debug`)
    /// Falls back to `RUST_LOG` when omitted.
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Append to `--log-file` instead of truncating on startup
    #[arg(long)]
    pub log_append: bool,
}
