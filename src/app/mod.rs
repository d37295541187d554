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

mod actions;
mod settings;

pub use actions::BlockSelector;
pub use settings::load_settings;

use crate::Cli;
use crate::apply::{ApplyStates, FileApplier, SystemClipboard};
use crate::codespan::{CodespanLinks, LinkEvent, WorkspaceResolver};
use crate::config::Settings;
use crate::error::AppError;
use crate::markdown::{BuiltinLanguages, ChatMarkdownRenderer};
use crate::nav::EditorNavigator;
use crate::transcript::ChatTranscript;
use crate::ui::{self, RenderEnv};
use ratatui::text::Line;
use std::io::{IsTerminal as _, Read as _};
use std::path::PathBuf;
use std::rc::Rc;
use tokio::sync::mpsc;

pub struct App {
    pub settings: Settings,
    pub transcript: ChatTranscript,
    pub apply_states: ApplyStates,
    links: CodespanLinks,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    languages: BuiltinLanguages,
    workspace_root: PathBuf,
    width: u16,
}

/// Build the app for one thread. `messages` become the thread's messages in order.
pub fn create_app(settings: Settings, thread_id: String, messages: Vec<String>) -> App {
    let workspace_root = settings
        .workspace_root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let resolver = Rc::new(WorkspaceResolver::new(workspace_root.clone(), settings.max_scan_files));
    let (links, link_rx) = CodespanLinks::new(resolver);

    let mut transcript = ChatTranscript::new(thread_id);
    for text in messages {
        transcript.push_message(text);
    }
    let width = settings.width.unwrap_or_else(ui::terminal::terminal_width);

    App {
        settings,
        transcript,
        apply_states: ApplyStates::default(),
        links,
        link_rx,
        languages: BuiltinLanguages,
        workspace_root,
        width,
    }
}

impl App {
    pub fn links(&self) -> &CodespanLinks {
        &self.links
    }

    /// Render the transcript. Unseen code spans start resolving as a side effect.
    pub fn render(&mut self) -> Vec<Line<'static>> {
        let renderer = ChatMarkdownRenderer::new(&self.languages)
            .with_links(&self.links)
            .with_workspace_root(&self.workspace_root);
        let env = RenderEnv {
            renderer: &renderer,
            options: self.settings.render_options(),
            apply_states: &self.apply_states,
            width: self.width,
        };
        ui::render_transcript(&mut self.transcript, &env)
    }

    /// Wait (up to `resolve_wait_ms`) for in-flight link resolutions,
    /// re-rendering on each link event. Returns the number of events handled.
    /// Must run inside a `LocalSet`.
    pub async fn settle_links(&mut self) -> usize {
        let deadline = tokio::time::Instant::now() + self.settings.resolve_wait();
        let mut handled = 0;
        while self.links.pending_count() > 0 {
            match tokio::time::timeout_at(deadline, self.link_rx.recv()).await {
                Ok(Some(event)) => {
                    self.transcript.handle_link_event(&event);
                    handled += 1;
                    self.render();
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(pending = self.links.pending_count(), "link wait timed out");
                    break;
                }
            }
        }
        while let Ok(event) = self.link_rx.try_recv() {
            self.transcript.handle_link_event(&event);
            handled += 1;
        }
        handled
    }
}

/// Read message sources: each path is one message; `-` or no paths reads stdin.
pub fn read_messages(files: &[PathBuf]) -> Result<Vec<String>, AppError> {
    let read_stdin = || {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map(|_| text)
            .map_err(|e| AppError::InputUnreadable(format!("stdin: {e}")))
    };
    if files.is_empty() {
        return Ok(vec![read_stdin()?]);
    }
    files
        .iter()
        .map(|path| {
            if path.as_os_str() == "-" {
                read_stdin()
            } else {
                std::fs::read_to_string(path)
                    .map_err(|e| AppError::InputUnreadable(format!("{}: {e}", path.display())))
            }
        })
        .collect()
}

/// The `code-md` command. Must run inside a `LocalSet`.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli)?;
    let messages = read_messages(&cli.files)?;
    let thread_id = cli.thread.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::info!(%thread_id, messages = messages.len(), "rendering transcript");

    let mut app = create_app(settings, thread_id, messages);
    app.render();
    if let Some(text) = &cli.open {
        app.links.request(app.transcript.thread_id(), text);
    }
    app.settle_links().await;

    if let Some(selector) = &cli.copy {
        app.copy_block(&BlockSelector::parse(selector), &mut SystemClipboard)?;
    }
    if let Some(selector) = &cli.apply {
        app.apply_block(&BlockSelector::parse(selector), &mut FileApplier)?;
    }
    if cli.copy.is_some() || cli.apply.is_some() {
        app.transcript.invalidate_all();
    }

    let lines = app.render();
    let color = !cli.plain && std::io::stdout().is_terminal();
    ui::terminal::write_lines(&mut std::io::stdout().lock(), &lines, color)?;

    if let Some(text) = &cli.open {
        app.open_codespan(text, &mut EditorNavigator::from_env())?;
    }
    Ok(())
}
