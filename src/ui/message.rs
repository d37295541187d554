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

use super::markdown::LineRenderer;
use super::theme;
use crate::apply::ApplyStates;
use crate::markdown::{ChatMarkdownRenderer, RenderTokenOptions};
use crate::transcript::ChatTranscript;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::panic::{self, AssertUnwindSafe};

/// What a transcript render needs besides the transcript itself.
pub struct RenderEnv<'a> {
    pub renderer: &'a ChatMarkdownRenderer<'a>,
    pub options: RenderTokenOptions,
    pub apply_states: &'a ApplyStates,
    pub width: u16,
}

/// Render every message, reusing cached lines for messages that were not
/// invalidated since their last render.
pub fn render_transcript(
    transcript: &mut ChatTranscript,
    env: &RenderEnv<'_>,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for idx in 0..transcript.len() {
        out.push(Line::from(Span::styled(
            "Assistant",
            Style::default().fg(theme::RUST_ORANGE).add_modifier(Modifier::BOLD),
        )));

        if let Some(cached) = transcript.messages()[idx].cache.get() {
            out.extend_from_slice(cached);
        } else {
            let fresh = render_message_safe(transcript, idx, env);
            let message = &mut transcript.messages_mut()[idx];
            message.cache.store(fresh);
            if let Some(stored) = message.cache.get() {
                out.extend_from_slice(stored);
            }
        }

        // Blank separator between messages
        out.push(Line::default());
    }
    out
}

fn render_message_safe(
    transcript: &ChatTranscript,
    idx: usize,
    env: &RenderEnv<'_>,
) -> Vec<Line<'static>> {
    let text = transcript.messages()[idx].text();
    render_safe_with(text, || {
        let nodes = transcript.render_nodes(idx, env.renderer, env.options);
        LineRenderer::new(env.width).with_apply_states(env.apply_states).render(&nodes)
    })
}

fn render_safe_with<F>(text: &str, render: F) -> Vec<Line<'static>>
where
    F: FnOnce() -> Vec<Line<'static>>,
{
    if let Ok(lines) = panic::catch_unwind(AssertUnwindSafe(render)) {
        lines
    } else {
        tracing::warn!("message render panicked; falling back to plain text");
        plain_text_fallback(text)
    }
}

fn plain_text_fallback(text: &str) -> Vec<Line<'static>> {
    text.split('\n').map(|line| Line::from(line.to_owned())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::BuiltinLanguages;
    use crate::ui::terminal::line_text;

    #[test]
    fn falls_back_to_plain_text_when_rendering_panics() {
        let lines = render_safe_with("line1\nline2", || panic!("forced render panic"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content.as_ref(), "line1");
        assert_eq!(lines[1].spans[0].content.as_ref(), "line2");
    }

    #[test]
    fn messages_are_cached_until_invalidated() {
        let langs = BuiltinLanguages;
        let renderer = ChatMarkdownRenderer::new(&langs);
        let states = ApplyStates::default();
        let env = RenderEnv {
            renderer: &renderer,
            options: RenderTokenOptions::default(),
            apply_states: &states,
            width: 60,
        };
        let mut transcript = ChatTranscript::new("t1");
        transcript.push_message("first");
        transcript.push_message("second");

        let lines = render_transcript(&mut transcript, &env);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["Assistant", "first", "", "Assistant", "second", ""]);
        assert!(transcript.messages().iter().all(|m| m.cache.get().is_some()));

        transcript.append(1, " part");
        let lines = render_transcript(&mut transcript, &env);
        assert_eq!(line_text(&lines[4]), "second part");
    }
}
