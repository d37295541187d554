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

use crate::codespan::LinkEvent;
use crate::markdown::node::{self, CodeBlock};
use crate::markdown::{
    ChatMarkdownRenderer, ChatMessageLocation, Node, RenderTokenOptions, TokenContext,
};
use ratatui::text::Line;

/// Cached rendered lines for one message.
///
/// Version starts at 0 with no lines. `invalidate()` bumps the version; a
/// non-zero version means the lines are stale until the next `store()`.
#[derive(Debug, Default)]
pub struct BlockCache {
    version: u64,
    lines: Option<Vec<Line<'static>>>,
}

impl BlockCache {
    pub fn invalidate(&mut self) {
        self.version += 1;
    }

    #[must_use]
    pub fn get(&self) -> Option<&Vec<Line<'static>>> {
        if self.version == 0 { self.lines.as_ref() } else { None }
    }

    pub fn store(&mut self, lines: Vec<Line<'static>>) {
        self.lines = Some(lines);
        self.version = 0;
    }
}

#[derive(Debug)]
pub struct ChatMessage {
    text: String,
    pub cache: BlockCache,
}

impl ChatMessage {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One chat thread: ordered assistant messages sharing a thread id.
#[derive(Debug)]
pub struct ChatTranscript {
    thread_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self { thread_id: thread_id.into(), messages: Vec::new() }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Append a message and return its index.
    pub fn push_message(&mut self, text: impl Into<String>) -> usize {
        self.messages.push(ChatMessage { text: text.into(), cache: BlockCache::default() });
        self.messages.len() - 1
    }

    /// Append a streamed chunk to message `idx`. Returns `false` for an
    /// unknown index.
    pub fn append(&mut self, idx: usize, chunk: &str) -> bool {
        let Some(message) = self.messages.get_mut(idx) else {
            return false;
        };
        message.text.push_str(chunk);
        message.cache.invalidate();
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut [ChatMessage] {
        &mut self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn location(&self, idx: usize) -> ChatMessageLocation {
        ChatMessageLocation::new(self.thread_id.clone(), idx)
    }

    /// Invalidate the messages a resolved code span can affect: those of this
    /// thread whose text contains the span. Returns how many were invalidated.
    pub fn handle_link_event(&mut self, event: &LinkEvent) -> usize {
        if event.thread_id != self.thread_id {
            return 0;
        }
        let mut invalidated = 0;
        for message in &mut self.messages {
            if message.text.contains(event.codespan.as_str()) {
                message.cache.invalidate();
                invalidated += 1;
            }
        }
        tracing::debug!(
            thread_id = %event.thread_id,
            codespan = %event.codespan,
            invalidated,
            "link event"
        );
        invalidated
    }

    pub fn invalidate_all(&mut self) {
        for message in &mut self.messages {
            message.cache.invalidate();
        }
    }

    /// Render message `idx` as a chat message of this thread.
    pub fn render_nodes(
        &self,
        idx: usize,
        renderer: &ChatMarkdownRenderer<'_>,
        options: RenderTokenOptions,
    ) -> Vec<Node> {
        let Some(message) = self.messages.get(idx) else {
            return Vec::new();
        };
        let location = self.location(idx);
        let ctx = TokenContext { location: Some(&location), options, ..TokenContext::default() };
        renderer.render_markdown(&message.text, &ctx)
    }

    /// Every code block of the thread in display order.
    pub fn code_blocks(
        &self,
        renderer: &ChatMarkdownRenderer<'_>,
        options: RenderTokenOptions,
    ) -> Vec<CodeBlock> {
        (0..self.messages.len())
            .flat_map(|idx| {
                let nodes = self.render_nodes(idx, renderer, options);
                node::code_blocks(&nodes).into_iter().cloned().collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(thread_id: &str, codespan: &str) -> LinkEvent {
        LinkEvent { thread_id: thread_id.to_owned(), codespan: codespan.to_owned() }
    }

    fn fresh(transcript: &mut ChatTranscript) {
        for message in transcript.messages_mut() {
            message.cache.store(vec![Line::from("x")]);
        }
    }

    #[test]
    fn cache_starts_empty_and_goes_stale_on_invalidate() {
        let mut cache = BlockCache::default();
        assert!(cache.get().is_none());
        cache.store(vec![Line::from("a")]);
        assert_eq!(cache.get().map(Vec::len), Some(1));
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn link_events_invalidate_only_matching_messages() {
        let mut transcript = ChatTranscript::new("t1");
        transcript.push_message("see `main.rs`");
        transcript.push_message("nothing here");
        fresh(&mut transcript);

        assert_eq!(transcript.handle_link_event(&event("t1", "main.rs")), 1);
        assert!(transcript.messages()[0].cache.get().is_none());
        assert!(transcript.messages()[1].cache.get().is_some());
    }

    #[test]
    fn link_events_of_other_threads_are_ignored() {
        let mut transcript = ChatTranscript::new("t1");
        transcript.push_message("see `main.rs`");
        fresh(&mut transcript);
        assert_eq!(transcript.handle_link_event(&event("t2", "main.rs")), 0);
        assert!(transcript.messages()[0].cache.get().is_some());
    }

    #[test]
    fn streaming_append_invalidates_the_message() {
        let mut transcript = ChatTranscript::new("t1");
        let idx = transcript.push_message("```rs\nfn a()");
        fresh(&mut transcript);
        assert!(transcript.append(idx, " {}\n```"));
        assert!(!transcript.append(7, "x"));
        assert_eq!(transcript.messages()[idx].text(), "```rs\nfn a() {}\n```");
        assert!(transcript.messages()[idx].cache.get().is_none());
    }
}
