use async_trait::async_trait;
use code_chat_markdown::apply::{ApplyError, Clipboard};
use code_chat_markdown::codespan::{
    CodespanLinks, CodespanLocationLink, CodespanResolver, SelectionRange,
};
use code_chat_markdown::markdown::node::{self, CodeBlock};
use code_chat_markdown::markdown::{
    BuiltinLanguages, ChatMarkdownRenderer, ChatMessageLocation, Node, RenderTokenOptions,
    TokenContext,
};
use code_chat_markdown::nav::Navigator;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const THREAD: &str = "thread-1";

pub fn all_on() -> RenderTokenOptions {
    RenderTokenOptions { is_apply_enabled: true, is_link_detection_enabled: true }
}

/// Render `text` as message `message_idx` of `THREAD`, without link resolution.
pub fn render_chat(text: &str, message_idx: usize, options: RenderTokenOptions) -> Vec<Node> {
    let langs = BuiltinLanguages;
    let location = ChatMessageLocation::new(THREAD, message_idx);
    let ctx = TokenContext { location: Some(&location), options, ..TokenContext::default() };
    ChatMarkdownRenderer::new(&langs).render_markdown(text, &ctx)
}

/// Render `text` as message 0 of `THREAD` with link resolution through `links`.
pub fn render_linked(
    text: &str,
    links: &CodespanLinks,
    root: &Path,
    options: RenderTokenOptions,
) -> Vec<Node> {
    let langs = BuiltinLanguages;
    let location = ChatMessageLocation::new(THREAD, 0);
    let ctx = TokenContext { location: Some(&location), options, ..TokenContext::default() };
    ChatMarkdownRenderer::new(&langs)
        .with_links(links)
        .with_workspace_root(root)
        .render_markdown(text, &ctx)
}

pub fn visible(nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().filter(|n| *n != Node::Empty).collect()
}

pub fn single_block(nodes: &[Node]) -> &CodeBlock {
    let blocks = node::code_blocks(nodes);
    assert_eq!(blocks.len(), 1, "expected one code block in {nodes:?}");
    blocks[0]
}

pub fn file_link(path: &str) -> CodespanLocationLink {
    CodespanLocationLink {
        display_text: Some(path.to_owned()),
        uri: Some(PathBuf::from(path)),
        selection: None,
    }
}

/// Resolver answering from a fixed table; unknown spans resolve to no link.
pub struct TableResolver {
    links: HashMap<String, CodespanLocationLink>,
    pub calls: Cell<usize>,
}

impl TableResolver {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, CodespanLocationLink)>) -> Rc<Self> {
        Rc::new(Self {
            links: entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
            calls: Cell::new(0),
        })
    }
}

#[async_trait(?Send)]
impl CodespanResolver for TableResolver {
    async fn resolve(
        &self,
        codespan: &str,
        _thread_id: &str,
    ) -> anyhow::Result<CodespanLocationLink> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.links.get(codespan).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingClipboard(pub Vec<String>);

impl Clipboard for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ApplyError> {
        self.0.push(text.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator(pub Vec<(PathBuf, Option<SelectionRange>)>);

impl Navigator for RecordingNavigator {
    fn open(&mut self, uri: &Path, selection: Option<SelectionRange>) -> anyhow::Result<()> {
        self.0.push((uri.to_path_buf(), selection));
        Ok(())
    }
}
