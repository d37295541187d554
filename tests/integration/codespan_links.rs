// =====
// TESTS: 7
// =====
//
// Code span link resolution as seen through rendering: first paint is the
// raw span, a later render after the link event shows the resolved link.

use code_chat_markdown::codespan::{CodespanLinks, CodespanLocationLink, LinkEvent, LinkLookup};
use code_chat_markdown::markdown::RenderTokenOptions;
use code_chat_markdown::markdown::node::{self, CodespanView};
use code_chat_markdown::transcript::ChatTranscript;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tokio::task::LocalSet;

use crate::helpers::{THREAD, TableResolver, all_on, file_link, render_linked};

const ROOT: &str = "/repo";

#[tokio::test]
async fn first_render_is_raw_then_resolved_basename_with_tooltip() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([("src/main.rs", file_link("/repo/src/main.rs"))]);
            let (links, mut events) = CodespanLinks::new(resolver.clone());
            let text = "Open `src/main.rs` now";

            let first = render_linked(text, &links, Path::new(ROOT), all_on());
            assert_eq!(node::codespans(&first), vec![&CodespanView::plain("src/main.rs")]);

            let event = events.recv().await.expect("link event");
            assert_eq!(event, LinkEvent {
                thread_id: THREAD.to_owned(),
                codespan: "src/main.rs".to_owned()
            });

            let second = render_linked(text, &links, Path::new(ROOT), all_on());
            let spans = node::codespans(&second);
            assert_eq!(spans[0].text, "main.rs");
            assert_eq!(spans[0].tooltip.as_deref(), Some("src/main.rs"));
            assert_eq!(
                spans[0].link.as_ref().and_then(|l| l.uri.clone()),
                Some(PathBuf::from("/repo/src/main.rs"))
            );
            assert_eq!(resolver.calls.get(), 1);
        })
        .await;
}

#[tokio::test]
async fn unresolvable_span_stays_plain_and_is_never_retried() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([]);
            let (links, mut events) = CodespanLinks::new(resolver.clone());
            let text = "Try `cargo build` first";

            render_linked(text, &links, Path::new(ROOT), all_on());
            events.recv().await.expect("link event");
            assert_eq!(links.lookup(THREAD, "cargo build"), LinkLookup::NoLink);

            let again = render_linked(text, &links, Path::new(ROOT), all_on());
            assert_eq!(node::codespans(&again), vec![&CodespanView::plain("cargo build")]);
            assert_eq!(resolver.calls.get(), 1);
            assert_eq!(links.pending_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn unterminated_span_is_not_requested() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([]);
            let (links, _events) = CodespanLinks::new(resolver.clone());
            let nodes = render_linked("Open `src/main.rs", &links, Path::new(ROOT), all_on());
            assert!(node::codespans(&nodes).is_empty());
            assert_eq!(links.pending_count(), 0);
            assert_eq!(links.lookup(THREAD, "src/main.rs"), LinkLookup::Unknown);
        })
        .await;
}

#[tokio::test]
async fn disabled_link_detection_never_requests() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([("main.rs", file_link("/repo/main.rs"))]);
            let (links, _events) = CodespanLinks::new(resolver.clone());
            let options =
                RenderTokenOptions { is_apply_enabled: true, is_link_detection_enabled: false };
            let nodes = render_linked("See `main.rs`", &links, Path::new(ROOT), options);
            assert_eq!(node::codespans(&nodes), vec![&CodespanView::plain("main.rs")]);
            assert_eq!(links.lookup(THREAD, "main.rs"), LinkLookup::Unknown);
        })
        .await;
}

#[tokio::test]
async fn non_path_display_text_is_shown_verbatim() {
    LocalSet::new()
        .run_until(async {
            let link = CodespanLocationLink {
                display_text: Some("Parser::new".to_owned()),
                uri: Some(PathBuf::from("/repo/src/parser.rs")),
                selection: None,
            };
            let resolver = TableResolver::new([]);
            let (links, _events) = CodespanLinks::new(resolver);
            links.add(THREAD, "Parser::new()", Some(link));

            let nodes = render_linked("Call `Parser::new()`", &links, Path::new(ROOT), all_on());
            let spans = node::codespans(&nodes);
            assert_eq!(spans[0].text, "Parser::new");
            assert_eq!(spans[0].tooltip, None);
        })
        .await;
}

#[tokio::test]
async fn links_are_scoped_to_their_thread() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([]);
            let (links, _events) = CodespanLinks::new(resolver);
            links.add("other-thread", "main.rs", Some(file_link("/repo/main.rs")));
            assert_eq!(links.lookup(THREAD, "main.rs"), LinkLookup::Unknown);
            links.forget_thread("other-thread");
            assert_eq!(links.lookup("other-thread", "main.rs"), LinkLookup::Unknown);
        })
        .await;
}

#[tokio::test]
async fn link_events_invalidate_only_messages_mentioning_the_span() {
    LocalSet::new()
        .run_until(async {
            let resolver = TableResolver::new([("main.rs", file_link("/repo/main.rs"))]);
            let (links, mut events) = CodespanLinks::new(resolver);
            let mut transcript = ChatTranscript::new(THREAD);
            transcript.push_message("Edit `main.rs`");
            transcript.push_message("Unrelated");
            for message in transcript.messages_mut() {
                message.cache.store(Vec::new());
            }

            links.request(THREAD, "main.rs");
            let event = events.recv().await.expect("link event");
            assert_eq!(transcript.handle_link_event(&event), 1);
            assert!(transcript.messages()[0].cache.get().is_none());
            assert!(transcript.messages()[1].cache.get().is_some());
        })
        .await;
}
