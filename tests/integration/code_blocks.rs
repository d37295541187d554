// =====
// TESTS: 10
// =====
//
// Code block rendering: URI first lines, language selection, and the
// copy/apply surface for streamed and finished fences.

use code_chat_markdown::apply::{ApplyError, ApplyTarget, FileApplier};
use code_chat_markdown::markdown::RenderTokenOptions;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

use crate::helpers::{RecordingClipboard, all_on, render_chat, single_block, visible};

#[test]
fn unterminated_fence_offers_copy_but_not_apply() {
    let nodes = render_chat("```js\nconsole.log(1)", 0, all_on());
    let block = single_block(&nodes);
    assert_eq!(block.language, "javascript");
    let controls = block.controls.as_ref().expect("controls");
    assert!(!controls.can_apply);

    let mut clipboard = RecordingClipboard::default();
    controls.copy(&mut clipboard).unwrap();
    assert_eq!(clipboard.0, vec!["console.log(1)".to_owned()]);
    assert!(matches!(controls.apply(&mut FileApplier), Err(ApplyError::NotClosed(_))));
}

#[test]
fn closed_fence_can_apply() {
    let nodes = render_chat("```js\nconsole.log(1)\n```", 0, all_on());
    let controls = single_block(&nodes).controls.as_ref().expect("controls");
    assert!(controls.can_apply);
    assert_eq!(controls.target, ApplyTarget::CurrentEditor);
}

#[test]
fn uri_first_line_sets_target_and_language() {
    let nodes = render_chat("```\n/Users/me/foo.ts\nconst x = 1;\n```", 0, all_on());
    let block = single_block(&nodes);
    assert_eq!(block.code, "const x = 1;");
    assert_eq!(block.language, "typescript");
    let controls = block.controls.as_ref().expect("controls");
    assert_eq!(controls.target, ApplyTarget::File(PathBuf::from("/Users/me/foo.ts")));
}

#[test]
fn comment_first_line_stays_code() {
    let nodes = render_chat("```\n// comment\nfoo()\n```", 0, all_on());
    let block = single_block(&nodes);
    assert_eq!(block.code, "// comment\nfoo()");
    assert_eq!(block.controls.as_ref().expect("controls").target, ApplyTarget::CurrentEditor);
}

#[test]
fn uri_with_nothing_after_it_renders_nothing() {
    let nodes = render_chat("```\n/Users/me/foo.ts\n```", 0, all_on());
    assert!(visible(nodes).is_empty());
}

#[test]
fn fence_tag_wins_over_uri_detection() {
    let nodes = render_chat("```python\n/Users/me/foo.ts\nprint(1)\n```", 0, all_on());
    let block = single_block(&nodes);
    assert_eq!(block.language, "python");
    assert_eq!(block.code, "print(1)");
}

#[test]
fn apply_disabled_renders_plain_code() {
    let options = RenderTokenOptions { is_apply_enabled: false, is_link_detection_enabled: true };
    let nodes = render_chat("```rs\nfn a() {}\n```", 0, options);
    let block = single_block(&nodes);
    assert!(block.controls.is_none());
    assert_eq!(block.code, "fn a() {}");
}

#[test]
fn displayed_code_is_right_trimmed_but_apply_keeps_content() {
    let nodes = render_chat("```rs\nfn a() {}\n\n\n```", 0, all_on());
    let block = single_block(&nodes);
    assert_eq!(block.code, "fn a() {}");
    let controls = block.controls.as_ref().expect("controls");
    assert!(controls.code.starts_with("fn a() {}\n"));
}

#[test]
fn apply_writes_the_uri_target() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("src").join("lib.rs");
    let text = format!("```rust\n{}\npub fn answer() -> u32 {{ 42 }}\n```", target.display());
    let nodes = render_chat(&text, 0, all_on());
    let controls = single_block(&nodes).controls.as_ref().expect("controls");
    controls.apply(&mut FileApplier).unwrap();
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "pub fn answer() -> u32 { 42 }\n");
}

#[test]
fn tab_separated_list_items_are_not_code_blocks() {
    let nodes = render_chat("-\tInstall deps\n-\tRun tests", 0, all_on());
    assert!(code_chat_markdown::markdown::node::code_blocks(&nodes).is_empty(), "{nodes:?}");
}
