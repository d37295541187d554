// =====
// TESTS: 5
// =====
//
// Token path and apply box id derivation.
// Ids must be a pure function of (thread, message, token position).

use code_chat_markdown::markdown::TokenPath;
use code_chat_markdown::markdown::node::{self, Node};
use pretty_assertions::assert_eq;

use crate::helpers::{all_on, render_chat};

fn apply_box_ids(nodes: &[Node]) -> Vec<String> {
    node::code_blocks(nodes)
        .iter()
        .filter_map(|block| block.controls.as_ref().map(|c| c.apply_box_id.clone()))
        .collect()
}

#[test]
fn token_path_encoding_is_parent_dash_child() {
    let top = TokenPath::child_of(None, 3);
    assert_eq!(top.as_str(), "3");
    assert_eq!(top.child(1).as_str(), "3-1");
    assert_eq!(top.child(1).child(0).to_string(), "3-1-0");
}

#[test]
fn apply_box_id_encodes_thread_message_and_token() {
    let nodes = render_chat("```rs\nfn a() {}\n```", 3, all_on());
    assert_eq!(apply_box_ids(&nodes), vec!["thread-1-3-0".to_owned()]);
}

#[test]
fn rerendering_identical_content_yields_identical_ids() {
    let text =
        "Intro\n\n```rs\nfn a() {}\n```\n\n- item with code:\n\n  ```py\n  print(1)\n  ```\n";
    let first = apply_box_ids(&render_chat(text, 0, all_on()));
    let second = apply_box_ids(&render_chat(text, 0, all_on()));
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_ne!(first[0], first[1], "ids must be unique within a message");
    assert!(first.iter().all(|id| id.starts_with("thread-1-0-")));
}

#[test]
fn streaming_more_content_keeps_earlier_ids() {
    let partial = render_chat("```rs\nfn a() {}\n```", 0, all_on());
    let full =
        render_chat("```rs\nfn a() {}\n```\n\nMore text\n\n```rs\nfn b() {}\n```", 0, all_on());
    let partial_ids = apply_box_ids(&partial);
    let full_ids = apply_box_ids(&full);
    assert_eq!(full_ids.len(), 2);
    assert_eq!(partial_ids[0], full_ids[0]);
}

#[test]
fn same_content_in_another_message_gets_another_id() {
    let text = "```rs\nfn a() {}\n```";
    let a = apply_box_ids(&render_chat(text, 0, all_on()));
    let b = apply_box_ids(&render_chat(text, 1, all_on()));
    assert_ne!(a, b);
}
