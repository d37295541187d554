// =====
// TESTS: 9
// =====
//
// Token-to-node mapping for non-code tokens, and the terminal lines the
// nodes turn into.

use code_chat_markdown::markdown::node::{self, Node, TableCellView, TableView};
use code_chat_markdown::markdown::token::ColumnAlign;
use code_chat_markdown::ui::LineRenderer;
use code_chat_markdown::ui::terminal::line_text;
use pretty_assertions::assert_eq;

use crate::helpers::{all_on, render_chat, visible};

fn cell(text: &str, align: ColumnAlign) -> TableCellView {
    TableCellView { text: text.to_owned(), align }
}

#[test]
fn table_keeps_header_rows_and_alignment() {
    let nodes = visible(render_chat(
        "| a | b | c |\n|:--|:-:|--:|\n| 1 | 2 | 3 |\n| x | y | z |",
        0,
        all_on(),
    ));
    let aligns = [ColumnAlign::Left, ColumnAlign::Center, ColumnAlign::Right];
    let row = |cells: [&str; 3]| {
        cells.iter().zip(aligns).map(|(t, a)| cell(t, a)).collect::<Vec<_>>()
    };
    assert_eq!(nodes, vec![Node::Table(TableView {
        header: row(["a", "b", "c"]),
        rows: vec![row(["1", "2", "3"]), row(["x", "y", "z"])],
    })]);
}

#[test]
fn unspecified_column_alignment_is_left() {
    let nodes = visible(render_chat("| a | b |\n|---|---|\n| 1 | 2 |", 0, all_on()));
    let [Node::Table(table)] = nodes.as_slice() else {
        panic!("expected a table, got {nodes:?}");
    };
    assert!(
        table
            .header
            .iter()
            .chain(table.rows.iter().flatten())
            .all(|c| c.align == ColumnAlign::Left)
    );
}

#[test]
fn whitespace_only_input_renders_nothing() {
    assert!(visible(render_chat("\n\n   \n", 0, all_on())).is_empty());
}

#[test]
fn reference_definitions_render_nothing_but_feed_links() {
    let nodes = visible(render_chat("[docs][d]\n\n[d]: https://example.com", 0, all_on()));
    assert_eq!(nodes, vec![Node::Paragraph {
        inline: false,
        children: vec![Node::Link {
            href: "https://example.com".to_owned(),
            title: None,
            text: "docs".to_owned(),
        }],
    }]);
}

#[test]
fn currency_is_not_math_but_display_math_is() {
    let prices = visible(render_chat("It costs $5 and $10 today", 0, all_on()));
    let mut has_latex = false;
    for node in &prices {
        node.walk(&mut |n| has_latex |= matches!(n, Node::Latex(_)));
    }
    assert!(!has_latex);

    let math = visible(render_chat("$$x^2 + y^2$$", 0, all_on()));
    assert_eq!(math, vec![Node::Paragraph {
        inline: false,
        children: vec![Node::Latex("$$x^2 + y^2$$".to_owned())],
    }]);
}

#[test]
fn headings_rules_and_quotes() {
    let nodes = visible(render_chat("### Notes\n\n---\n\n> quoted\n> text", 0, all_on()));
    assert_eq!(nodes, vec![
        Node::Heading { level: 3, text: "Notes".to_owned() },
        Node::Rule,
        Node::BlockQuote("quoted\ntext".to_owned()),
    ]);
}

#[test]
fn html_blocks_render_their_source() {
    let nodes = visible(render_chat("<div>hi</div>", 0, all_on()));
    let [Node::Raw(raw)] = nodes.as_slice() else {
        panic!("expected raw html, got {nodes:?}");
    };
    assert!(raw.starts_with("<div>hi</div>"));
}

#[test]
fn task_lists_keep_checkbox_state() {
    let nodes = visible(render_chat("- [x] done\n- [ ] todo", 0, all_on()));
    let [Node::List(list)] = nodes.as_slice() else {
        panic!("expected a list, got {nodes:?}");
    };
    let states: Vec<Option<bool>> = list.items.iter().map(|item| item.checked).collect();
    assert_eq!(states, vec![Some(true), Some(false)]);
}

#[test]
fn mixed_message_prints_as_terminal_lines() {
    let text = "## Plan\n\n1. Read `lib.rs`\n2. Run it\n\n```sh\ncargo test\n```";
    let nodes = render_chat(text, 0, all_on());
    let id = node::code_blocks(&nodes)[0].controls.as_ref().expect("controls").apply_box_id.clone();
    assert!(id.starts_with("thread-1-0-"));
    let lines: Vec<String> = LineRenderer::new(60).render(&nodes).iter().map(line_text).collect();
    assert_eq!(lines, vec![
        "Plan".to_owned(),
        "────".to_owned(),
        String::new(),
        "1. Read lib.rs".to_owned(),
        "2. Run it".to_owned(),
        String::new(),
        format!("╭─ shellscript  [{id}]  copy  apply"),
        "│ cargo test".to_owned(),
        "╰─".to_owned(),
    ]);
}
